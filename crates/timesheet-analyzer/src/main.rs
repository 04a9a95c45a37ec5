mod bootstrap;
mod report;

use anyhow::{Context, Result};
use timesheet_core::settings::Settings;
use timesheet_data::aggregator::MonthlyAggregator;
use timesheet_data::analysis::{process_archive_file, BatchOptions, CancelFlag};
use timesheet_data::export::write_exports;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Timesheet Analyzer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Archive: {}", settings.archive.display());

    let cancel = CancelFlag::new();
    let options = BatchOptions {
        jobs: settings.jobs,
        cancel: cancel.clone(),
    };

    // Extraction is CPU-bound.
    let archive = settings.archive.clone();
    let mut handle =
        tokio::task::spawn_blocking(move || process_archive_file(&archive, &options));

    let joined = tokio::select! {
        result = &mut handle => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; finishing files already in progress");
            cancel.cancel();
            handle.await
        }
    };
    let batch = joined.context("batch worker panicked")??;

    let filter = report::build_filter(&settings, &batch.records);
    let buckets = MonthlyAggregator::aggregate(&batch.records, &filter);

    if settings.json {
        println!("{}", report::render_json(&batch, &buckets)?);
    } else {
        print!("{}", report::render_text(&batch, &buckets));
    }

    if !report::should_export(&settings, &batch, &buckets) {
        return Ok(());
    }

    let records = MonthlyAggregator::filter_records(&batch.records, &filter);
    let today = chrono::Local::now().date_naive();
    let (monthly, raw) = write_exports(&settings.output_dir, today, &buckets, &records)?;
    if !settings.json {
        println!("\nExported {} and {}", monthly.display(), raw.display());
    }

    Ok(())
}
