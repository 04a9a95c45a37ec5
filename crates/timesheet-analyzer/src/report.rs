use chrono::NaiveDate;
use serde_json::json;
use timesheet_core::formatting::{format_hours, render_pivot_table};
use timesheet_core::models::{BatchReport, MonthlyBucket, PivotTable, Record};
use timesheet_core::settings::Settings;
use timesheet_data::aggregator::{AggregateFilter, MonthlyAggregator, SummaryMetrics};

/// Printed instead of the tables when nothing could be extracted.
pub const NO_DATA_MESSAGE: &str = "No valid timesheet data could be extracted";

/// Printed when the filters exclude every record.
pub const NO_MATCH_MESSAGE: &str = "No data matches the selected filters";

// ── Filters ────────────────────────────────────────────────────────────────────

/// Complete a possibly one-sided date range with the records' own span.
pub fn resolve_date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    span: Option<(NaiveDate, NaiveDate)>,
) -> Option<(NaiveDate, NaiveDate)> {
    match (from, to) {
        (Some(from), Some(to)) => Some((from, to)),
        (Some(from), None) => span.map(|(_, max)| (from, max)),
        (None, Some(to)) => span.map(|(min, _)| (min, to)),
        (None, None) => None,
    }
}

/// Aggregation filter described by the command line.
pub fn build_filter(settings: &Settings, records: &[Record]) -> AggregateFilter {
    let mut filter = AggregateFilter::default();
    if let Some(devs) = settings.developer_filter() {
        filter = filter.with_developers(devs);
    }
    let span = MonthlyAggregator::date_span(records);
    if let Some((from, to)) = resolve_date_range(settings.from, settings.to, span) {
        filter = filter.with_date_range(from, to);
    }
    filter
}

/// Exports are written only when enabled and at least one bucket survived
/// the filters.
pub fn should_export(settings: &Settings, report: &BatchReport, buckets: &[MonthlyBucket]) -> bool {
    !settings.no_export && !report.is_empty() && !buckets.is_empty()
}

// ── Text output ────────────────────────────────────────────────────────────────

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("{}:\n", title));
    for item in items {
        out.push_str(&format!("  - {}\n", item));
    }
}

/// File counts and lists for a batch.
pub fn render_file_summary(report: &BatchReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Processed files: {}\n", report.processed_files.len()));
    out.push_str(&format!("Skipped files:   {}\n", report.skipped_files.len()));
    out.push_str(&format!("Errors:          {}\n", report.errors.len()));
    if report.dropped_rows > 0 {
        out.push_str(&format!("Rows dropped:    {}\n", report.dropped_rows));
    }
    if report.cancelled {
        out.push_str("Run cancelled; results are partial.\n");
    }
    push_list(&mut out, "\nProcessed", &report.processed_files);
    push_list(&mut out, "\nSkipped", &report.skipped_files);
    push_list(&mut out, "\nErrors", &report.errors);
    out
}

/// Headline metrics block.
pub fn render_summary(summary: &SummaryMetrics) -> String {
    format!(
        "Total hours:           {}\nAverage monthly hours: {}\nActive developers:     {}\nMonths covered:        {}\n",
        format_hours(summary.total_hours),
        format_hours(summary.average_monthly_hours),
        summary.active_developers,
        summary.months_covered
    )
}

/// The full text report.
pub fn render_text(report: &BatchReport, buckets: &[MonthlyBucket]) -> String {
    let mut out = render_file_summary(report);
    out.push('\n');
    if report.is_empty() {
        out.push_str(NO_DATA_MESSAGE);
        out.push('\n');
        return out;
    }
    if buckets.is_empty() {
        out.push_str(NO_MATCH_MESSAGE);
        out.push('\n');
        return out;
    }

    out.push_str(&render_summary(&MonthlyAggregator::summarize(buckets)));
    out.push('\n');
    out.push_str(&render_pivot_table(&MonthlyAggregator::pivot(buckets)));
    out
}

// ── JSON output ────────────────────────────────────────────────────────────────

/// Report, buckets, pivot and metrics as one pretty-printed JSON document.
pub fn render_json(report: &BatchReport, buckets: &[MonthlyBucket]) -> anyhow::Result<String> {
    let pivot: PivotTable = MonthlyAggregator::pivot(buckets);
    let doc = json!({
        "report": report,
        "buckets": buckets,
        "summary": MonthlyAggregator::summarize(buckets),
        "pivot": pivot,
    });
    Ok(serde_json::to_string_pretty(&doc)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
