//! Batch pipeline for the timesheet analyzer.
//!
//! Partitions the entries of an archive, extracts every eligible timesheet
//! on a worker pool and merges the per-file outcomes, in archive order, into
//! one [`BatchReport`].

use std::io::{Read, Seek};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use timesheet_core::models::{BatchReport, FileOutcome};
use timesheet_core::{ExtractError, Result};
use tracing::{debug, info, warn};

use crate::analyzer::RecordExtractor;
use crate::reader::{is_eligible_entry, is_skipped_entry, ArchiveEntry, TimesheetArchive};

/// Reported when an archive holds nothing that looks like a timesheet.
pub const NO_SPREADSHEETS_MESSAGE: &str = "no spreadsheet files found in archive";

// ── CancelFlag ────────────────────────────────────────────────────────────────

/// Shared request to abandon a running batch between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── BatchOptions ──────────────────────────────────────────────────────────────

/// Knobs for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker threads for extraction; `0` uses the global rayon pool.
    pub jobs: usize,
    pub cancel: CancelFlag,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Open the archive at `path` and process it.
///
/// Only an archive that cannot be opened is an error; every per-file problem
/// ends up in [`BatchReport::errors`].
pub fn process_archive_file(path: &Path, options: &BatchOptions) -> Result<BatchReport> {
    let mut archive = TimesheetArchive::open(path)?;
    Ok(process_archive(&mut archive, options))
}

/// Process an archive held in memory.
pub fn process_archive_bytes(bytes: Vec<u8>, options: &BatchOptions) -> Result<BatchReport> {
    let mut archive = TimesheetArchive::from_bytes(bytes)?;
    Ok(process_archive(&mut archive, options))
}

/// Eligible entries held in memory at once, per worker thread.
const FILES_PER_THREAD: usize = 4;

type Payload = (String, std::result::Result<Vec<u8>, String>);

/// Run the batch over an opened archive.
///
/// 1. Partition entries into eligible and skipped.
/// 2. Read eligible entries sequentially, a chunk at a time.
/// 3. Extract each chunk in parallel.
/// 4. Merge outcomes in archive order, stopping at the first entry that was
///    abandoned because of cancellation.
pub fn process_archive<R: Read + Seek>(
    archive: &mut TimesheetArchive<R>,
    options: &BatchOptions,
) -> BatchReport {
    let started = Instant::now();
    let mut report = BatchReport::default();

    // ── Step 1: Partition ─────────────────────────────────────────────────────
    let mut eligible: Vec<ArchiveEntry> = Vec::new();
    for entry in archive.entries() {
        if is_eligible_entry(&entry.name) {
            eligible.push(entry);
        } else if is_skipped_entry(&entry.name) {
            debug!("Skipping metadata entry {}", entry.name);
            report.skipped_files.push(entry.name);
        }
    }

    if eligible.is_empty() {
        warn!("{}", NO_SPREADSHEETS_MESSAGE);
        report.errors.push(NO_SPREADSHEETS_MESSAGE.to_string());
        return report;
    }

    let pool = build_pool(options.jobs);
    let threads = pool
        .as_ref()
        .map_or_else(rayon::current_num_threads, |p| p.current_num_threads());
    let chunk_size = (threads * FILES_PER_THREAD).max(1);

    for chunk in eligible.chunks(chunk_size) {
        // ── Step 2: Read ──────────────────────────────────────────────────────
        let mut payloads: Vec<Payload> = Vec::with_capacity(chunk.len());
        for entry in chunk {
            if options.cancel.is_cancelled() {
                break;
            }
            payloads.push((entry.name.clone(), archive.read_entry(entry.index)));
        }
        let read_all = payloads.len() == chunk.len();

        // ── Step 3: Extract ───────────────────────────────────────────────────
        let outcomes = extract_all(&payloads, &options.cancel, pool.as_ref());

        // ── Step 4: Merge ─────────────────────────────────────────────────────
        let names = payloads.into_iter().map(|(name, _)| name);
        let merged_all = merge_outcomes(&mut report, names.zip(outcomes));
        if !(merged_all && read_all) {
            report.cancelled = true;
            break;
        }
    }

    if report.cancelled {
        warn!(
            "Batch cancelled after {} of {} files",
            report.processed_files.len() + report.errors.len(),
            eligible.len()
        );
    }

    info!(
        "Processed {} files ({} skipped, {} errors): {} records, {} rows dropped in {:.3}s",
        report.processed_files.len(),
        report.skipped_files.len(),
        report.errors.len(),
        report.records.len(),
        report.dropped_rows,
        started.elapsed().as_secs_f64()
    );

    report
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Dedicated pool for `jobs > 0`; `None` means the global pool.
fn build_pool(jobs: usize) -> Option<rayon::ThreadPool> {
    if jobs == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!("Could not build a {}-thread pool ({}), using the global pool", jobs, e);
            None
        }
    }
}

/// Extract every payload; `None` marks an entry abandoned on cancellation.
fn extract_all(
    payloads: &[Payload],
    cancel: &CancelFlag,
    pool: Option<&rayon::ThreadPool>,
) -> Vec<Option<FileOutcome>> {
    let run = || -> Vec<Option<FileOutcome>> {
        payloads
            .par_iter()
            .map(|(name, payload)| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(match payload {
                    Ok(bytes) => RecordExtractor::extract(bytes, name),
                    Err(reason) => FileOutcome::Rejected(ExtractError::Unreadable {
                        file: name.clone(),
                        reason: reason.clone(),
                    }),
                })
            })
            .collect()
    };

    match pool {
        Some(pool) => pool.install(run),
        None => run(),
    }
}

/// Append outcomes to `report` in order until the first abandoned entry,
/// which marks the report cancelled.
///
/// Returns `false` when an abandoned entry cut the merge short.
fn merge_outcomes<I>(report: &mut BatchReport, outcomes: I) -> bool
where
    I: IntoIterator<Item = (String, Option<FileOutcome>)>,
{
    for (name, outcome) in outcomes {
        let Some(outcome) = outcome else {
            report.cancelled = true;
            return false;
        };
        match outcome {
            FileOutcome::Extracted(extraction) => {
                report.processed_files.push(name);
                report.dropped_rows += extraction.dropped_rows;
                report.records.extend(extraction.records);
            }
            FileOutcome::Rejected(err) => {
                warn!("{}", err);
                report.errors.push(err.to_string());
            }
        }
    }
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
