//! Ingestion layer for the timesheet analyzer.
//!
//! Responsible for filtering archive entries, loading spreadsheet grids,
//! extracting validated records from each file, running the batch over a
//! whole archive, aggregating records into monthly buckets and writing the
//! CSV exports.

pub mod aggregator;
pub mod analysis;
pub mod analyzer;
pub mod export;
pub mod reader;

#[cfg(test)]
pub(crate) mod fixtures;
