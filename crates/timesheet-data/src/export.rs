//! CSV exports of the monthly summary and the raw records.
//!
//! Column names and order are consumed by downstream spreadsheets and must
//! not change.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use timesheet_core::models::{MonthlyBucket, Record};
use timesheet_core::{Result, TimesheetError};
use tracing::info;

// ── Row types ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MonthlyRow<'a> {
    #[serde(rename = "Developer")]
    developer: &'a str,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: u32,
    #[serde(rename = "MonthName")]
    month_name: &'a str,
    #[serde(rename = "YearMonth")]
    year_month: String,
    #[serde(rename = "Hours")]
    hours: f64,
    #[serde(rename = "WorkingDays")]
    working_days: u32,
    #[serde(rename = "YearMonthStr")]
    year_month_str: &'a str,
    #[serde(rename = "MonthYear")]
    month_year: &'a str,
}

impl<'a> From<&'a MonthlyBucket> for MonthlyRow<'a> {
    fn from(b: &'a MonthlyBucket) -> Self {
        Self {
            developer: &b.developer,
            year: b.year,
            month: b.month,
            month_name: &b.month_name,
            year_month: b.year_month.to_string(),
            hours: b.total_hours,
            working_days: b.working_days,
            year_month_str: &b.year_month_str,
            month_year: &b.month_year,
        }
    }
}

#[derive(Debug, Serialize)]
struct RawRow<'a> {
    #[serde(rename = "Developer")]
    developer: &'a str,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Hours")]
    hours: f64,
    #[serde(rename = "MonthName")]
    month_name: &'a str,
    #[serde(rename = "Year")]
    year: i32,
}

impl<'a> From<&'a Record> for RawRow<'a> {
    fn from(r: &'a Record) -> Self {
        Self {
            developer: &r.developer,
            date: r.date.format("%Y-%m-%d").to_string(),
            hours: r.hours,
            month_name: r.month_name(),
            year: r.year,
        }
    }
}

fn csv_error(e: csv::Error) -> TimesheetError {
    TimesheetError::Export(e.to_string())
}

// ── Writers ───────────────────────────────────────────────────────────────────

/// Write one row per bucket, in bucket order.
pub fn write_monthly_summary<W: Write>(writer: W, buckets: &[MonthlyBucket]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for bucket in buckets {
        csv_writer
            .serialize(MonthlyRow::from(bucket))
            .map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write one row per record, newest date first.  Records sharing a date keep
/// their input order.
pub fn write_raw_records<W: Write>(writer: W, records: &[Record]) -> Result<()> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in sorted {
        csv_writer.serialize(RawRow::from(record)).map_err(csv_error)?;
    }
    csv_writer.flush()?;
    Ok(())
}

// ── Files ─────────────────────────────────────────────────────────────────────

/// `(monthly, raw)` export file names for `today`.
pub fn export_file_names(today: NaiveDate) -> (String, String) {
    let stamp = today.format("%Y%m%d");
    (
        format!("monthly_timesheet_summary_{}.csv", stamp),
        format!("raw_timesheet_data_{}.csv", stamp),
    )
}

/// Write both exports into `dir`, returning their paths.
pub fn write_exports(
    dir: &Path,
    today: NaiveDate,
    buckets: &[MonthlyBucket],
    records: &[Record],
) -> Result<(PathBuf, PathBuf)> {
    let (monthly_name, raw_name) = export_file_names(today);
    let monthly_path = dir.join(monthly_name);
    let raw_path = dir.join(raw_name);

    write_monthly_summary(File::create(&monthly_path)?, buckets)?;
    write_raw_records(File::create(&raw_path)?, records)?;

    info!(
        "Exported {} buckets to {} and {} records to {}",
        buckets.len(),
        monthly_path.display(),
        records.len(),
        raw_path.display()
    );
    Ok((monthly_path, raw_path))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
