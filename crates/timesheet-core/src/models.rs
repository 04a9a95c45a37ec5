use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ExtractError;

// ── Cell / RawGrid ────────────────────────────────────────────────────────────

/// One untyped spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Free text, including booleans rendered as `"true"` / `"false"`.
    Text(String),
    /// Any numeric cell (integers are widened to `f64`).
    Number(f64),
    /// A cell the workbook itself flags as a date or date-time.
    DateTime(NaiveDateTime),
    /// Blank, missing (ragged row) or error cell.
    #[default]
    Empty,
}

impl Cell {
    /// `true` for [`Cell::Empty`] and for text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as display text.
    ///
    /// Integral numbers print without a fractional part (`8.0` → `"8"`).
    /// Returns `None` for [`Cell::Empty`].
    pub fn to_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::Empty => None,
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// A rectangular-or-ragged grid of cells loaded from the first sheet of a
/// workbook.  Row and column indices are absolute sheet coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Number of rows, including leading blank rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of row `r`, or an empty slice past the end.
    pub fn row(&self, r: usize) -> &[Cell] {
        self.rows.get(r).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at `(r, c)`; out-of-range positions read as [`Cell::Empty`].
    pub fn cell(&self, r: usize, c: usize) -> &Cell {
        self.rows
            .get(r)
            .and_then(|row| row.get(c))
            .unwrap_or(&EMPTY_CELL)
    }
}

// ── HeaderLocation ────────────────────────────────────────────────────────────

/// Where the tabular data of a grid begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    /// Index of the header row; data starts on the row below.
    pub row: usize,
    pub date_column: usize,
    pub hours_column: usize,
}

// ── YearMonth ─────────────────────────────────────────────────────────────────

/// A calendar month, the grouping unit for aggregation.
///
/// Orders chronologically and displays as `"2024-01"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// English month name, e.g. `"January"`.
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }

    /// Human-readable `"Month Year"` label, e.g. `"January 2024"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One validated `(developer, date, hours)` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub developer: String,
    pub date: NaiveDate,
    /// Always strictly positive.
    pub hours: f64,
    pub year: i32,
    /// 1–12.
    pub month: u32,
    pub year_month: YearMonth,
}

impl Record {
    /// Build a record, deriving the year / month fields from `date`.
    pub fn new(developer: impl Into<String>, date: NaiveDate, hours: f64) -> Self {
        let year_month = YearMonth::from_date(date);
        Self {
            developer: developer.into(),
            date,
            hours,
            year: year_month.year,
            month: year_month.month,
            year_month,
        }
    }

    pub fn month_name(&self) -> &'static str {
        self.year_month.month_name()
    }
}

// ── FileOutcome ───────────────────────────────────────────────────────────────

/// Records extracted from one spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub records: Vec<Record>,
    /// Data rows silently dropped for a bad date or bad hours value.
    pub dropped_rows: usize,
}

/// Result of running extraction over a single archive entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Extracted(Extraction),
    Rejected(ExtractError),
}

// ── BatchReport ───────────────────────────────────────────────────────────────

/// Everything one archive produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub records: Vec<Record>,
    /// Entries that yielded at least one record, in archive order.
    pub processed_files: Vec<String>,
    /// Spreadsheet-looking entries excluded as metadata or hidden files.
    pub skipped_files: Vec<String>,
    /// One rejection reason per failed entry, in archive order.
    pub errors: Vec<String>,
    /// Total rows dropped inside processed files.
    pub dropped_rows: usize,
    /// Set when the run was abandoned part way; the report holds the prefix
    /// of entries finished before that point.
    pub cancelled: bool,
}

impl BatchReport {
    /// `true` when no records were extracted ("nothing to show").
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ── MonthlyBucket ─────────────────────────────────────────────────────────────

/// Hours of one developer in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub developer: String,
    pub year: i32,
    pub month: u32,
    pub year_month: YearMonth,
    /// `"January"`.
    pub month_name: String,
    /// `"2024-01"`.
    pub year_month_str: String,
    /// `"January 2024"`.
    pub month_year: String,
    pub total_hours: f64,
    /// Number of contributing records (not deduplicated by date).
    pub working_days: u32,
}

impl MonthlyBucket {
    /// An empty bucket for `developer` in `year_month`.
    pub fn new(developer: impl Into<String>, year_month: YearMonth) -> Self {
        Self {
            developer: developer.into(),
            year: year_month.year,
            month: year_month.month,
            year_month,
            month_name: year_month.month_name().to_string(),
            year_month_str: year_month.to_string(),
            month_year: year_month.label(),
            total_hours: 0.0,
            working_days: 0,
        }
    }

    /// Accumulate one record.
    pub fn add_record(&mut self, record: &Record) {
        self.total_hours += record.hours;
        self.working_days += 1;
    }
}

// ── PivotTable ───────────────────────────────────────────────────────────────

/// Label of the appended column-totals row.
pub const TOTAL_ROW_LABEL: &str = "TOTAL HOURS";

/// Developer × month matrix of total hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    /// Row keys, ascending.
    pub developers: Vec<String>,
    /// Column keys, chronological.
    pub months: Vec<YearMonth>,
    /// `"Month Year"` label per column.
    pub labels: Vec<String>,
    /// `cells[row][col]`; zero where a developer has no bucket that month.
    pub cells: Vec<Vec<f64>>,
    /// Sum of each column, rendered as the [`TOTAL_ROW_LABEL`] row.
    pub column_totals: Vec<f64>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.developers.is_empty()
    }

    /// Sum across all months for the developer at `row`.
    pub fn row_total(&self, row: usize) -> f64 {
        self.cells.get(row).map(|r| r.iter().sum()).unwrap_or(0.0)
    }

    pub fn grand_total(&self) -> f64 {
        self.column_totals.iter().sum()
    }
}
