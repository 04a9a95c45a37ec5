//! Per-file record extraction.
//!
//! Turns the bytes of one spreadsheet into validated [`Record`]s, or a
//! single rejection reason.  Pure function of `(bytes, file name)`: it reads
//! no shared state, so files can be extracted on any thread.

use timesheet_core::data_processors::{DateNormalizer, HoursParser, NameInferer};
use timesheet_core::header::HeaderLocator;
use timesheet_core::models::{Extraction, FileOutcome, RawGrid, Record};
use timesheet_core::ExtractError;
use tracing::debug;

use crate::reader::GridLoader;

/// Extracts the `(date, hours)` rows of a single timesheet.
pub struct RecordExtractor;

impl RecordExtractor {
    /// Load, locate, normalise and validate one spreadsheet.
    pub fn extract(bytes: &[u8], file_name: &str) -> FileOutcome {
        match GridLoader::load(bytes) {
            Ok(grid) => Self::extract_from_grid(&grid, file_name),
            Err(reason) => FileOutcome::Rejected(ExtractError::Unreadable {
                file: file_name.to_string(),
                reason,
            }),
        }
    }

    /// Run extraction over an already loaded grid.
    ///
    /// Rows whose date does not parse, whose hours are not numeric, or whose
    /// hours are not positive are dropped silently.  Rows blank in both
    /// columns are ignored without counting as dropped.
    pub fn extract_from_grid(grid: &RawGrid, file_name: &str) -> FileOutcome {
        let file = file_name.to_string();

        if grid.is_empty() {
            return FileOutcome::Rejected(ExtractError::EmptyFile { file });
        }

        let Some(header) = HeaderLocator::locate(grid) else {
            return FileOutcome::Rejected(ExtractError::ColumnsNotDetected { file });
        };

        let data_start = header.row + 1;
        if data_start >= grid.row_count() {
            return FileOutcome::Rejected(ExtractError::NoDataRows { file });
        }

        let mut rows = Vec::new();
        let mut dropped_rows = 0usize;
        for r in data_start..grid.row_count() {
            let date_cell = grid.cell(r, header.date_column);
            let hours_cell = grid.cell(r, header.hours_column);
            if date_cell.is_blank() && hours_cell.is_blank() {
                continue;
            }

            match (
                DateNormalizer::normalize(date_cell),
                HoursParser::parse(hours_cell),
            ) {
                (Some(date), Some(hours)) if hours > 0.0 => rows.push((date, hours)),
                _ => dropped_rows += 1,
            }
        }

        if rows.is_empty() {
            return FileOutcome::Rejected(ExtractError::NoValidData { file });
        }

        let developer = NameInferer::infer(file_name);
        debug!(
            "{}: header at row {} (date col {}, hours col {}), {} rows kept, {} dropped, developer {}",
            file_name,
            header.row,
            header.date_column,
            header.hours_column,
            rows.len(),
            dropped_rows,
            developer
        );

        let records = rows
            .into_iter()
            .map(|(date, hours)| Record::new(developer.clone(), date, hours))
            .collect();

        FileOutcome::Extracted(Extraction {
            records,
            dropped_rows,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{xlsx, Fx};
    use chrono::NaiveDate;
    use timesheet_core::models::{Cell, YearMonth};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extracted(outcome: FileOutcome) -> Extraction {
        match outcome {
            FileOutcome::Extracted(e) => e,
            FileOutcome::Rejected(err) => panic!("expected records, got rejection: {err}"),
        }
    }

    fn rejected(outcome: FileOutcome) -> ExtractError {
        match outcome {
            FileOutcome::Rejected(err) => err,
            FileOutcome::Extracted(e) => panic!("expected rejection, got {} records", e.records.len()),
        }
    }

    // ── happy path ────────────────────────────────────────────────────────────

    #[test]
    fn test_extract_basic_timesheet() {
        let bytes = xlsx(&[
            vec![Fx::S("Date"), Fx::S("Hours")],
            vec![Fx::S("2024-01-05"), Fx::N(8.0)],
            vec![Fx::S("2024-01-06"), Fx::N(7.5)],
        ]);
        let ex = extracted(RecordExtractor::extract(&bytes, "john_timesheet.xlsx"));

        assert_eq!(ex.records.len(), 2);
        assert_eq!(ex.dropped_rows, 0);
        let first = &ex.records[0];
        assert_eq!(first.developer, "John");
        assert_eq!(first.date, date(2024, 1, 5));
        assert_eq!(first.hours, 8.0);
        assert_eq!(first.year_month, YearMonth::new(2024, 1));
        assert_eq!(ex.records[1].hours, 7.5);
    }

    #[test]
    fn test_extract_mixed_date_representations() {
        let bytes = xlsx(&[
            vec![Fx::S("Fecha"), Fx::S("Proyecto"), Fx::S("Horas")],
            vec![Fx::D(2024, 2, 1), Fx::S("Apollo"), Fx::N(6.0)],
            vec![Fx::S("02/02/2024"), Fx::S("Apollo"), Fx::S("7,5")],
            vec![Fx::S("February 5, 2024"), Fx::S("Apollo"), Fx::S("8")],
        ]);
        let ex = extracted(RecordExtractor::extract(&bytes, "maria*garcia.xlsx"));
        let dates: Vec<NaiveDate> = ex.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2024, 2, 1), date(2024, 2, 2), date(2024, 2, 5)]);
        assert!(ex.records.iter().all(|r| r.developer == "Maria"));
        assert_eq!(ex.records[1].hours, 7.5);
    }

    // ── row drops ─────────────────────────────────────────────────────────────

    #[test]
    fn test_non_positive_and_bad_rows_dropped() {
        let bytes = xlsx(&[
            vec![Fx::S("Date"), Fx::S("Hours")],
            vec![Fx::S("2024-01-05"), Fx::N(8.0)],
            vec![Fx::S("2024-01-06"), Fx::N(-3.0)],
            vec![Fx::S("2024-01-07"), Fx::N(0.0)],
            vec![Fx::S("Total"), Fx::N(5.0)],
            vec![Fx::S("2024-01-08"), Fx::S("n/a")],
            vec![Fx::S("2024-01-09"), Fx::N(4.0)],
        ]);
        let ex = extracted(RecordExtractor::extract(&bytes, "john_timesheet.xlsx"));
        let hours: Vec<f64> = ex.records.iter().map(|r| r.hours).collect();
        assert_eq!(hours, vec![8.0, 4.0]);
        assert_eq!(ex.dropped_rows, 4);
    }

    #[test]
    fn test_blank_rows_not_counted_as_dropped() {
        let grid = RawGrid::new(vec![
            vec![Cell::Text("Date".into()), Cell::Text("Hours".into())],
            vec![],
            vec![Cell::Text("2024-01-05".into()), Cell::Number(8.0)],
            vec![Cell::Empty, Cell::Text("  ".into())],
        ]);
        let ex = extracted(RecordExtractor::extract_from_grid(&grid, "john.xlsx"));
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.dropped_rows, 0);
    }

    // ── rejections ────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_sheet_rejected() {
        let err = rejected(RecordExtractor::extract(&xlsx(&[]), "john.xlsx"));
        assert_eq!(err, ExtractError::EmptyFile { file: "john.xlsx".into() });
        assert_eq!(err.to_string(), "empty file: john.xlsx");
    }

    #[test]
    fn test_missing_header_rejected() {
        let bytes = xlsx(&[
            vec![Fx::S("Project"), Fx::S("Effort")],
            vec![Fx::S("Apollo"), Fx::N(8.0)],
        ]);
        let err = rejected(RecordExtractor::extract(&bytes, "john.xlsx"));
        assert!(matches!(err, ExtractError::ColumnsNotDetected { .. }));
    }

    #[test]
    fn test_header_without_data_rejected() {
        let bytes = xlsx(&[vec![Fx::S("Date"), Fx::S("Hours")]]);
        let err = rejected(RecordExtractor::extract(&bytes, "john.xlsx"));
        assert!(matches!(err, ExtractError::NoDataRows { .. }));
    }

    #[test]
    fn test_only_invalid_rows_rejected() {
        let bytes = xlsx(&[
            vec![Fx::S("Date"), Fx::S("Hours")],
            vec![Fx::S("2024-01-05"), Fx::N(0.0)],
            vec![Fx::S("someday"), Fx::N(8.0)],
        ]);
        let err = rejected(RecordExtractor::extract(&bytes, "john.xlsx"));
        assert_eq!(err, ExtractError::NoValidData { file: "john.xlsx".into() });
    }

    #[test]
    fn test_undecodable_bytes_rejected() {
        let err = rejected(RecordExtractor::extract(b"not a workbook", "john.xlsx"));
        assert!(matches!(err, ExtractError::Unreadable { .. }));
        assert!(err.to_string().starts_with("could not read john.xlsx: "));
    }
}
