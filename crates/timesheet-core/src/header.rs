//! Header detection for loosely structured timesheet grids.
//!
//! A header row is any row, within the first [`HEADER_SEARCH_ROWS`] rows of
//! the sheet, that contains a date-like cell and an hours-like cell.

use crate::models::{HeaderLocation, RawGrid};

/// Only rows `0..HEADER_SEARCH_ROWS` are examined.
pub const HEADER_SEARCH_ROWS: usize = 10;

/// Which column a header keyword identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Date,
    Hours,
}

/// Keyword → category table.  A cell matches when its lowercased, trimmed
/// text contains the keyword anywhere.
pub const HEADER_KEYWORDS: &[(&str, HeaderKind)] = &[
    ("date", HeaderKind::Date),
    ("day", HeaderKind::Date),
    ("datum", HeaderKind::Date),
    ("fecha", HeaderKind::Date),
    ("hour", HeaderKind::Hours),
    ("time", HeaderKind::Hours),
    ("work", HeaderKind::Hours),
    ("duration", HeaderKind::Hours),
    ("hrs", HeaderKind::Hours),
    ("horas", HeaderKind::Hours),
];

/// Does `text` contain any keyword of the given kind?
pub fn matches_kind(text: &str, kind: HeaderKind) -> bool {
    let normalised = text.trim().to_lowercase();
    HEADER_KEYWORDS
        .iter()
        .any(|(term, k)| *k == kind && normalised.contains(term))
}

// ── HeaderLocator ─────────────────────────────────────────────────────────────

/// Scans the leading rows of a grid for the date / hours header.
pub struct HeaderLocator;

impl HeaderLocator {
    /// Locate the header row and its date / hours columns.
    ///
    /// Within a row the last matching column of each kind wins.  The first
    /// row that has both kinds in different columns is the header.  When the
    /// last date and last hours candidates are the same cell, the hours
    /// column keeps it and the date falls back to the previous date
    /// candidate; failing that, the date keeps it and the hours fall back.
    pub fn locate(grid: &RawGrid) -> Option<HeaderLocation> {
        (0..grid.row_count().min(HEADER_SEARCH_ROWS)).find_map(|r| Self::scan_row(grid, r))
    }

    fn scan_row(grid: &RawGrid, r: usize) -> Option<HeaderLocation> {
        let mut dates = Vec::new();
        let mut hours = Vec::new();

        for (c, cell) in grid.row(r).iter().enumerate() {
            let Some(text) = cell.to_text() else { continue };
            if matches_kind(&text, HeaderKind::Date) {
                dates.push(c);
            }
            if matches_kind(&text, HeaderKind::Hours) {
                hours.push(c);
            }
        }

        let (date_column, hours_column) = match (dates.last(), hours.last()) {
            (Some(&d), Some(&h)) if d != h => (d, h),
            (Some(&shared), Some(_)) => previous(&dates)
                .map(|d| (d, shared))
                .or_else(|| previous(&hours).map(|h| (shared, h)))?,
            _ => return None,
        };

        Some(HeaderLocation {
            row: r,
            date_column,
            hours_column,
        })
    }
}

/// Second-to-last candidate.
fn previous(columns: &[usize]) -> Option<usize> {
    columns.iter().rev().nth(1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.to_string())
                }
            })
            .collect()
    }

    // ── matches_kind ──────────────────────────────────────────────────────────

    #[test]
    fn test_keywords_are_case_insensitive_substrings() {
        assert!(matches_kind("  Work Date ", HeaderKind::Date));
        assert!(matches_kind("FECHA", HeaderKind::Date));
        assert!(matches_kind("Total Hrs", HeaderKind::Hours));
        assert!(matches_kind("Horas trabajadas", HeaderKind::Hours));
        assert!(!matches_kind("Project", HeaderKind::Date));
        assert!(!matches_kind("Project", HeaderKind::Hours));
    }

    // ── locate ────────────────────────────────────────────────────────────────

    #[test]
    fn test_header_on_first_row() {
        let grid = RawGrid::new(vec![text_row(&["Date", "Hours"]), vec![Cell::Number(1.0)]]);
        assert_eq!(
            HeaderLocator::locate(&grid),
            Some(HeaderLocation {
                row: 0,
                date_column: 0,
                hours_column: 1
            })
        );
    }

    #[test]
    fn test_header_after_preamble_rows() {
        let grid = RawGrid::new(vec![
            text_row(&["Timesheet for Q1"]),
            text_row(&["Employee: Jane", "Project: Apollo"]),
            text_row(&[]),
            text_row(&["Task", "Date", "Notes", "Hours"]),
            text_row(&["Build", "2024-01-05", "", "8"]),
        ]);
        let loc = HeaderLocator::locate(&grid).unwrap();
        assert_eq!(loc.row, 3);
        assert_eq!(loc.date_column, 1);
        assert_eq!(loc.hours_column, 3);
    }

    #[test]
    fn test_last_match_wins_within_row() {
        let grid = RawGrid::new(vec![text_row(&[
            "Date",
            "Hours planned",
            "Day",
            "Hours worked",
        ])]);
        let loc = HeaderLocator::locate(&grid).unwrap();
        assert_eq!(loc.date_column, 2);
        assert_eq!(loc.hours_column, 3);
    }

    #[test]
    fn test_first_qualifying_row_wins() {
        let grid = RawGrid::new(vec![
            text_row(&["Date", "Hours"]),
            text_row(&["Fecha", "Horas"]),
        ]);
        assert_eq!(HeaderLocator::locate(&grid).unwrap().row, 0);
    }

    #[test]
    fn test_row_with_only_one_kind_is_not_header() {
        let grid = RawGrid::new(vec![
            text_row(&["Date", "Project"]),
            text_row(&["Hours", "Project"]),
        ]);
        assert_eq!(HeaderLocator::locate(&grid), None);
    }

    #[test]
    fn test_header_beyond_search_window_not_found() {
        let mut rows: Vec<Vec<Cell>> = (0..HEADER_SEARCH_ROWS).map(|_| text_row(&["x"])).collect();
        rows.push(text_row(&["Date", "Hours"]));
        let grid = RawGrid::new(rows);
        assert_eq!(HeaderLocator::locate(&grid), None);
    }

    #[test]
    fn test_header_on_last_window_row_found() {
        let mut rows: Vec<Vec<Cell>> =
            (0..HEADER_SEARCH_ROWS - 1).map(|_| text_row(&["x"])).collect();
        rows.push(text_row(&["Date", "Hours"]));
        let grid = RawGrid::new(rows);
        assert_eq!(HeaderLocator::locate(&grid).unwrap().row, HEADER_SEARCH_ROWS - 1);
    }

    #[test]
    fn test_single_cell_matching_both_kinds_is_not_header() {
        let grid = RawGrid::new(vec![text_row(&["Workday"]), text_row(&["Date", "Hours"])]);
        assert_eq!(HeaderLocator::locate(&grid).unwrap().row, 1);
    }

    #[test]
    fn test_shared_last_cell_falls_back_to_previous_date() {
        let grid = RawGrid::new(vec![text_row(&["Date", "Hours", "Work done today"])]);
        assert_eq!(
            HeaderLocator::locate(&grid),
            Some(HeaderLocation {
                row: 0,
                date_column: 0,
                hours_column: 2
            })
        );
    }

    #[test]
    fn test_shared_last_cell_falls_back_to_previous_hours() {
        let grid = RawGrid::new(vec![text_row(&["Hours", "Notes", "Workday"])]);
        let loc = HeaderLocator::locate(&grid).unwrap();
        assert_eq!((loc.date_column, loc.hours_column), (2, 0));
    }

    #[test]
    fn test_numeric_cells_are_ignored() {
        let grid = RawGrid::new(vec![vec![Cell::Number(2024.0), Cell::Number(8.0)]]);
        assert_eq!(HeaderLocator::locate(&grid), None);
    }
}
