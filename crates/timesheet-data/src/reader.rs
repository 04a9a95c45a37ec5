//! Archive discovery and spreadsheet loading for the timesheet analyzer.
//!
//! Decides which ZIP entries are timesheets, reads their bytes, and turns
//! the first sheet of each workbook into a [`RawGrid`].

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use timesheet_core::data_processors::SPREADSHEET_EXTENSIONS;
use timesheet_core::models::{Cell, RawGrid};
use timesheet_core::{Result, TimesheetError};
use tracing::debug;
use zip::ZipArchive;

// ── EntryFilter ───────────────────────────────────────────────────────────────

/// Resource-fork directory macOS adds when compressing from Finder.
pub const MACOS_METADATA_DIR: &str = "__MACOSX/";

/// AppleDouble sidecar prefix (`._report.xlsx`).
pub const APPLE_DOUBLE_MARKER: &str = "._";

/// `true` when `name` ends in a spreadsheet extension (case-insensitive).
pub fn has_spreadsheet_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SPREADSHEET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Decide whether an archive entry is a timesheet worth extracting.
///
/// An entry is rejected when:
/// * it lives under `__MACOSX/` or carries the `._` sidecar marker;
/// * any path segment starts with `.` (hidden files, `.DS_Store`);
/// * it lacks a spreadsheet extension;
/// * it names a directory.
pub fn is_eligible_entry(name: &str) -> bool {
    if name.starts_with(MACOS_METADATA_DIR)
        || name.contains(&format!("/{}", MACOS_METADATA_DIR))
        || name.contains(APPLE_DOUBLE_MARKER)
    {
        return false;
    }
    if name.split('/').any(|segment| segment.starts_with('.')) {
        return false;
    }
    if !has_spreadsheet_extension(name) {
        return false;
    }
    !name.ends_with('/')
}

/// Recognised as a spreadsheet but excluded as metadata or a hidden file.
pub fn is_skipped_entry(name: &str) -> bool {
    has_spreadsheet_extension(name) && !is_eligible_entry(name)
}

// ── TimesheetArchive ──────────────────────────────────────────────────────────

/// One named entry of the archive, in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub index: usize,
    pub name: String,
}

/// A ZIP archive of timesheet spreadsheets.
pub struct TimesheetArchive<R> {
    archive: ZipArchive<R>,
}

impl TimesheetArchive<File> {
    /// Open the archive at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| TimesheetError::ArchiveRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file)
    }
}

impl TimesheetArchive<Cursor<Vec<u8>>> {
    /// Wrap an in-memory archive (an upload, a test fixture).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> TimesheetArchive<R> {
    /// Parse the central directory.  Fails when `reader` is not a ZIP.
    pub fn new(reader: R) -> Result<Self> {
        let archive =
            ZipArchive::new(reader).map_err(|e| TimesheetError::ArchiveOpen(e.to_string()))?;
        Ok(Self { archive })
    }

    /// Every entry name, in archive order.
    pub fn entries(&self) -> Vec<ArchiveEntry> {
        (0..self.archive.len())
            .filter_map(|index| {
                self.archive.name_for_index(index).map(|name| ArchiveEntry {
                    index,
                    name: name.to_string(),
                })
            })
            .collect()
    }

    /// Read one entry fully into memory.
    ///
    /// The error is a human-readable reason; a bad entry never invalidates
    /// the rest of the archive.
    pub fn read_entry(&mut self, index: usize) -> std::result::Result<Vec<u8>, String> {
        let mut entry = self.archive.by_index(index).map_err(|e| e.to_string())?;
        let mut buf = Vec::with_capacity(initial_capacity(entry.size()));
        entry.read_to_end(&mut buf).map_err(|e| e.to_string())?;
        Ok(buf)
    }
}

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOCATION: u64 = 64 << 20;

/// Bytes to reserve for an entry declaring `declared` uncompressed bytes.
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0)
}

// ── GridLoader ────────────────────────────────────────────────────────────────

/// Loads the first sheet of an XLSX / XLS / XLSB / ODS workbook.
pub struct GridLoader;

impl GridLoader {
    /// Decode `bytes` into a grid.
    ///
    /// Leading empty rows and columns of the used range are materialised so
    /// that grid coordinates match sheet coordinates.  A workbook without
    /// sheets, or whose first sheet is empty, yields an empty grid.
    pub fn load(bytes: &[u8]) -> std::result::Result<RawGrid, String> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| e.to_string())?;

        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(|e| e.to_string())?,
            None => return Ok(RawGrid::default()),
        };

        let (start_row, start_col) = match range.start() {
            Some((r, c)) => (r as usize, c as usize),
            None => return Ok(RawGrid::default()),
        };

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row];
        for row in range.rows() {
            let mut cells = vec![Cell::Empty; start_col];
            cells.extend(row.iter().map(to_cell));
            rows.push(cells);
        }

        debug!(
            "GridLoader: {} rows starting at ({}, {})",
            rows.len(),
            start_row,
            start_col
        );
        Ok(RawGrid::new(rows))
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Number(dt.as_f64())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
