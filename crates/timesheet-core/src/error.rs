use std::path::PathBuf;
use thiserror::Error;

/// Batch-level errors produced by the timesheet analyzer.
///
/// Anything in this enum aborts the whole run. Problems confined to a single
/// spreadsheet are reported through [`ExtractError`] instead and never stop
/// the batch.
#[derive(Error, Debug)]
pub enum TimesheetError {
    /// The archive is not a readable container.
    #[error("Error reading ZIP file: {0}")]
    ArchiveOpen(String),

    /// The archive file itself could not be read from disk.
    #[error("Failed to read archive {path}: {source}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV export could not be written.
    #[error("Export error: {0}")]
    Export(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the timesheet crates.
pub type Result<T> = std::result::Result<T, TimesheetError>;

/// Why a single spreadsheet contributed no records.
///
/// The `Display` text is the human-readable rejection reason stored in
/// `BatchReport::errors`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The first sheet has no rows at all.
    #[error("empty file: {file}")]
    EmptyFile { file: String },

    /// No row in the search window holds both a date and an hours header.
    #[error("could not detect columns: {file}")]
    ColumnsNotDetected { file: String },

    /// The header is the last row of the sheet.
    #[error("no data rows: {file}")]
    NoDataRows { file: String },

    /// Every data row was dropped (bad date, non-numeric or non-positive hours).
    #[error("no valid data: {file}")]
    NoValidData { file: String },

    /// The entry could not be read out of the archive or decoded as a workbook.
    #[error("could not read {file}: {reason}")]
    Unreadable { file: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_archive_open() {
        let err = TimesheetError::ArchiveOpen("invalid Zip archive".to_string());
        assert_eq!(err.to_string(), "Error reading ZIP file: invalid Zip archive");
    }

    #[test]
    fn test_error_display_archive_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = TimesheetError::ArchiveRead {
            path: PathBuf::from("/some/sheets.zip"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read archive"));
        assert!(msg.contains("/some/sheets.zip"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_config() {
        let err = TimesheetError::Config("--from is after --to".to_string());
        assert_eq!(err.to_string(), "Configuration error: --from is after --to");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TimesheetError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_extract_error_reasons() {
        let file = "team/john_timesheet.xlsx".to_string();
        assert_eq!(
            ExtractError::EmptyFile { file: file.clone() }.to_string(),
            "empty file: team/john_timesheet.xlsx"
        );
        assert_eq!(
            ExtractError::ColumnsNotDetected { file: file.clone() }.to_string(),
            "could not detect columns: team/john_timesheet.xlsx"
        );
        assert_eq!(
            ExtractError::NoDataRows { file: file.clone() }.to_string(),
            "no data rows: team/john_timesheet.xlsx"
        );
        assert_eq!(
            ExtractError::NoValidData { file: file.clone() }.to_string(),
            "no valid data: team/john_timesheet.xlsx"
        );
        let unreadable = ExtractError::Unreadable {
            file,
            reason: "corrupt deflate stream".to_string(),
        };
        assert_eq!(
            unreadable.to_string(),
            "could not read team/john_timesheet.xlsx: corrupt deflate stream"
        );
    }
}
