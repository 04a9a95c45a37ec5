use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, TimesheetError};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly working hours per developer from an archive of timesheet spreadsheets
#[derive(Parser, Debug, Clone)]
#[command(
    name = "timesheet-analyzer",
    about = "Monthly working hours per developer from an archive of timesheet spreadsheets",
    version
)]
pub struct Settings {
    /// ZIP archive containing one XLSX/XLS timesheet per developer
    pub archive: PathBuf,

    /// Only include these developers (repeatable)
    #[arg(long = "developer", value_name = "NAME")]
    pub developers: Vec<String>,

    /// Earliest date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Latest date to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Directory the CSV exports are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Skip writing CSV exports
    #[arg(long)]
    pub no_export: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Number of worker threads for per-file extraction (0 = one per core)
    #[arg(long, default_value = "0")]
    pub jobs: usize,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}

impl Settings {
    /// Parse from the process arguments and validate.
    pub fn load() -> Result<Self> {
        let settings = Self::parse();
        settings.validate()?;
        Ok(settings)
    }

    /// Reject option combinations that cannot produce a report.
    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(TimesheetError::Config(format!(
                    "--from {} is after --to {}",
                    from, to
                )));
            }
        }
        Ok(())
    }

    /// Developer filter, `None` when every developer is selected.
    pub fn developer_filter(&self) -> Option<Vec<String>> {
        if self.developers.is_empty() {
            None
        } else {
            Some(self.developers.clone())
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        Settings::try_parse_from(std::iter::once("timesheet-analyzer").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn test_defaults() {
        let s = parse(&["sheets.zip"]);
        assert_eq!(s.archive, PathBuf::from("sheets.zip"));
        assert!(s.developers.is_empty());
        assert_eq!(s.from, None);
        assert_eq!(s.output_dir, PathBuf::from("."));
        assert!(!s.no_export);
        assert!(!s.json);
        assert_eq!(s.jobs, 0);
        assert_eq!(s.log_level, "INFO");
        assert!(s.developer_filter().is_none());
    }

    #[test]
    fn test_filters_parse() {
        let s = parse(&[
            "sheets.zip",
            "--developer",
            "John",
            "--developer",
            "Mary",
            "--from",
            "2024-01-01",
            "--to",
            "2024-03-31",
        ]);
        assert_eq!(s.developer_filter(), Some(vec!["John".into(), "Mary".into()]));
        assert_eq!(s.from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(s.to, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let s = parse(&["sheets.zip", "--from", "2024-02-01", "--to", "2024-01-01"]);
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("is after"));
    }

    #[test]
    fn test_bad_date_rejected_by_parser() {
        let res = Settings::try_parse_from(["timesheet-analyzer", "x.zip", "--from", "01/02/2024"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let res = Settings::try_parse_from(["timesheet-analyzer", "x.zip", "--log-level", "TRACE"]);
        assert!(res.is_err());
    }
}
