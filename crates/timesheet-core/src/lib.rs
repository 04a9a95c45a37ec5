//! Domain core for the timesheet analyzer.
//!
//! Pure logic only: cell and record models, the error taxonomy, header
//! detection, date / hours / developer-name normalisation, display
//! formatting and command-line settings.  Nothing here touches the
//! filesystem or an archive.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod header;
pub mod models;
pub mod settings;

pub use error::{ExtractError, Result, TimesheetError};
