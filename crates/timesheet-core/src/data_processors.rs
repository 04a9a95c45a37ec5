use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::trace;

use crate::models::Cell;

// ── DateNormalizer ────────────────────────────────────────────────────────────

/// Explicit date patterns, tried in order; the first full match wins.
///
/// Month names are English only.  Ambiguous slash / dash dates resolve
/// US-first (`03/04/2024` is March 4th).
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Date-time patterns accepted by the permissive fallback.  Only the date
/// component is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Two-digit-year patterns; `%y` maps `70..=99` to 19xx and `00..=69` to 20xx.
const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%d/%m/%y", "%m-%d-%y", "%d-%m-%y"];

/// Permissive parsers, tried in order after [`DATE_FORMATS`] is exhausted.
const FALLBACK_PARSERS: &[fn(&str) -> Option<NaiveDate>] = &[
    parse_datetime_forms,
    parse_rfc3339,
    parse_dotted,
    parse_compact,
    parse_leading_iso,
    parse_short_year,
];

/// `%Y` accepts one to four digits; anything earlier than this is a
/// two-digit year read literally.
const MIN_YEAR: i32 = 1000;

/// Excel serial day 0 (the 1900 date system, corrected for the phantom
/// 1900-02-29).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Serials at or below this fall in the phantom leap-day region.
const EXCEL_SERIAL_MIN: f64 = 60.0;

/// 9999-12-31.
const EXCEL_SERIAL_MAX: f64 = 2_958_465.0;

/// Maps raw cell values to calendar dates.
pub struct DateNormalizer;

impl DateNormalizer {
    /// Normalise `cell` to a [`NaiveDate`].
    ///
    /// * `Empty` / blank text → `None`.
    /// * `DateTime` → its date component.
    /// * `Number` → Excel serial date when in the valid serial range.
    /// * `Text` → [`DATE_FORMATS`] in order, then the permissive fallbacks.
    pub fn normalize(cell: &Cell) -> Option<NaiveDate> {
        match cell {
            Cell::Empty => None,
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Number(n) => Self::from_excel_serial(*n),
            Cell::Text(s) => Self::parse_str(s),
        }
    }

    /// Parse free text, trimming surrounding whitespace first.
    pub fn parse_str(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let parsed = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok().filter(has_full_year))
            .or_else(|| {
                FALLBACK_PARSERS
                    .iter()
                    .find_map(|parse| parse(s).filter(has_full_year))
            });

        if parsed.is_none() {
            trace!("DateNormalizer: could not parse \"{}\"", s);
        }
        parsed
    }

    /// Convert an Excel serial day number to a date.
    pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
        if !serial.is_finite() || serial <= EXCEL_SERIAL_MIN || serial > EXCEL_SERIAL_MAX {
            return None;
        }
        let (y, m, d) = EXCEL_EPOCH;
        let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
        epoch.checked_add_signed(Duration::days(serial.floor() as i64))
    }
}

fn has_full_year(date: &NaiveDate) -> bool {
    date.year() >= MIN_YEAR
}

fn parse_datetime_forms(s: &str) -> Option<NaiveDate> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_rfc3339(s: &str) -> Option<NaiveDate> {
    let normalised = match s.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => s.to_string(),
    };
    DateTime::parse_from_rfc3339(&normalised)
        .ok()
        .map(|dt| dt.date_naive())
}

/// `25.03.2024`
fn parse_dotted(s: &str) -> Option<NaiveDate> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$").expect("regex is valid")
    });
    let caps = re.captures(s)?;
    ymd(&caps[3], &caps[2], &caps[1])
}

/// `20240325`
fn parse_compact(s: &str) -> Option<NaiveDate> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("regex is valid"));
    let caps = re.captures(s)?;
    ymd(&caps[1], &caps[2], &caps[3])
}

/// A `YYYY-MM-DD` / `YYYY/MM/DD` / `YYYY.MM.DD` prefix followed by anything.
fn parse_leading_iso(s: &str) -> Option<NaiveDate> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})\b").expect("regex is valid")
    });
    let caps = re.captures(s)?;
    ymd(&caps[1], &caps[2], &caps[3])
}

/// `1/5/24`, `31-12-99`
fn parse_short_year(s: &str) -> Option<NaiveDate> {
    SHORT_YEAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

// ── HoursParser ───────────────────────────────────────────────────────────────

/// Parses the hours cell of a data row.
pub struct HoursParser;

impl HoursParser {
    /// Numeric value of `cell`, or `None` when it is not a finite number.
    ///
    /// Text is trimmed; a lone decimal comma (`"7,5"`) is read as a point.
    /// The sign is not checked here.
    pub fn parse(cell: &Cell) -> Option<f64> {
        let value = match cell {
            Cell::Number(n) => *n,
            Cell::Text(s) => Self::parse_str(s)?,
            Cell::DateTime(_) | Cell::Empty => return None,
        };
        value.is_finite().then_some(value)
    }

    fn parse_str(s: &str) -> Option<f64> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(v) = s.parse::<f64>() {
            return Some(v);
        }
        if !s.contains('.') && s.matches(',').count() == 1 {
            return s.replace(',', ".").parse::<f64>().ok();
        }
        None
    }
}

// ── NameInferer ───────────────────────────────────────────────────────────────

/// Separator marking the end of the developer name, as in
/// `prashanth*_reddy_timesheet.xlsx`.
pub const NAME_MARKER: char = '*';

/// Returned when no usable name token can be found.
pub const UNKNOWN_DEVELOPER: &str = "Unknown";

/// Spreadsheet extensions stripped from file names (lowercase, longest first).
pub const SPREADSHEET_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];

/// Infers a developer display name from a spreadsheet file name.
pub struct NameInferer;

impl NameInferer {
    /// Infer the developer for `filename` (which may include a path).
    ///
    /// * `mary*smith*timesheet.xlsx` → `"Mary"` (text before the first marker)
    /// * `john_doe_timesheet.xlsx` → `"John"` (first word before `_` / space)
    /// * `2024_report.xlsx` → `"Unknown"`
    pub fn infer(filename: &str) -> String {
        let base = strip_extension(file_stem_of(filename));

        if let Some((before, _)) = base.split_once(NAME_MARKER) {
            let name = title_case(before.trim());
            return if name.is_empty() {
                UNKNOWN_DEVELOPER.to_string()
            } else {
                name
            };
        }

        let first = base.split('_').next().unwrap_or_default().trim();
        let first = first.split(' ').next().unwrap_or_default().trim();
        if !first.is_empty() && first.chars().all(char::is_alphabetic) {
            return title_case(first);
        }

        UNKNOWN_DEVELOPER.to_string()
    }
}

/// Last path segment, accepting both `/` and `\` separators.
fn file_stem_of(path: &str) -> &str {
    path.rsplit(&['/', '\\'][..]).next().unwrap_or(path)
}

fn strip_extension(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    SPREADSHEET_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| &name[..name.len() - ext.len()])
        .unwrap_or(name)
}

/// Uppercase the first letter of every word and lowercase the rest, where a
/// word is a run of alphabetic characters.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
