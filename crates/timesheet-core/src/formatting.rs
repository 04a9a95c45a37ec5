use unicode_width::UnicodeWidthStr;

use crate::models::{PivotTable, TOTAL_ROW_LABEL};

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use timesheet_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();
    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        // "0.50" → ".50"
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Hours with one decimal place and thousands separators.
///
/// ```
/// use timesheet_core::formatting::format_hours;
///
/// assert_eq!(format_hours(15.5), "15.5");
/// assert_eq!(format_hours(1234.0), "1,234.0");
/// ```
pub fn format_hours(hours: f64) -> String {
    format_number(hours, 1)
}

// ── Pivot rendering ───────────────────────────────────────────────────────────

/// Render a pivot table as aligned plain text.
///
/// Layout: a `Developer` column, one column per month label, a `Total`
/// column, and a final [`TOTAL_ROW_LABEL`] row.  Widths are measured in
/// terminal columns so non-ASCII names line up.
pub fn render_pivot_table(pivot: &PivotTable) -> String {
    let mut header: Vec<String> = vec!["Developer".to_string()];
    header.extend(pivot.labels.iter().cloned());
    header.push("Total".to_string());

    let mut body: Vec<Vec<String>> = pivot
        .developers
        .iter()
        .enumerate()
        .map(|(i, dev)| {
            let mut row = vec![dev.clone()];
            row.extend(pivot.cells[i].iter().map(|h| format_hours(*h)));
            row.push(format_hours(pivot.row_total(i)));
            row
        })
        .collect();

    let mut totals = vec![TOTAL_ROW_LABEL.to_string()];
    totals.extend(pivot.column_totals.iter().map(|h| format_hours(*h)));
    totals.push(format_hours(pivot.grand_total()));
    body.push(totals);

    let widths: Vec<usize> = (0..header.len())
        .map(|c| {
            std::iter::once(&header)
                .chain(body.iter())
                .map(|row| row[c].width())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &body {
        push_row(&mut out, row, &widths);
    }
    out
}

/// First column left-aligned, the rest right-aligned.
fn push_row(out: &mut String, row: &[String], widths: &[usize]) {
    let cells: Vec<String> = row
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(c, (text, width))| {
            let pad = " ".repeat(width.saturating_sub(text.width()));
            if c == 0 {
                format!("{}{}", text, pad)
            } else {
                format!("{}{}", pad, text)
            }
        })
        .collect();
    out.push_str(cells.join("  ").trim_end());
    out.push('\n');
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
