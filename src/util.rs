// Parsing and formatting helpers.
//
// Spreadsheet exports are messy: numbers arrive as text with thousands
// separators, keys arrive as floats in one file and strings in another. The
// helpers here turn those into values the rest of the crate can compare.
use crate::types::Cell;
use num_format::{Locale, ToFormattedString};

/// Parse a string into `f64` while being forgiving about formatting issues
/// common in exports (thousands separators, surrounding whitespace).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters other than an exponent.
/// - Strips `","` separators before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Interpret a raw CSV field the way a spreadsheet would: blank is empty,
/// number-looking text is a number, anything else stays text.
pub fn cell_from_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match parse_f64_safe(Some(trimmed)) {
        Some(n) => Cell::Number(n),
        None => Cell::Text(field.to_string()),
    }
}

/// Canonical text for a join key, or `None` if the cell cannot act as one.
///
/// Integral numbers drop their fractional part so `1001.0` read from a
/// workbook matches `"1001"` read from text.
pub fn canonical_key(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format`, used for counters (e.g. `1,204 invoices`).
    n.to_formatted_string(&Locale::en)
}
