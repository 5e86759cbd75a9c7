//! Plain-text and JSON rendering of finished reports

pub mod json;
pub mod text;

use crate::types::DisplayCell;

/// Format a count with thousands separators (1234567 -> "1,234,567")
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);

    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

/// Display text of a table cell
pub fn format_cell(cell: &DisplayCell) -> String {
    match cell {
        DisplayCell::Count(n) => format_number(*n),
        DisplayCell::Rate(rate) => rate.to_string(),
    }
}
