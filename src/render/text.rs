//! Aligned plain-text tables

use std::fmt::Write;

use super::{format_cell, format_number};
use crate::services::export::{SESSION_SHEET, USAGE_SHEET};
use crate::services::periods::is_contiguous;
use crate::services::ReportRequest;
use crate::types::{CumulativeSummary, Granularity, Report, ReportTable};

const HEADER_LABEL: &str = "Service";

fn title(report: &Report, table_name: &str) -> String {
    let scope = match (report.granularity, report.date_range) {
        (Granularity::Daily, Some(range)) => format!("daily {} to {}", range.start, range.end),
        (granularity, _) => granularity.kind().to_string(),
    };
    format!(
        "{} ({}) - {} - {}",
        report.institution_name, report.institution_id, table_name, scope
    )
}

fn table(out: &mut String, table: &ReportTable) {
    let rows = table.display_rows();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.cells.iter().map(format_cell).collect())
        .collect();

    let label_width = rows
        .iter()
        .map(|r| r.label.chars().count())
        .chain(std::iter::once(HEADER_LABEL.len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            cells
                .iter()
                .filter_map(|row| row.get(idx).map(String::len))
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let _ = write!(out, "{:<label_width$}", HEADER_LABEL);
    for (column, width) in table.columns().iter().zip(&widths) {
        let _ = write!(out, "  {:>width$}", column, width = *width);
    }
    out.push('\n');

    for (row, row_cells) in rows.iter().zip(&cells) {
        let pad = label_width.saturating_sub(row.label.chars().count());
        let _ = write!(out, "{}{}", row.label, " ".repeat(pad));
        for (cell, width) in row_cells.iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", cell, width = *width);
        }
        out.push('\n');
    }
}

/// Both tables of a report, usage first
pub fn report(report: &Report) -> String {
    let mut out = String::new();
    for (name, t) in [(USAGE_SHEET, &report.usage), (SESSION_SHEET, &report.session)] {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&title(report, name));
        out.push('\n');
        table(&mut out, t);
    }
    out
}

/// Notice for a request that matched no rows
pub fn no_data(request: &ReportRequest) -> String {
    let span = match request.periods.as_slice() {
        [] => String::new(),
        [only] => format!(" for {}", only),
        [first, .., last] if is_contiguous(&request.periods) => {
            format!(" for {} to {}", first, last)
        }
        periods => format!(" for {}", periods.join(", ")),
    };
    format!(
        "No usage data for institution {}{}.\n",
        request.institution_id, span
    )
}

/// One line per category
pub fn cumulative(summary: &CumulativeSummary) -> String {
    let mut out = format!(
        "{} ({}) - cumulative usage {} to {}\n",
        summary.institution_name, summary.institution_id, summary.from, summary.through
    );
    let label_width = summary
        .totals
        .iter()
        .map(|(c, _)| c.chars().count())
        .max()
        .unwrap_or(0);
    let numbers: Vec<String> = summary.totals.iter().map(|(_, n)| format_number(*n)).collect();
    let number_width = numbers.iter().map(String::len).max().unwrap_or(0);

    for ((category, _), number) in summary.totals.iter().zip(&numbers) {
        let pad = label_width.saturating_sub(category.chars().count());
        let _ = writeln!(
            out,
            "{}{}  {:>number_width$}",
            category,
            " ".repeat(pad),
            number
        );
    }
    out
}
