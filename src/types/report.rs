//! Report types: pivot tables, change rates and finished reports

use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::{DateRange, Granularity, ValueField};

/// Label of the synthetic total row
pub const TOTAL_ROW_LABEL: &str = "All services";

/// Label of the synthetic year-over-year row
pub const CHANGE_ROW_LABEL: &str = "vs. prior year";

/// Integer table keyed by (category row, period column).
///
/// Every declared (row, column) pair holds a value; missing source data is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    rows: Vec<String>,
    columns: Vec<String>,
    /// Row-major, `values[row][col]`
    values: Vec<Vec<u64>>,
}

impl PivotTable {
    /// Assemble a table; `values` must be `rows.len()` x `columns.len()`
    pub(crate) fn from_parts(rows: Vec<String>, columns: Vec<String>, values: Vec<Vec<u64>>) -> Self {
        debug_assert_eq!(values.len(), rows.len());
        debug_assert!(values.iter().all(|r| r.len() == columns.len()));
        Self {
            rows,
            columns,
            values,
        }
    }

    /// Table with the given shape and every cell 0
    pub fn zeroed(rows: Vec<String>, columns: Vec<String>) -> Self {
        let values = vec![vec![0; columns.len()]; rows.len()];
        Self::from_parts(rows, columns, values)
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    fn row_index(&self, row: &str) -> Option<usize> {
        self.rows.iter().position(|r| r == row)
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell value, `None` only for undeclared labels
    pub fn get(&self, row: &str, column: &str) -> Option<u64> {
        let r = self.row_index(row)?;
        let c = self.column_index(column)?;
        Some(self.values[r][c])
    }

    /// All values of a row in column order
    pub fn row(&self, row: &str) -> Option<&[u64]> {
        self.row_index(row).map(|r| self.values[r].as_slice())
    }

    /// Values in row order, one slice per row
    pub fn value_rows(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.rows
            .iter()
            .zip(self.values.iter())
            .map(|(label, values)| (label.as_str(), values.as_slice()))
    }

    /// Sum over all rows for one column (0 for an undeclared column)
    pub fn column_sum(&self, column: &str) -> u64 {
        self.column_index(column)
            .map(|c| {
                self.values
                    .iter()
                    .fold(0u64, |acc, row| acc.saturating_add(row[c]))
            })
            .unwrap_or(0)
    }

    /// Sum over all columns for one row (0 for an undeclared row)
    pub fn row_sum(&self, row: &str) -> u64 {
        self.row(row)
            .map(|values| values.iter().fold(0u64, |acc, v| acc.saturating_add(*v)))
            .unwrap_or(0)
    }
}

/// Year-over-year change for one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeRate {
    /// Percentage, already rounded to one decimal
    Percent(f64),
    /// Prior total was zero; the ratio is undefined
    Undefined,
}

impl fmt::Display for ChangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => write!(f, "{:.1}%", p),
            Self::Undefined => write!(f, "-"),
        }
    }
}

impl Serialize for ChangeRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Kind of a displayed row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Category,
    Total,
    Change,
}

/// A single displayed cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayCell {
    Count(u64),
    Rate(ChangeRate),
}

impl fmt::Display for DisplayCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Rate(rate) => write!(f, "{}", rate),
        }
    }
}

/// A displayed row: label, kind and one cell per column
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow<'a> {
    pub label: &'a str,
    pub kind: RowKind,
    pub cells: Vec<DisplayCell>,
}

/// One displayed/exported table: category body plus the two synthetic rows.
///
/// The synthetic rows live outside `body`, so only category data can be
/// reshaped or aggregated again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    /// Measure held by the category rows
    pub measure: ValueField,
    pub body: PivotTable,
    /// Sum over category rows, per column
    pub total: Vec<u64>,
    /// Sum over category rows of the prior-year table, per column
    pub prior_total: Vec<u64>,
    /// Year-over-year change, per column
    pub change: Vec<ChangeRate>,
}

impl ReportTable {
    pub fn columns(&self) -> &[String] {
        self.body.columns()
    }

    /// Rows in display order: categories, then total, then change rate
    pub fn display_rows(&self) -> Vec<DisplayRow<'_>> {
        let mut rows: Vec<DisplayRow<'_>> = self
            .body
            .value_rows()
            .map(|(label, values)| DisplayRow {
                label,
                kind: RowKind::Category,
                cells: values.iter().map(|v| DisplayCell::Count(*v)).collect(),
            })
            .collect();

        rows.push(DisplayRow {
            label: TOTAL_ROW_LABEL,
            kind: RowKind::Total,
            cells: self.total.iter().map(|v| DisplayCell::Count(*v)).collect(),
        });
        rows.push(DisplayRow {
            label: CHANGE_ROW_LABEL,
            kind: RowKind::Change,
            cells: self.change.iter().map(|r| DisplayCell::Rate(*r)).collect(),
        });
        rows
    }
}

/// Finished report for one institution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub institution_id: String,
    pub institution_name: String,
    pub granularity: Granularity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub generated_on: NaiveDate,
    /// Used counts vs prior-year used counts
    pub usage: ReportTable,
    /// Session counts vs prior-year session counts
    pub session: ReportTable,
}

/// Outcome of one report request
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Ready(Box<Report>),
    /// The source returned zero rows for the filters
    NoData,
}

/// Cumulative per-category totals over a month range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CumulativeSummary {
    pub institution_id: String,
    pub institution_name: String,
    /// First month included (`YYYY-MM`)
    pub from: String,
    /// Last month included (`YYYY-MM`)
    pub through: String,
    /// (category, total used) in canonical order
    pub totals: Vec<(String, u64)>,
}
