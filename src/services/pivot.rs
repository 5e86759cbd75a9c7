//! Result reshaper: flat usage rows -> category x period tables

use std::collections::HashMap;

use crate::types::{PivotTable, UsageRecord, ValueField};

/// Pivot builder
pub struct Pivot;

impl Pivot {
    /// Build a table where cell (row, col) is the sum of `field` over all
    /// records with `category == row` and `period == col`.
    ///
    /// Listed rows/columns with no data are 0. Records whose category or
    /// period is not listed are dropped. Duplicate labels keep their first
    /// occurrence. Sums are rounded half away from zero, once per cell.
    pub fn build(
        records: &[UsageRecord],
        row_order: &[String],
        column_order: &[String],
        field: ValueField,
    ) -> PivotTable {
        let rows = dedup_preserving_order(row_order);
        let columns = dedup_preserving_order(column_order);

        let row_index: HashMap<&str, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.as_str(), i))
            .collect();
        let column_index: HashMap<&str, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let mut sums = vec![vec![0.0f64; columns.len()]; rows.len()];
        for record in records {
            let (Some(&r), Some(&c)) = (
                row_index.get(record.category.as_str()),
                column_index.get(record.period.as_str()),
            ) else {
                continue;
            };
            sums[r][c] += field.value_of(record);
        }

        let values = sums
            .into_iter()
            .map(|row| row.into_iter().map(round_count).collect())
            .collect();

        PivotTable::from_parts(rows, columns, values)
    }
}

/// Round a non-negative sum to the nearest integer (half away from zero)
pub fn round_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        // `as` saturates at u64::MAX
        value.round() as u64
    } else {
        0
    }
}

fn dedup_preserving_order(labels: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(labels.len());
    labels
        .iter()
        .filter(|l| seen.insert(l.as_str()))
        .cloned()
        .collect()
}
