//! In-memory source for tests, benchmarks and demos

use std::collections::{HashMap, HashSet};

use super::{SourceQuery, UsageSource};
use crate::services::periods::{is_day_label, is_month_label};
use crate::types::{Granularity, Result, UsageRecord};

/// Source holding pre-aggregated rows per institution
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    rows: Vec<(String, UsageRecord)>,
    names: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row for an institution
    pub fn with_record(mut self, institution_id: &str, record: UsageRecord) -> Self {
        self.rows.push((institution_id.to_string(), record));
        self
    }

    /// Add several rows for an institution
    pub fn with_records(
        mut self,
        institution_id: &str,
        records: impl IntoIterator<Item = UsageRecord>,
    ) -> Self {
        self.rows.extend(
            records
                .into_iter()
                .map(|r| (institution_id.to_string(), r)),
        );
        self
    }

    pub fn with_name(mut self, institution_id: &str, name: &str) -> Self {
        self.names
            .insert(institution_id.to_string(), name.to_string());
        self
    }
}

fn matches_granularity(granularity: Granularity, period: &str) -> bool {
    match granularity {
        Granularity::Monthly => is_month_label(period),
        Granularity::Daily => is_day_label(period),
    }
}

impl UsageSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, query: &SourceQuery) -> Result<Vec<UsageRecord>> {
        let periods: HashSet<&str> = query.periods.iter().map(String::as_str).collect();
        Ok(self
            .rows
            .iter()
            .filter(|(id, record)| {
                *id == query.institution_id
                    && matches_granularity(query.granularity, &record.period)
                    && periods.contains(record.period.as_str())
            })
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn institution_name(&self, institution_id: &str) -> Result<Option<String>> {
        Ok(self.names.get(institution_id).cloned())
    }
}
