//! Data source trait and adapters
//!
//! A source answers one aggregate query per report: usage rows grouped by
//! (category, period) for one institution. An empty answer is valid and means
//! "no usage in range"; failures are errors.

mod file;
mod http;
mod memory;

pub use file::FileSource;
pub use http::HttpSource;
pub use memory::MemorySource;

use std::time::Duration;

use serde::Serialize;

use crate::config::{SourceConfig, SourceKind};
use crate::types::{DateRange, Granularity, ReportError, Result, UsageRecord};

/// Grouping keys requested from the source
pub const GROUP_BY: [&str; 2] = ["category", "period"];

/// Aggregates requested from the source
pub const AGGREGATES: [&str; 4] = [
    "sum(used)",
    "sum(prior_year_used)",
    "sum(session)",
    "sum(prior_year_session)",
];

/// Aggregate usage query sent to a data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceQuery {
    pub institution_id: String,
    pub granularity: Granularity,
    pub periods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub group_by: [&'static str; 2],
    pub aggregates: [&'static str; 4],
}

impl SourceQuery {
    pub fn new(
        institution_id: String,
        granularity: Granularity,
        periods: Vec<String>,
        date_range: Option<DateRange>,
    ) -> Self {
        Self {
            institution_id,
            granularity,
            periods,
            date_range,
            group_by: GROUP_BY,
            aggregates: AGGREGATES,
        }
    }
}

/// Trait for usage data sources
pub trait UsageSource: Send + Sync {
    /// Source name (e.g., "file", "http")
    fn name(&self) -> &str;

    /// Run the aggregate query; one row per (category, period) is expected
    /// but duplicates are tolerated downstream.
    fn fetch(&self, query: &SourceQuery) -> Result<Vec<UsageRecord>>;

    /// Display name of an institution, `None` when unknown
    fn institution_name(&self, institution_id: &str) -> Result<Option<String>>;
}

/// Build the source described by the configuration
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn UsageSource>> {
    match config.kind {
        SourceKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                ReportError::Config("source.kind = \"file\" requires source.path".into())
            })?;
            Ok(Box::new(FileSource::new(path)))
        }
        SourceKind::Http => {
            let url = config.url.as_deref().ok_or_else(|| {
                ReportError::Config("source.kind = \"http\" requires source.url".into())
            })?;
            let token = config
                .token_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|t| !t.trim().is_empty());
            let source = HttpSource::new(url, Duration::from_secs(config.timeout_secs), token)?;
            Ok(Box::new(source))
        }
    }
}
