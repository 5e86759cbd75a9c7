//! Query parameter builder: user selection -> report request

use chrono::NaiveDate;
use serde::Serialize;

use super::periods::{self, filter_by_years, is_month_label};
use crate::sources::SourceQuery;
use crate::types::{DateRange, Granularity, ReportError, Result};

/// A validated report request for one institution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub institution_id: String,
    pub granularity: Granularity,
    /// Effective periods, sorted ascending and deduplicated
    pub periods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// Trim a raw institution id, rejecting an empty one
pub fn validate_institution_id(raw: &str) -> Result<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(ReportError::InvalidInput(
            "institution id is empty; enter an id before searching".into(),
        ));
    }
    Ok(id.to_string())
}

impl ReportRequest {
    /// Monthly request.
    ///
    /// The candidate set is `canonical` narrowed to `selected_years`. With no
    /// month selected the whole candidate set is used, otherwise exactly the
    /// selection.
    pub fn monthly(
        raw_id: &str,
        selected_years: &[i32],
        selected_months: &[String],
        canonical: &[String],
    ) -> Result<Self> {
        let institution_id = validate_institution_id(raw_id)?;
        let candidates = filter_by_years(canonical, selected_years);

        let mut periods = if selected_months.is_empty() {
            candidates
        } else {
            for month in selected_months {
                if !is_month_label(month) {
                    return Err(ReportError::InvalidInput(format!(
                        "'{}' is not a YYYY-MM month",
                        month
                    )));
                }
                if !candidates.contains(month) {
                    return Err(ReportError::InvalidInput(format!(
                        "month {} is outside the selectable range",
                        month
                    )));
                }
            }
            selected_months.to_vec()
        };
        periods.sort();
        periods.dedup();

        Ok(Self {
            institution_id,
            granularity: Granularity::Monthly,
            periods,
            date_range: None,
        })
    }

    /// Daily request over `start..=end`; `end` may be yesterday at the latest
    pub fn daily(raw_id: &str, start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<Self> {
        let institution_id = validate_institution_id(raw_id)?;

        let latest = periods::yesterday(today);
        if end > latest {
            return Err(ReportError::InvalidInput(format!(
                "end date {} is after {} (yesterday)",
                end, latest
            )));
        }
        if start > end {
            return Err(ReportError::InvalidInput(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }

        Ok(Self {
            institution_id,
            granularity: Granularity::Daily,
            periods: periods::daily_labels(start, end),
            date_range: Some(DateRange { start, end }),
        })
    }

    /// Data-source query for this request
    pub fn to_query(&self) -> SourceQuery {
        SourceQuery::new(
            self.institution_id.clone(),
            self.granularity,
            self.periods.clone(),
            self.date_range,
        )
    }
}
