//! Report generation: request -> source rows -> pivot tables

use chrono::NaiveDate;
use tracing::{debug, info};

use super::comparison::build_table;
use super::periods::monthly_labels;
use super::pivot::Pivot;
use super::request::{validate_institution_id, ReportRequest};
use crate::sources::{SourceQuery, UsageSource};
use crate::types::{
    CumulativeSummary, Granularity, Report, ReportOutcome, Result, ValueField,
};

/// Builds reports from a read-only data source.
///
/// Every call constructs its tables from scratch; nothing is kept between
/// requests.
pub struct ReportService<'a> {
    source: &'a dyn UsageSource,
    categories: Vec<String>,
}

impl<'a> ReportService<'a> {
    pub fn new(source: &'a dyn UsageSource, categories: Vec<String>) -> Self {
        Self { source, categories }
    }

    /// Canonical row order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Display name for an institution, falling back to its id
    fn display_name(&self, institution_id: &str) -> Result<String> {
        Ok(self
            .source
            .institution_name(institution_id)?
            .unwrap_or_else(|| institution_id.to_string()))
    }

    /// Generate the usage and session tables for one request.
    ///
    /// Zero source rows yield `ReportOutcome::NoData`. Source failures
    /// propagate and no partial report is produced.
    pub fn generate(&self, request: &ReportRequest, generated_on: NaiveDate) -> Result<ReportOutcome> {
        let query = request.to_query();
        info!(
            source = self.source.name(),
            institution = %request.institution_id,
            periods = request.periods.len(),
            "querying usage"
        );

        let records = self.source.fetch(&query)?;
        if records.is_empty() {
            info!(institution = %request.institution_id, "no usage rows for filters");
            return Ok(ReportOutcome::NoData);
        }
        debug!(rows = records.len(), "reshaping usage rows");

        let institution_name = self.display_name(&request.institution_id)?;
        let usage = build_table(&records, &self.categories, &request.periods, ValueField::Used);
        let session = build_table(
            &records,
            &self.categories,
            &request.periods,
            ValueField::Session,
        );

        Ok(ReportOutcome::Ready(Box::new(Report {
            institution_id: request.institution_id.clone(),
            institution_name,
            granularity: request.granularity,
            date_range: request.date_range,
            generated_on,
            usage,
            session,
        })))
    }

    /// Per-category used totals over every month from `since_year-01`
    /// through `today`. `None` when the source has no rows.
    pub fn cumulative(
        &self,
        raw_id: &str,
        since_year: i32,
        today: NaiveDate,
    ) -> Result<Option<CumulativeSummary>> {
        let institution_id = validate_institution_id(raw_id)?;
        let months = monthly_labels(since_year, today);
        let (Some(from), Some(through)) = (months.first().cloned(), months.last().cloned()) else {
            return Ok(None);
        };

        let query = SourceQuery::new(institution_id.clone(), Granularity::Monthly, months, None);
        let records = self.source.fetch(&query)?;
        if records.is_empty() {
            return Ok(None);
        }

        let table = Pivot::build(&records, &self.categories, &query.periods, ValueField::Used);
        let totals = table
            .rows()
            .iter()
            .map(|row| (row.clone(), table.row_sum(row)))
            .collect();

        Ok(Some(CumulativeSummary {
            institution_name: self.display_name(&institution_id)?,
            institution_id,
            from,
            through,
            totals,
        }))
    }
}
