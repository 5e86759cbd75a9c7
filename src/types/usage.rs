//! Usage types for institution service reports

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical service categories, in display order
pub const DEFAULT_CATEGORIES: [&str; 3] = ["AI IDEA", "AI Viewer", "AI Search"];

/// Canonical category order as owned labels
pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Deserialize a nullable number, mapping null to 0.0
pub(crate) fn zero_if_null<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// One aggregated row from the data source: a (category, period) pair with its measures.
///
/// Measures are carried as `f64` because warehouse sums may come back fractional;
/// they become integers only when a pivot is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub category: String,
    /// `YYYY-MM` or `YYYY-MM-DD`
    pub period: String,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub used: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub prior_year_used: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub session: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub prior_year_session: f64,
}

impl UsageRecord {
    pub fn new(category: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            period: period.into(),
            used: 0.0,
            prior_year_used: 0.0,
            session: 0.0,
            prior_year_session: 0.0,
        }
    }

    pub fn with_used(mut self, used: f64, prior_year_used: f64) -> Self {
        self.used = used;
        self.prior_year_used = prior_year_used;
        self
    }

    pub fn with_session(mut self, session: f64, prior_year_session: f64) -> Self {
        self.session = session;
        self.prior_year_session = prior_year_session;
        self
    }

    /// Add another record's measures into this one (same key assumed)
    pub fn absorb(&mut self, other: &UsageRecord) {
        self.used += other.used;
        self.prior_year_used += other.prior_year_used;
        self.session += other.session;
        self.prior_year_session += other.prior_year_session;
    }
}

/// Which measure of a `UsageRecord` a pivot reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    Used,
    PriorYearUsed,
    Session,
    PriorYearSession,
}

impl ValueField {
    /// Raw measure value; null, negative and non-finite values count as zero
    pub fn value_of(self, record: &UsageRecord) -> f64 {
        let raw = match self {
            Self::Used => record.used,
            Self::PriorYearUsed => record.prior_year_used,
            Self::Session => record.session,
            Self::PriorYearSession => record.prior_year_session,
        };
        if raw.is_finite() && raw > 0.0 {
            raw
        } else {
            0.0
        }
    }

    /// Prior-year counterpart used for change rates
    pub fn prior(self) -> Self {
        match self {
            Self::Used | Self::PriorYearUsed => Self::PriorYearUsed,
            Self::Session | Self::PriorYearSession => Self::PriorYearSession,
        }
    }
}

/// Period bucket size of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Daily,
}

impl Granularity {
    /// Short name used in export artifact names
    pub fn kind(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Daily => "daily",
        }
    }

    /// Whether a warehouse `agg_unit` value belongs to this granularity
    pub fn matches_unit(self, unit: &str) -> bool {
        let unit = unit.trim();
        match self {
            Self::Monthly => {
                unit.eq_ignore_ascii_case("month")
                    || unit.eq_ignore_ascii_case("monthly")
                    || unit == "월"
            }
            Self::Daily => {
                unit.eq_ignore_ascii_case("day")
                    || unit.eq_ignore_ascii_case("daily")
                    || unit == "일"
            }
        }
    }
}

/// Inclusive date range for daily reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_field_reads_measure() {
        let record = UsageRecord::new("AI IDEA", "2024-01")
            .with_used(10.0, 20.0)
            .with_session(3.0, 1.0);
        assert_eq!(ValueField::Used.value_of(&record), 10.0);
        assert_eq!(ValueField::PriorYearUsed.value_of(&record), 20.0);
        assert_eq!(ValueField::Session.value_of(&record), 3.0);
        assert_eq!(ValueField::PriorYearSession.value_of(&record), 1.0);
    }

    #[test]
    fn test_value_field_clamps_bad_values() {
        let record = UsageRecord::new("AI IDEA", "2024-01").with_used(-4.0, f64::NAN);
        assert_eq!(ValueField::Used.value_of(&record), 0.0);
        assert_eq!(ValueField::PriorYearUsed.value_of(&record), 0.0);
    }

    #[test]
    fn test_value_field_prior() {
        assert_eq!(ValueField::Used.prior(), ValueField::PriorYearUsed);
        assert_eq!(ValueField::Session.prior(), ValueField::PriorYearSession);
    }

    #[test]
    fn test_record_deserialize_null_and_missing_measures() {
        let json = r#"{"category":"AI Viewer","period":"2024-02","used":7,"prior_year_used":null}"#;
        let record: UsageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.used, 7.0);
        assert_eq!(record.prior_year_used, 0.0);
        assert_eq!(record.session, 0.0);
        assert_eq!(record.prior_year_session, 0.0);
    }

    #[test]
    fn test_record_absorb() {
        let mut a = UsageRecord::new("AI IDEA", "2024-01").with_used(5.0, 1.0);
        let b = UsageRecord::new("AI IDEA", "2024-01").with_used(3.0, 2.0);
        a.absorb(&b);
        assert_eq!(a.used, 8.0);
        assert_eq!(a.prior_year_used, 3.0);
    }

    #[test]
    fn test_granularity_matches_unit() {
        assert!(Granularity::Monthly.matches_unit("month"));
        assert!(Granularity::Monthly.matches_unit("월"));
        assert!(!Granularity::Monthly.matches_unit("day"));
        assert!(Granularity::Daily.matches_unit(" DAY "));
        assert!(Granularity::Daily.matches_unit("일"));
    }

    #[test]
    fn test_date_range_contains() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
        };
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()));
    }
}
