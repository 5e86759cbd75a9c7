//! JSON output for `--json`

use serde::Serialize;
use serde_json::json;

use crate::types::{CumulativeSummary, Report, ReportError, Result};

fn pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ReportError::Parse(format!("cannot serialize output: {}", e)))
}

pub fn report(report: &Report) -> Result<String> {
    pretty(report)
}

pub fn cumulative(summary: &CumulativeSummary) -> Result<String> {
    pretty(summary)
}

/// `{"status": "no_data"}`
pub fn no_data() -> String {
    json!({ "status": "no_data" }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::comparison::build_table;
    use crate::types::{Granularity, UsageRecord, ValueField};
    use chrono::NaiveDate;

    #[test]
    fn test_report_json_shape() {
        let records = vec![UsageRecord::new("AI IDEA", "2024-01").with_used(10.0, 20.0)];
        let categories = vec!["AI IDEA".to_string()];
        let periods = vec!["2024-01".to_string(), "2024-02".to_string()];
        let r = Report {
            institution_id: "X".into(),
            institution_name: "Hanbit University".into(),
            granularity: Granularity::Monthly,
            date_range: None,
            generated_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            usage: build_table(&records, &categories, &periods, ValueField::Used),
            session: build_table(&records, &categories, &periods, ValueField::Session),
        };

        let value: serde_json::Value = serde_json::from_str(&report(&r).unwrap()).unwrap();
        assert_eq!(value["institution_id"], "X");
        assert_eq!(value["generated_on"], "2024-03-01");
        assert!(value.get("date_range").is_none());
        assert_eq!(value["usage"]["total"], json!([10, 0]));
        assert_eq!(value["usage"]["change"], json!(["-50.0%", "-"]));
        assert_eq!(value["usage"]["body"]["columns"], json!(["2024-01", "2024-02"]));
    }

    #[test]
    fn test_no_data() {
        assert_eq!(no_data(), r#"{"status":"no_data"}"#);
    }
}
