//! JSONL warehouse export source
//!
//! Runs the aggregate query locally over exported warehouse rows: filter by
//! institution, aggregation unit and period, then group by
//! (category, period) summing the measures.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{SourceQuery, UsageSource};
use crate::types::{zero_if_null, ReportError, Result, UsageRecord};

/// One exported warehouse row
#[derive(Debug, Deserialize)]
struct WarehouseLine {
    b2b_id: String,
    #[serde(default)]
    b2b_nm: Option<String>,
    agg_unit: String,
    service_type: String,
    label: String,
    #[serde(default, deserialize_with = "zero_if_null")]
    used_sum: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    prev_year_used_sum: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    session_sum: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    prev_year_session_sum: f64,
}

impl WarehouseLine {
    fn display_name(&self) -> Option<String> {
        self.b2b_nm
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }

    fn into_record(self) -> UsageRecord {
        UsageRecord::new(self.service_type, self.label)
            .with_used(self.used_sum, self.prev_year_used_sum)
            .with_session(self.session_sum, self.prev_year_session_sum)
    }
}

/// Source backed by JSONL files matched by a path or glob pattern
pub struct FileSource {
    pattern: String,
    /// Display names seen by earlier passes, keyed by institution id
    names: Mutex<HashMap<String, Option<String>>>,
}

impl FileSource {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            names: Mutex::new(HashMap::new()),
        }
    }

    /// Files matching the pattern; no match is a source error
    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let entries = glob::glob(&self.pattern)
            .map_err(|e| ReportError::Config(format!("bad source path '{}': {}", self.pattern, e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                ReportError::Source(format!("cannot read {}: {}", e.path().display(), e.error()))
            })?;
            if path.is_file() {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(ReportError::Source(format!(
                "no warehouse export files match '{}'",
                self.pattern
            )));
        }
        Ok(files)
    }

    /// Parse a single JSONL file, skipping malformed lines
    fn parse_file(path: &Path) -> Result<Vec<WarehouseLine>> {
        let read_error =
            |e: std::io::Error| ReportError::Source(format!("cannot read {}: {}", path.display(), e));
        let reader = BufReader::new(File::open(path).map_err(read_error)?);
        let mut rows = Vec::new();

        for (line_no, line) in reader.split(b'\n').enumerate() {
            let line = line.map_err(read_error)?;
            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }
            let mut bytes = trimmed.to_vec();
            match simd_json::from_slice::<WarehouseLine>(&mut bytes) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(file = %path.display(), line = line_no + 1, error = %e, "skipping malformed row");
                }
            }
        }
        Ok(rows)
    }

    /// Rows of one institution across all files, parsed in parallel.
    /// Any unreadable file fails the whole load.
    fn load_rows(&self, institution_id: &str) -> Result<Vec<WarehouseLine>> {
        let files = self.collect_files()?;
        let per_file = files
            .par_iter()
            .map(|f| {
                Self::parse_file(f).map(|rows| {
                    rows.into_iter()
                        .filter(|r| r.b2b_id == institution_id)
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let rows: Vec<WarehouseLine> = per_file.into_iter().flatten().collect();

        let name = rows.iter().find_map(WarehouseLine::display_name);
        if let Ok(mut names) = self.names.lock() {
            names.insert(institution_id.to_string(), name);
        }
        Ok(rows)
    }
}

impl UsageSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, query: &SourceQuery) -> Result<Vec<UsageRecord>> {
        let started = Instant::now();
        let periods: HashSet<&str> = query.periods.iter().map(String::as_str).collect();

        let rows = self.load_rows(&query.institution_id)?;

        let mut grouped: BTreeMap<(String, String), UsageRecord> = BTreeMap::new();
        for row in rows.into_iter().filter(|row| {
            query.granularity.matches_unit(&row.agg_unit) && periods.contains(row.label.as_str())
        }) {
            let record = row.into_record();
            grouped
                .entry((record.category.clone(), record.period.clone()))
                .and_modify(|existing| existing.absorb(&record))
                .or_insert(record);
        }

        let records: Vec<UsageRecord> = grouped.into_values().collect();
        debug!(
            institution = %query.institution_id,
            rows = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "file source query finished"
        );
        Ok(records)
    }

    fn institution_name(&self, institution_id: &str) -> Result<Option<String>> {
        let cached = self
            .names
            .lock()
            .ok()
            .and_then(|names| names.get(institution_id).cloned());
        if let Some(name) = cached {
            return Ok(name);
        }
        let rows = self.load_rows(institution_id)?;
        Ok(rows.iter().find_map(WarehouseLine::display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Granularity;
    use std::io::Write;

    const FIXTURE: &str = "tests/fixtures/warehouse-sample.jsonl";

    fn query(id: &str, granularity: Granularity, periods: &[&str]) -> SourceQuery {
        SourceQuery::new(
            id.into(),
            granularity,
            periods.iter().map(|s| s.to_string()).collect(),
            None,
        )
    }

    fn find<'a>(records: &'a [UsageRecord], category: &str, period: &str) -> &'a UsageRecord {
        records
            .iter()
            .find(|r| r.category == category && r.period == period)
            .unwrap()
    }

    #[test]
    fn test_fetch_filters_institution_unit_and_period() {
        let source = FileSource::new(FIXTURE);
        let records = source
            .fetch(&query("ICST00004103", Granularity::Monthly, &["2024-01", "2024-02"]))
            .unwrap();

        assert!(records.iter().all(|r| r.period.len() == 7));
        assert!(records
            .iter()
            .all(|r| r.period == "2024-01" || r.period == "2024-02"));
        let idea_jan = find(&records, "AI IDEA", "2024-01");
        assert_eq!(idea_jan.used, 10.0);
        assert_eq!(idea_jan.prior_year_used, 20.0);
    }

    #[test]
    fn test_fetch_groups_duplicate_rows() {
        let source = FileSource::new(FIXTURE);
        let records = source
            .fetch(&query("ICST00004103", Granularity::Monthly, &["2024-02"]))
            .unwrap();
        // fixture has two AI Viewer rows for 2024-02 (4 + 6)
        assert_eq!(find(&records, "AI Viewer", "2024-02").used, 10.0);
        assert_eq!(
            records
                .iter()
                .filter(|r| r.category == "AI Viewer" && r.period == "2024-02")
                .count(),
            1
        );
    }

    #[test]
    fn test_fetch_null_prior_is_zero() {
        let source = FileSource::new(FIXTURE);
        let records = source
            .fetch(&query("ICST00004103", Granularity::Monthly, &["2024-02"]))
            .unwrap();
        assert_eq!(find(&records, "AI IDEA", "2024-02").prior_year_used, 0.0);
    }

    #[test]
    fn test_fetch_daily_rows() {
        let source = FileSource::new(FIXTURE);
        let records = source
            .fetch(&query(
                "ICST00004103",
                Granularity::Daily,
                &["2024-02-01", "2024-02-02"],
            ))
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(find(&records, "AI Search", "2024-02-02").session, 2.0);
    }

    #[test]
    fn test_fetch_unknown_institution_is_empty() {
        let source = FileSource::new(FIXTURE);
        let records = source
            .fetch(&query("NOPE", Granularity::Monthly, &["2024-01"]))
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_fetch_no_matching_files_is_error() {
        let source = FileSource::new("tests/fixtures/nonexistent/*.jsonl");
        let err = source
            .fetch(&query("X", Granularity::Monthly, &["2024-01"]))
            .unwrap_err();
        assert!(matches!(err, ReportError::Source(_)));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        writeln!(
            file,
            r#"{{"b2b_id":"X","agg_unit":"month","service_type":"AI IDEA","label":"2024-01","used_sum":3}}"#
        )
        .unwrap();
        writeln!(file).unwrap();

        let source = FileSource::new(path.to_string_lossy());
        let records = source
            .fetch(&query("X", Granularity::Monthly, &["2024-01"]))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].used, 3.0);
    }

    #[test]
    fn test_non_utf8_line_skipped_not_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"b2b_id":"X","agg_unit":"month","service_type":"AI IDEA","label":"2024-01","used_sum":3}}"#
        )
        .unwrap();
        file.write_all(b"{\"b2b_id\":\"X\",\xff\xfe}\n").unwrap();
        writeln!(
            file,
            r#"{{"b2b_id":"X","agg_unit":"month","service_type":"AI IDEA","label":"2024-01","used_sum":4}}"#
        )
        .unwrap();
        drop(file);

        let source = FileSource::new(path.to_string_lossy());
        let records = source
            .fetch(&query("X", Granularity::Monthly, &["2024-01"]))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].used, 7.0);
    }

    #[test]
    fn test_crlf_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.jsonl");
        std::fs::write(
            &path,
            "{\"b2b_id\":\"X\",\"agg_unit\":\"month\",\"service_type\":\"AI IDEA\",\"label\":\"2024-01\",\"used_sum\":2}\r\n",
        )
        .unwrap();

        let source = FileSource::new(path.to_string_lossy());
        let records = source
            .fetch(&query("X", Granularity::Monthly, &["2024-01"]))
            .unwrap();
        assert_eq!(records[0].used, 2.0);
    }

    #[test]
    fn test_glob_over_multiple_files() {
        let dir = tempfile::tempdir().unwrap();
        for (name, used) in [("a.jsonl", 2), ("b.jsonl", 5)] {
            let mut file = File::create(dir.path().join(name)).unwrap();
            writeln!(
                file,
                r#"{{"b2b_id":"X","agg_unit":"month","service_type":"AI IDEA","label":"2024-01","used_sum":{}}}"#,
                used
            )
            .unwrap();
        }

        let pattern = dir.path().join("*.jsonl");
        let source = FileSource::new(pattern.to_string_lossy());
        let records = source
            .fetch(&query("X", Granularity::Monthly, &["2024-01"]))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].used, 7.0);
    }

    #[test]
    fn test_institution_name() {
        let source = FileSource::new(FIXTURE);
        assert_eq!(
            source.institution_name("ICST00004103").unwrap().as_deref(),
            Some("Hanbit University")
        );
        assert_eq!(source.institution_name("NOPE").unwrap(), None);
    }

    #[test]
    fn test_institution_name_reuses_fetch_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.jsonl");
        std::fs::write(
            &path,
            r#"{"b2b_id":"X","b2b_nm":" Hanbit University ","agg_unit":"month","service_type":"AI IDEA","label":"2024-01","used_sum":1}"#,
        )
        .unwrap();

        let source = FileSource::new(path.to_string_lossy());
        source
            .fetch(&query("X", Granularity::Monthly, &["2024-01"]))
            .unwrap();
        // the export is gone, so the name can only come from the earlier pass
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            source.institution_name("X").unwrap().as_deref(),
            Some("Hanbit University")
        );
        assert!(matches!(
            source.institution_name("Y").unwrap_err(),
            ReportError::Source(_)
        ));
    }
}
