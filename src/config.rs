//! Configuration file loading
//!
//! Resolution order for the file: `--config` flag, `UNIREPORT_CONFIG`, then
//! `<config dir>/unireport/config.toml`. A missing default file means built-in
//! defaults; a missing explicit file is an error. Environment overrides are
//! applied after the file.

use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::types::{default_categories, ReportError, Result};

/// Override config file path
pub const ENV_CONFIG: &str = "UNIREPORT_CONFIG";
/// Force the file source with this path or glob
pub const ENV_SOURCE_PATH: &str = "UNIREPORT_SOURCE_PATH";
/// Force the HTTP source with this base URL
pub const ENV_SOURCE_URL: &str = "UNIREPORT_SOURCE_URL";
/// Data source timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "UNIREPORT_TIMEOUT_SECS";

const DEFAULT_START_YEAR: i32 = 2024;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which data source adapter to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// File source: path or glob of JSONL exports
    pub path: Option<String>,
    /// HTTP source: base URL
    pub url: Option<String>,
    /// HTTP source: env var holding a bearer token
    pub token_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::File,
            path: Some("~/.unireport/warehouse/*.jsonl".into()),
            url: None,
            token_env: Some("UNIREPORT_TOKEN".into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving workbooks
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// First year of the monthly period set
    pub start_year: i32,
    /// Canonical category (row) order
    pub categories: Vec<String>,
    pub source: SourceConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_year: DEFAULT_START_YEAR,
            categories: default_categories(),
            source: SourceConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Load from the resolved path, then apply env overrides and validate
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(ENV_CONFIG)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/unireport/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "unireport").map(|d| d.config_dir().join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ReportError::Parse(format!("invalid config: {}", e)))
    }

    /// Apply environment overrides through `lookup` (injectable for tests)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_SOURCE_PATH) {
            self.source.kind = SourceKind::File;
            self.source.path = Some(path);
        }
        if let Some(url) = get(ENV_SOURCE_URL) {
            self.source.kind = SourceKind::Http;
            self.source.url = Some(url);
        }
        if let Some(secs) = get(ENV_TIMEOUT_SECS) {
            self.source.timeout_secs = secs.trim().parse().map_err(|_| {
                ReportError::Config(format!("{} must be a whole number, got '{}'", ENV_TIMEOUT_SECS, secs))
            })?;
        }
        Ok(())
    }

    /// Expand a leading `~/` in the file source path and export dir
    fn expand_paths(&mut self) {
        let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) else {
            return;
        };
        if let Some(path) = self.source.path.as_mut() {
            if let Some(rest) = path.strip_prefix("~/") {
                *path = home.join(rest).to_string_lossy().into_owned();
            }
        }
        if let Ok(rest) = self.export.dir.strip_prefix("~") {
            self.export.dir = home.join(rest);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.timeout_secs == 0 {
            return Err(ReportError::Config("source.timeout_secs must be > 0".into()));
        }
        if self.categories.is_empty() {
            return Err(ReportError::Config("categories must not be empty".into()));
        }
        if !(1970..=9999).contains(&self.start_year) {
            return Err(ReportError::Config(format!(
                "start_year {} is out of range",
                self.start_year
            )));
        }
        Ok(())
    }
}
