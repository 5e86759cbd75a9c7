//! Diagnostic logging to stderr
//!
//! Report output goes to stdout; everything emitted here goes to stderr so
//! `--json` output stays machine-readable.

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// `EnvFilter` directive, e.g. `unireport=debug`
pub const ENV_LOG: &str = "UNIREPORT_LOG";
/// `json` for one JSON object per event, anything else for human output
pub const ENV_LOG_FORMAT: &str = "UNIREPORT_LOG_FORMAT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" | "text" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Filter directive used when `UNIREPORT_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn make_filter(verbose: bool) -> EnvFilter {
    std::env::var(ENV_LOG)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: bool) {
    let format = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .and_then(|v| LogFormat::from_arg(&v))
        .unwrap_or_default();
    let writer = BoxMakeWriter::new(std::io::stderr);

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter(verbose))
                .json()
                .with_writer(writer)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(make_filter(verbose))
                .with_writer(writer)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}
