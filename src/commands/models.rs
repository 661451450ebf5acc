use crate::aggregator::MetricsFilter;
use crate::utils::config::{PipelineConfig, DEFAULT_DB_PATH, DEFAULT_PUBLIC_URL};
use std::path::PathBuf;

/// Arguments for the resolve command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ResolveArgs {
    /// Result store database file
    pub db_path: PathBuf,

    /// Release tag or canary identifier
    pub version: String,

    /// Target triple
    pub target: String,

    /// Encoded trace
    pub trace: String,

    /// Print the response as JSON instead of text
    pub json: bool,

    /// Upstream endpoints, override and timeouts
    pub pipeline: PipelineConfig,
}

impl Default for ResolveArgs {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            version: String::new(),
            target: String::new(),
            trace: String::new(),
            json: false,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Arguments for the metrics command
#[derive(Debug, Clone)]
pub struct MetricsArgs {
    /// Result store database file
    pub db_path: PathBuf,

    /// Base for the per-entry view URLs
    pub public_url: String,

    pub filter: MetricsFilter,

    /// Keep only the top N entries
    pub limit: Option<usize>,

    /// Print a plain-text table instead of JSON
    pub table: bool,

    /// Write the report here instead of stdout
    pub output: Option<PathBuf>,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            filter: MetricsFilter::default(),
            limit: None,
            table: false,
            output: None,
        }
    }
}
