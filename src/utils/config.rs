//! Configuration and constants for the symbolicator.

use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for commit lookups and debug info downloads
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Root of the public bucket holding per-build debug info
pub const DEFAULT_STORAGE_ROOT: &str = "https://storage.googleapis.com/dl.deno.land";

/// Commit lookup endpoint; the short hash is appended as a path segment
pub const DEFAULT_COMMIT_API: &str = "https://api.github.com/repos/denoland/deno/commits";

/// Public base URL where symbolicated traces are viewed
pub const DEFAULT_PUBLIC_URL: &str = "https://panic.deno.com";

/// Debug info file name inside a build directory. `{target}` is substituted.
pub const DEFAULT_ARTIFACT_TEMPLATE: &str = "deno-{target}.symcache";

/// Pre-filled issue form
pub const ISSUE_TRACKER_URL: &str = "https://github.com/denoland/deno/issues/new";

/// The commit API rejects requests without a user agent
pub const USER_AGENT: &str = concat!("panic-symbolicator/", env!("CARGO_PKG_VERSION"));

/// When set, debug info is read from this local file instead of the network
pub const DEBUG_INFO_OVERRIDE_ENV: &str = "DENO_SYMCACHE";

// Environment fallbacks for the CLI settings
pub const DB_PATH_ENV: &str = "PANIC_SYMBOLICATOR_DB";
pub const PUBLIC_URL_ENV: &str = "PANIC_SYMBOLICATOR_PUBLIC_URL";
pub const STORAGE_ROOT_ENV: &str = "PANIC_SYMBOLICATOR_STORAGE_ROOT";
pub const COMMIT_API_ENV: &str = "PANIC_SYMBOLICATOR_COMMIT_API";

/// Default SQLite database file for the result store
pub const DEFAULT_DB_PATH: &str = "symbolicator.db";

/// Result store schema version (tracked in `PRAGMA user_version`)
pub const STORE_SCHEMA_VERSION: i32 = 1;

/// How long a writer waits on a locked database before giving up
pub const STORE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Placeholder file path for frames without line info
pub const UNKNOWN_FILE: &str = "<unknown file>";

/// Everything the request pipeline needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub storage_root: String,
    pub commit_api: String,
    pub artifact_template: String,
    pub public_url: String,
    /// Local debug info file; bypasses version resolution and the network
    pub debug_info_override: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
            commit_api: DEFAULT_COMMIT_API.to_string(),
            artifact_template: DEFAULT_ARTIFACT_TEMPLATE.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            debug_info_override: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage_root(mut self, root: impl Into<String>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_commit_api(mut self, api: impl Into<String>) -> Self {
        self.commit_api = api.into();
        self
    }

    pub fn with_artifact_template(mut self, template: impl Into<String>) -> Self {
        self.artifact_template = template.into();
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into();
        self
    }

    pub fn with_debug_info_override(mut self, path: Option<PathBuf>) -> Self {
        self.debug_info_override = path;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// URL at which a given trace can be viewed
    pub fn view_url(&self, version: &str, target: &str, trace: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.public_url.trim_end_matches('/'),
            version,
            target,
            trace
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_url_trims_trailing_slash() {
        let config = PipelineConfig::new().with_public_url("http://localhost:8000/");
        assert_eq!(
            config.view_url("v2.2.5", "x86_64-unknown-linux-gnu", "gB"),
            "http://localhost:8000/v2.2.5/x86_64-unknown-linux-gnu/gB"
        );
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.storage_root, DEFAULT_STORAGE_ROOT);
        assert!(config.debug_info_override.is_none());
        assert!(config.artifact_template.contains("{target}"));
    }
}
