//! Debug info acquisition.
//!
//! Blobs live at `<storageRoot>/<release|canary>/<tag-or-sha>/<artifact>`.
//! Transfers are not retried.

use crate::parser::schema::{DebugInfoBlob, ResolvedVersion};
use crate::utils::error::FetchError;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::path::Path;

/// Source of debug info blobs for a resolved version and target
pub trait DebugInfoSource {
    fn fetch(&self, version: &ResolvedVersion, target: &str) -> Result<DebugInfoBlob, FetchError>;
}

/// Downloads debug info from remote storage
pub struct DebugInfoFetcher {
    client: Client,
    storage_root: String,
    artifact_template: String,
}

impl DebugInfoFetcher {
    pub fn new(
        client: Client,
        storage_root: impl Into<String>,
        artifact_template: impl Into<String>,
    ) -> Self {
        Self {
            client,
            storage_root: storage_root.into(),
            artifact_template: artifact_template.into(),
        }
    }

    /// Deterministic download URL for a build
    ///
    /// **Public** - exposed so callers can log or display it
    pub fn blob_url(&self, version: &ResolvedVersion, target: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.storage_root.trim_end_matches('/'),
            version.channel(),
            version.build_id(),
            self.artifact_template.replace("{target}", target)
        )
    }
}

impl DebugInfoSource for DebugInfoFetcher {
    fn fetch(&self, version: &ResolvedVersion, target: &str) -> Result<DebugInfoBlob, FetchError> {
        let url = self.blob_url(version, target);
        info!("Downloading debug info: {}", url);

        let response = self.client.get(&url).send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes()?;
        debug!("Downloaded {} bytes of debug info", bytes.len());

        Ok(bytes.to_vec())
    }
}

/// Read a debug info blob from the local override path
///
/// **Public** - used when the override is configured; skips the network
/// and version resolution entirely
pub fn read_local_blob(path: &Path) -> Result<DebugInfoBlob, FetchError> {
    info!("Using local debug info override: {}", path.display());

    std::fs::read(path).map_err(|source| FetchError::LocalRead {
        path: path.to_path_buf(),
        source,
    })
}
