//! Version normalization.
//!
//! Release tags are used as-is. Canary identifiers (`<tag>+<shortHash>`)
//! need the full commit SHA, which only the commit lookup API knows.
//! Resolutions are not cached here: the result store already stops
//! repeated work for the same trace.

use super::client::{build_http_client, join_url};
use super::types::{is_full_sha, CommitResponse};
use crate::parser::schema::ResolvedVersion;
use crate::utils::error::VersionError;
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;

/// Resolves a short commit hash to the full SHA
pub trait CommitLookup {
    fn full_sha(&self, short_hash: &str) -> Result<String, VersionError>;
}

/// Commit lookup backed by the GitHub commits API
pub struct GitHubCommitLookup {
    client: Client,
    api_base: String,
}

impl GitHubCommitLookup {
    /// Create a lookup against `api_base` (e.g. `.../repos/<owner>/<repo>/commits`)
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, VersionError> {
        let client = build_http_client(timeout).map_err(VersionError::RequestFailed)?;

        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    /// Reuse an existing client
    pub fn with_client(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }
}

impl CommitLookup for GitHubCommitLookup {
    fn full_sha(&self, short_hash: &str) -> Result<String, VersionError> {
        let url = join_url(&self.api_base, short_hash);
        debug!("Commit lookup: {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(VersionError::LookupFailed {
                hash: short_hash.to_string(),
                status: status.as_u16(),
            });
        }

        let commit: CommitResponse = response.json()?;
        if !is_full_sha(&commit.sha) {
            return Err(VersionError::InvalidResponse(format!(
                "not a full commit SHA: {:?}",
                commit.sha
            )));
        }

        Ok(commit.sha)
    }
}

/// Normalizes version identifiers for debug info lookup
pub struct VersionResolver<L> {
    lookup: L,
}

impl<L: CommitLookup> VersionResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolve a version identifier
    ///
    /// **Public** - first step of the miss path
    ///
    /// # Arguments
    /// * `version` - release tag or `<tag>+<shortHash>` canary identifier
    ///
    /// # Errors
    /// * `VersionError::MissingHash` - nothing after the `+`
    /// * `VersionError::LookupFailed` - non-success status from the lookup API
    pub fn resolve(&self, version: &str) -> Result<ResolvedVersion, VersionError> {
        let Some((tag, short_hash)) = version.split_once('+') else {
            return Ok(ResolvedVersion::Release(version.to_string()));
        };

        if short_hash.is_empty() {
            return Err(VersionError::MissingHash(version.to_string()));
        }

        info!("Resolving canary commit {} ({})", short_hash, tag);
        let sha = self.lookup.full_sha(short_hash)?;
        debug!("Resolved {} -> {}", short_hash, sha);

        Ok(ResolvedVersion::Canary {
            tag: tag.to_string(),
            sha,
        })
    }
}
