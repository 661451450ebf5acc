//! Wire types for upstream HTTP APIs.

use serde::Deserialize;

/// Commit lookup response; only the full SHA is used
#[derive(Debug, Deserialize)]
pub struct CommitResponse {
    pub sha: String,
}

/// Check that a string looks like a full hex commit SHA
pub fn is_full_sha(sha: &str) -> bool {
    (sha.len() == 40 || sha.len() == 64) && sha.chars().all(|c| c.is_ascii_hexdigit())
}
