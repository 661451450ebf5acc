//! Shared HTTP client for commit lookups and debug info downloads.

use crate::utils::config::USER_AGENT;
use reqwest::blocking::Client;
use std::time::Duration;

/// Build the blocking client used by every upstream call
///
/// **Public** - both the version resolver and the fetcher use it
///
/// No retries are configured; the timeout is the only bound on a call.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Join a base URL and one path segment with exactly one slash
pub fn join_url(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}
