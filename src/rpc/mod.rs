//! Upstream HTTP collaborators: commit lookup and debug info storage.

pub mod client;
pub mod debug_info;
pub mod types;
pub mod version;

pub use client::build_http_client;
pub use debug_info::{read_local_blob, DebugInfoFetcher, DebugInfoSource};
pub use version::{CommitLookup, GitHubCommitLookup, VersionResolver};
