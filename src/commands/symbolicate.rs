//! Symbolication request pipeline.
//!
//! A request for `(version, target, trace)`:
//! 1. Looks up the exact key in the result store
//! 2. On a hit, counts the request and returns the stored trace
//! 3. On a miss, resolves the version, fetches debug info, builds the
//!    symbol cache and resolves the trace
//! 4. Stores the trace (if still absent) and counts the request in one
//!    transaction
//!
//! Two concurrent first requests for the same key may both take the miss
//! path. The store's set-if-absent plus increment keeps the stored trace
//! and the counter correct either way, so no in-process lock is taken.

use crate::output::LinkResolver;
use crate::parser::schema::{DebugInfoBlob, Frame, RequestKey, Trace};
use crate::rpc::{
    build_http_client, read_local_blob, CommitLookup, DebugInfoFetcher, DebugInfoSource,
    GitHubCommitLookup, VersionResolver,
};
use crate::store::ResultStore;
use crate::symbolicate::{DetectingEngine, SymbolicationEngine};
use crate::utils::config::PipelineConfig;
use crate::utils::error::{StorageError, SymbolicateError};
use anyhow::Context;
use log::{debug, error, info};
use serde::Serialize;

/// Outcome of one request before rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Symbolicated {
    pub key: RequestKey,
    pub trace: Trace,
    /// Counter value after this request
    pub count: u64,
    /// Served from the result store
    pub cached: bool,
}

/// Frame plus its source link
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedFrame {
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Fully assembled response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolicatedResponse {
    pub version: String,
    pub target: String,
    pub trace: String,
    pub frames: Vec<Vec<AnnotatedFrame>>,
    pub count: u64,
    pub cached: bool,
    pub view_url: String,
    pub issue_url: String,
}

/// The request pipeline with its collaborators
pub struct Symbolicator<L, S, E> {
    resolver: VersionResolver<L>,
    source: S,
    engine: E,
    store: ResultStore,
    links: LinkResolver,
    config: PipelineConfig,
}

/// Pipeline wired to the real network collaborators and the format
/// detecting engine
pub type DefaultSymbolicator =
    Symbolicator<GitHubCommitLookup, DebugInfoFetcher, DetectingEngine>;

impl DefaultSymbolicator {
    /// Wire the default collaborators from configuration
    pub fn from_config(config: PipelineConfig, store: ResultStore) -> anyhow::Result<Self> {
        let client =
            build_http_client(config.http_timeout).context("Failed to create HTTP client")?;

        let lookup = GitHubCommitLookup::with_client(client.clone(), config.commit_api.clone());
        let fetcher = DebugInfoFetcher::new(
            client,
            config.storage_root.clone(),
            config.artifact_template.clone(),
        );

        Ok(Symbolicator::new(
            VersionResolver::new(lookup),
            fetcher,
            DetectingEngine::new(),
            store,
            config,
        ))
    }
}

impl<L, S, E> Symbolicator<L, S, E>
where
    L: CommitLookup,
    S: DebugInfoSource,
    E: SymbolicationEngine,
{
    pub fn new(
        resolver: VersionResolver<L>,
        source: S,
        engine: E,
        store: ResultStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            resolver,
            source,
            engine,
            store,
            links: LinkResolver::new(),
            config,
        }
    }

    pub fn with_links(mut self, links: LinkResolver) -> Self {
        self.links = links;
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn links(&self) -> &LinkResolver {
        &self.links
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve a request, using the stored trace when there is one
    ///
    /// **Public** - main entry point of the pipeline
    ///
    /// # Errors
    /// Every error is terminal for this request; nothing is retried.
    /// See `SymbolicateError::kind` for the permanent/transient split.
    pub fn symbolicate(&self, key: &RequestKey) -> Result<Symbolicated, SymbolicateError> {
        if let Some(trace) = self.store.lookup(key).map_err(storage_failure)? {
            info!("Cache hit for {}/{}", key.version, key.target);
            let count = self.store.record_hit(key).map_err(storage_failure)?;
            return Ok(Symbolicated {
                key: key.clone(),
                trace,
                count,
                cached: true,
            });
        }

        info!("Cache miss for {}/{}", key.version, key.target);

        let blob = self.acquire_debug_info(key)?;

        info!("Step 3/4: Symbolicating trace ({} bytes of debug info)", blob.len());
        let trace = {
            let cache = self.engine.build_cache(&blob)?;
            self.engine.resolve(&key.trace, &cache)?
        };
        debug!("Resolved {} frame groups", trace.len());

        info!("Step 4/4: Recording result");
        let count = self
            .store
            .record_miss(key, &trace)
            .map_err(storage_failure)?;

        Ok(Symbolicated {
            key: key.clone(),
            trace,
            count,
            cached: false,
        })
    }

    /// Symbolicate and assemble the full response with links
    pub fn respond(&self, key: &RequestKey) -> Result<SymbolicatedResponse, SymbolicateError> {
        let result = self.symbolicate(key)?;
        Ok(self.assemble(result))
    }

    /// Attach source links and the issue URL
    pub fn assemble(&self, result: Symbolicated) -> SymbolicatedResponse {
        let Symbolicated {
            key,
            trace,
            count,
            cached,
        } = result;

        let view_url = self.config.view_url(&key.version, &key.target, &key.trace);
        let issue_url =
            self.links
                .build_issue_url(&trace, &key.version, &key.target, &key.trace, &view_url);

        let frames = trace
            .groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|frame| AnnotatedFrame {
                        link: self.links.link_for(&frame.full_path, frame.line),
                        frame,
                    })
                    .collect()
            })
            .collect();

        SymbolicatedResponse {
            version: key.version,
            target: key.target,
            trace: key.trace,
            frames,
            count,
            cached,
            view_url,
            issue_url,
        }
    }

    /// Local override first; otherwise resolve the version and download
    fn acquire_debug_info(&self, key: &RequestKey) -> Result<DebugInfoBlob, SymbolicateError> {
        if let Some(path) = &self.config.debug_info_override {
            info!("Step 1/4: Skipping version resolution (local override)");
            info!("Step 2/4: Reading debug info from {}", path.display());
            return Ok(read_local_blob(path)?);
        }

        info!("Step 1/4: Resolving version {}", key.version);
        let resolved = self.resolver.resolve(&key.version)?;

        info!("Step 2/4: Fetching debug info for {}", key.target);
        Ok(self.source.fetch(&resolved, &key.target)?)
    }
}

fn storage_failure(err: StorageError) -> SymbolicateError {
    error!("Result store failure: {}", err);
    SymbolicateError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::ResolvedVersion;
    use crate::utils::error::{EngineError, FetchError, VersionError};
    use std::sync::Mutex;

    struct FixedLookup;

    impl CommitLookup for FixedLookup {
        fn full_sha(&self, _short_hash: &str) -> Result<String, VersionError> {
            Ok("abcdef0123456789abcdef0123456789abcdef01".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSource {
        requested: Mutex<Vec<String>>,
    }

    impl DebugInfoSource for RecordingSource {
        fn fetch(
            &self,
            version: &ResolvedVersion,
            target: &str,
        ) -> Result<DebugInfoBlob, FetchError> {
            self.requested
                .lock()
                .unwrap()
                .push(format!("{}/{}/{}", version.channel(), version.build_id(), target));
            Ok(b"blob".to_vec())
        }
    }

    struct NameEngine;

    impl SymbolicationEngine for NameEngine {
        type Cache = usize;

        fn build_cache(&self, blob: &[u8]) -> Result<usize, EngineError> {
            Ok(blob.len())
        }

        fn resolve(&self, encoded_trace: &str, cache: &usize) -> Result<Trace, EngineError> {
            Ok(Trace::new(vec![vec![Frame {
                demangled_name: format!("{}:{}", encoded_trace, cache),
                name: encoded_trace.to_string(),
                language: "rust".to_string(),
                full_path: "/gh/deno/cli/main.rs".to_string(),
                line: 3,
            }]]))
        }
    }

    fn pipeline(config: PipelineConfig) -> Symbolicator<FixedLookup, RecordingSource, NameEngine> {
        Symbolicator::new(
            VersionResolver::new(FixedLookup),
            RecordingSource::default(),
            NameEngine,
            ResultStore::open_in_memory().unwrap(),
            config,
        )
    }

    #[test]
    fn test_miss_then_hit() {
        let pipeline = pipeline(PipelineConfig::default());
        let key = RequestKey::new("v2.2.5", "aarch64-apple-darwin", "gB");

        let first = pipeline.symbolicate(&key).unwrap();
        assert!(!first.cached);
        assert_eq!(first.count, 1);

        let second = pipeline.symbolicate(&key).unwrap();
        assert!(second.cached);
        assert_eq!(second.count, 2);
        assert_eq!(second.trace, first.trace);

        assert_eq!(pipeline.source.requested.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_canary_fetch_uses_full_sha() {
        let pipeline = pipeline(PipelineConfig::default());
        pipeline
            .symbolicate(&RequestKey::new("v2.2.3+abcdef0", "x86_64-unknown-linux-gnu", "A"))
            .unwrap();

        let requested = pipeline.source.requested.lock().unwrap();
        assert_eq!(
            requested[0],
            "canary/abcdef0123456789abcdef0123456789abcdef01/x86_64-unknown-linux-gnu"
        );
    }

    #[test]
    fn test_local_override_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let pipeline =
            pipeline(PipelineConfig::default().with_debug_info_override(Some(path)));
        let result = pipeline
            .symbolicate(&RequestKey::new("v2.2.3+abcdef0", "t", "A"))
            .unwrap();

        assert_eq!(result.trace.groups[0][0].demangled_name, "A:10");
        assert!(pipeline.source.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_respond_attaches_links() {
        let pipeline = pipeline(PipelineConfig::default().with_public_url("http://localhost:8000"));
        let response = pipeline
            .respond(&RequestKey::new("v2.2.5", "t", "gB"))
            .unwrap();

        assert_eq!(response.view_url, "http://localhost:8000/v2.2.5/t/gB");
        assert_eq!(
            response.frames[0][0].link.as_deref(),
            Some("https://github.com/denoland/deno/blob/main/cli/main.rs#L3")
        );
        assert!(response.issue_url.contains("labels=bug"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["frames"][0][0]["demangledName"], "gB:4");
        assert_eq!(json["issueUrl"], response.issue_url.as_str());
    }
}
