//! Symbolication engine capability.
//!
//! The pipeline treats the engine as a black box: it builds a symbol
//! cache from a debug info blob and resolves an encoded trace against it.
//! The encoded trace is passed through verbatim.

pub mod detect;
pub mod dwarf;
pub mod symcache;

use crate::parser::schema::Trace;
use crate::utils::error::EngineError;

pub use detect::{DetectedCache, DetectingEngine};
pub use dwarf::{DwarfCache, DwarfEngine};
pub use symcache::{create_symcache, is_symcache, SymCacheBlob, SymCacheEngine};

/// Builds symbol caches and resolves encoded traces
pub trait SymbolicationEngine {
    /// In-memory lookup structure, live for one resolution only
    type Cache;

    /// Build a symbol cache from a debug info blob
    ///
    /// # Errors
    /// * `EngineError::SymbolCacheBuild` - the blob is malformed
    fn build_cache(&self, blob: &[u8]) -> Result<Self::Cache, EngineError>;

    /// Resolve an encoded trace into frame groups
    ///
    /// # Errors
    /// * `EngineError::TraceDecode` - the trace string is malformed
    fn resolve(&self, encoded_trace: &str, cache: &Self::Cache) -> Result<Trace, EngineError>;
}

/// Debug info may carry Windows separators; links expect forward slashes
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
