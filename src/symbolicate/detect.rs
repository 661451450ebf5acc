//! Default engine: picks the reader from the blob's file magic.
//!
//! Published artifacts are SymCaches; a local override may also be a plain
//! object file with DWARF.

use super::dwarf::{DwarfCache, DwarfEngine};
use super::symcache::{is_symcache, SymCacheBlob, SymCacheEngine};
use super::SymbolicationEngine;
use crate::parser::schema::Trace;
use crate::utils::error::EngineError;
use log::debug;

/// Cache built by whichever engine matched the blob
pub enum DetectedCache {
    SymCache(SymCacheBlob),
    Dwarf(DwarfCache),
}

/// Engine dispatching on the debug info format
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectingEngine {
    symcache: SymCacheEngine,
    dwarf: DwarfEngine,
}

impl DetectingEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SymbolicationEngine for DetectingEngine {
    type Cache = DetectedCache;

    fn build_cache(&self, blob: &[u8]) -> Result<DetectedCache, EngineError> {
        if is_symcache(blob) {
            debug!("Debug info is a symcache");
            self.symcache.build_cache(blob).map(DetectedCache::SymCache)
        } else {
            debug!("Debug info is not a symcache, reading it as an object file");
            self.dwarf.build_cache(blob).map(DetectedCache::Dwarf)
        }
    }

    fn resolve(&self, encoded_trace: &str, cache: &DetectedCache) -> Result<Trace, EngineError> {
        match cache {
            DetectedCache::SymCache(cache) => self.symcache.resolve(encoded_trace, cache),
            DetectedCache::Dwarf(cache) => self.dwarf.resolve(encoded_trace, cache),
        }
    }
}
