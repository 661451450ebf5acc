//! SymCache-backed symbolication engine.
//!
//! Release storage publishes one `.symcache` per target, a compact
//! address-to-source index produced by `symbolic`. The same converter is
//! exposed as [`create_symcache`] so a local object file can be turned into
//! an artifact the storage layout expects.

use super::{normalize_path, SymbolicationEngine};
use crate::parser::schema::{Frame, FrameGroup, Trace};
use crate::parser::vlq::decode_addresses;
use crate::utils::config::UNKNOWN_FILE;
use crate::utils::error::EngineError;
use log::debug;
use std::io::Cursor;
use symbolic::common::Language;
use symbolic::debuginfo::Archive;
use symbolic::demangle::{Demangle, DemangleOptions};
use symbolic::symcache::{SymCache, SymCacheConverter};

/// File magic of a SymCache, in either byte order
const SYMCACHE_MAGIC: [&[u8; 4]; 2] = [b"SYMC", b"CMYS"];

/// Whether `blob` starts like a SymCache
pub fn is_symcache(blob: &[u8]) -> bool {
    SYMCACHE_MAGIC.iter().any(|magic| blob.starts_with(*magic))
}

/// Convert an object file with debug info into a serialized SymCache
///
/// # Errors
/// * `EngineError::SymbolCacheBuild` - the input is not a single object
///   or carries nothing the converter can read
pub fn create_symcache(debug_file: &[u8]) -> Result<Vec<u8>, EngineError> {
    let archive = Archive::parse(debug_file).map_err(build_error)?;
    let objects = archive
        .objects()
        .collect::<Result<Vec<_>, _>>()
        .map_err(build_error)?;

    let [object] = objects.as_slice() else {
        return Err(EngineError::SymbolCacheBuild(format!(
            "expected one object, found {}",
            objects.len()
        )));
    };

    let mut converter = SymCacheConverter::new();
    converter.process_object(object).map_err(build_error)?;

    let mut out = Vec::new();
    converter
        .serialize(&mut Cursor::new(&mut out))
        .map_err(build_error)?;

    debug!("Converted {:?} object into {} byte symcache", object.arch(), out.len());
    Ok(out)
}

fn build_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::SymbolCacheBuild(err.to_string())
}

/// A validated SymCache, parsed again for each resolution
#[derive(Debug, Clone)]
pub struct SymCacheBlob {
    bytes: Vec<u8>,
}

impl SymCacheBlob {
    fn parse(&self) -> Result<SymCache<'_>, EngineError> {
        SymCache::parse(&self.bytes).map_err(build_error)
    }
}

/// Engine resolving traces through a prebuilt SymCache
#[derive(Debug, Clone, Copy, Default)]
pub struct SymCacheEngine;

impl SymCacheEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolicationEngine for SymCacheEngine {
    type Cache = SymCacheBlob;

    fn build_cache(&self, blob: &[u8]) -> Result<SymCacheBlob, EngineError> {
        let cache = SymCacheBlob {
            bytes: blob.to_vec(),
        };
        cache.parse()?;
        debug!("Loaded symcache ({} bytes)", blob.len());
        Ok(cache)
    }

    fn resolve(&self, encoded_trace: &str, cache: &SymCacheBlob) -> Result<Trace, EngineError> {
        let addresses = decode_addresses(encoded_trace)?;
        let symcache = cache.parse()?;

        let groups = addresses
            .into_iter()
            .map(|offset| match u64::try_from(offset) {
                Ok(address) => lookup_group(&symcache, address),
                Err(_) => {
                    debug!("Offset {} lies outside the image", offset);
                    Vec::new()
                }
            })
            .collect();

        Ok(Trace::new(groups))
    }
}

/// Inlined frames first, the outer function last
fn lookup_group(symcache: &SymCache<'_>, address: u64) -> FrameGroup {
    symcache
        .lookup(address)
        .map(|location| {
            let function = location.function();
            Frame {
                demangled_name: function
                    .name_for_demangling()
                    .try_demangle(DemangleOptions::name_only())
                    .into_owned(),
                name: function.name().to_string(),
                language: language_tag(function.language()),
                full_path: location
                    .file()
                    .map(|file| normalize_path(&file.full_path()))
                    .unwrap_or_else(|| UNKNOWN_FILE.to_string()),
                line: location.line(),
            }
        })
        .collect()
}

fn language_tag(language: Language) -> String {
    match language {
        Language::Unknown => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own_symcache() -> Vec<u8> {
        let blob = std::fs::read(std::env::current_exe().unwrap()).unwrap();
        create_symcache(&blob).unwrap()
    }

    #[test]
    fn test_garbage_is_rejected() {
        let engine = SymCacheEngine::new();
        assert!(matches!(
            engine.build_cache(b"SYMC but nothing else"),
            Err(EngineError::SymbolCacheBuild(_))
        ));
        assert!(matches!(
            create_symcache(b"not an object"),
            Err(EngineError::SymbolCacheBuild(_))
        ));
    }

    #[test]
    fn test_magic_detection() {
        assert!(is_symcache(b"SYMC\x08\x00\x00\x00"));
        assert!(is_symcache(b"CMYS\x00\x00\x00\x08"));
        assert!(!is_symcache(b"\x7fELF"));
        assert!(!is_symcache(b"SYM"));
    }

    #[test]
    fn test_resolve_against_converted_binary() {
        let bytes = own_symcache();
        assert!(is_symcache(&bytes));

        let engine = SymCacheEngine::new();
        let cache = engine.build_cache(&bytes).unwrap();

        let trace = engine.resolve("AC", &cache).unwrap();
        assert_eq!(trace.len(), 2);

        // 0x1234, then a frame below the image base
        let trace = engine.resolve("ojJhggggxD", &cache).unwrap();
        assert_eq!(trace.len(), 2);
        assert!(trace.groups[1].is_empty());

        let err = engine.resolve("A!", &cache).unwrap_err();
        assert!(matches!(err, EngineError::TraceDecode { .. }));
    }

    #[test]
    fn test_language_tags() {
        assert_eq!(language_tag(Language::Rust), "rust");
        assert_eq!(language_tag(Language::Unknown), "");
    }
}
