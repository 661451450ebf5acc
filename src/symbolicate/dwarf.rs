//! DWARF-backed symbolication engine.
//!
//! Builds an `addr2line` context from an object file (ELF, Mach-O, PE or
//! Wasm) carrying DWARF, then resolves each decoded address into every
//! inlined frame at that location.

use super::{normalize_path, SymbolicationEngine};
use crate::parser::schema::{Frame, FrameGroup, Trace};
use crate::parser::vlq::decode_addresses;
use crate::utils::config::UNKNOWN_FILE;
use crate::utils::error::EngineError;
use addr2line::gimli;
use addr2line::Context;
use log::{debug, warn};
use object::Object;

type Reader = gimli::EndianRcSlice<gimli::RunTimeEndian>;

/// Symbol cache for one debug info blob
pub struct DwarfCache {
    context: Context<Reader>,
    /// Added to image-relative trace addresses before lookup
    base: u64,
}

/// Engine resolving traces through DWARF line and inline info
#[derive(Debug, Clone, Copy, Default)]
pub struct DwarfEngine;

impl DwarfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolicationEngine for DwarfEngine {
    type Cache = DwarfCache;

    fn build_cache(&self, blob: &[u8]) -> Result<DwarfCache, EngineError> {
        let obj = object::File::parse(blob)
            .map_err(|e| EngineError::SymbolCacheBuild(e.to_string()))?;
        let base = obj.relative_address_base();
        let context =
            Context::new(&obj).map_err(|e| EngineError::SymbolCacheBuild(e.to_string()))?;

        debug!("Built symbol cache ({:?}, base {:#x})", obj.format(), base);

        Ok(DwarfCache { context, base })
    }

    fn resolve(&self, encoded_trace: &str, cache: &DwarfCache) -> Result<Trace, EngineError> {
        let addresses = decode_addresses(encoded_trace)?;
        debug!("Decoded {} addresses", addresses.len());

        let groups = addresses
            .into_iter()
            .map(|offset| match u32::try_from(offset) {
                Ok(address) => recover_group(address, lookup_group(cache, address)),
                Err(_) => {
                    debug!("Offset {} lies outside the image", offset);
                    Vec::new()
                }
            })
            .collect();

        Ok(Trace::new(groups))
    }
}

/// A failed lookup costs its own position only
fn recover_group(address: u32, group: Result<FrameGroup, EngineError>) -> FrameGroup {
    group.unwrap_or_else(|err| {
        warn!("Lookup at {:#x} failed: {}", address, err);
        Vec::new()
    })
}

fn lookup_error(err: gimli::Error) -> EngineError {
    EngineError::Lookup(err.to_string())
}

/// Every frame at one address, innermost first. No debug info yields an
/// empty group.
fn lookup_group(cache: &DwarfCache, address: u32) -> Result<FrameGroup, EngineError> {
    let target = cache.base + u64::from(address);
    let mut frames = cache
        .context
        .find_frames(target)
        .skip_all_loads()
        .map_err(lookup_error)?;

    let mut group = Vec::new();
    while let Some(frame) = frames.next().map_err(lookup_error)? {
        let (name, demangled_name, language) = match &frame.function {
            Some(function) => {
                let raw = function.raw_name().map_err(lookup_error)?.into_owned();
                let demangled = function
                    .demangle()
                    .map(|name| name.into_owned())
                    .unwrap_or_else(|_| raw.clone());
                (raw, demangled, language_tag(function.language))
            }
            None => (String::new(), format!("{:#x}", target), String::new()),
        };

        let location = frame.location.as_ref();
        group.push(Frame {
            demangled_name,
            name,
            language,
            full_path: location
                .and_then(|l| l.file)
                .map(normalize_path)
                .unwrap_or_else(|| UNKNOWN_FILE.to_string()),
            line: location.and_then(|l| l.line).unwrap_or(0),
        });
    }

    Ok(group)
}

/// Short language tag for a DWARF language code
fn language_tag(language: Option<gimli::DwLang>) -> String {
    let Some(language) = language else {
        return String::new();
    };

    match language {
        gimli::DW_LANG_Rust => "rust".to_string(),
        gimli::DW_LANG_C | gimli::DW_LANG_C89 | gimli::DW_LANG_C99 | gimli::DW_LANG_C11 => {
            "c".to_string()
        }
        gimli::DW_LANG_C_plus_plus
        | gimli::DW_LANG_C_plus_plus_03
        | gimli::DW_LANG_C_plus_plus_11
        | gimli::DW_LANG_C_plus_plus_14 => "cpp".to_string(),
        gimli::DW_LANG_ObjC => "objc".to_string(),
        gimli::DW_LANG_ObjC_plus_plus => "objcpp".to_string(),
        gimli::DW_LANG_Swift => "swift".to_string(),
        other => other
            .static_string()
            .map(|s| s.trim_start_matches("DW_LANG_").to_lowercase())
            .unwrap_or_default(),
    }
}
