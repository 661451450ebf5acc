//! Trace data model and encoded trace decoding.
//!
//! This module handles:
//! - Request keys, resolved versions, frames and traces
//! - Decoding the URL-safe VLQ trace format into addresses

pub mod schema;
pub mod vlq;

// Re-export main types
pub use schema::{DebugInfoBlob, Frame, FrameGroup, RequestKey, ResolvedVersion, Trace};
pub use vlq::{decode_addresses, encode_addresses};
