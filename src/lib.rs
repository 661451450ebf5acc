//! Panic Symbolicator
//!
//! Resolves compact, address-only panic traces reported by Deno builds
//! into readable stack traces, links each frame to its source and counts
//! how often every crash signature is requested.
//!
//! This crate provides the core implementation for the
//! `panic-symbolicator` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! panic-symbolicator resolve v2.2.5 aarch64-apple-darwin gB
//! panic-symbolicator metrics --table
//! ```
//!
//! The pipeline is generic over its collaborators
//! (`rpc::CommitLookup`, `rpc::DebugInfoSource` and
//! `symbolicate::SymbolicationEngine`), so each can be replaced.

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod rpc;
pub mod store;
pub mod symbolicate;
pub mod utils;
