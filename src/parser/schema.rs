//! Data model shared by the pipeline, the store and the renderers.
//!
//! Frames serialize in camelCase so stored traces stay readable by
//! existing consumers of the JSON shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one symbolication request.
///
/// Compared by exact structural equality; `target` is never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    /// Release tag (`v2.2.5`) or canary identifier (`v2.2.3+abcdef0`)
    pub version: String,

    /// Target triple of the crashing binary
    pub target: String,

    /// Encoded trace, passed to the engine verbatim
    pub trace: String,
}

impl RequestKey {
    pub fn new(
        version: impl Into<String>,
        target: impl Into<String>,
        trace: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            target: target.into(),
            trace: trace.into(),
        }
    }

    pub fn is_canary(&self) -> bool {
        self.version.contains('+')
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.version, self.target, self.trace)
    }
}

/// Version identifier used to locate debug info.
///
/// Only used to build the download URL; the original version string
/// remains the cache and display key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVersion {
    /// Release tag, used verbatim
    Release(String),

    /// Canary build, identified by its full commit SHA
    Canary { tag: String, sha: String },
}

impl ResolvedVersion {
    /// Storage channel directory (`release` or `canary`)
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Release(_) => "release",
            Self::Canary { .. } => "canary",
        }
    }

    /// Directory name inside the channel
    pub fn build_id(&self) -> &str {
        match self {
            Self::Release(tag) => tag,
            Self::Canary { sha, .. } => sha,
        }
    }
}

/// Raw debug metadata for one (version, target) pair
pub type DebugInfoBlob = Vec<u8>;

/// One resolved symbol at a stack position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub demangled_name: String,
    /// Raw (mangled) symbol name
    pub name: String,
    /// Source language tag, empty when unknown
    pub language: String,
    pub full_path: String,
    pub line: u32,
}

/// All entries at one call-stack position, innermost first.
///
/// More than one entry means the position expanded through inlining.
pub type FrameGroup = Vec<Frame>;

/// A symbolicated stack trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    pub groups: Vec<FrameGroup>,
}

impl Trace {
    pub fn new(groups: Vec<FrameGroup>) -> Self {
        Self { groups }
    }

    /// Number of stack positions
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every entry in display order, with its `(group, index)` position
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, &Frame)> {
        self.groups.iter().enumerate().flat_map(|(group_idx, group)| {
            group
                .iter()
                .enumerate()
                .map(move |(idx, frame)| (group_idx, idx, frame))
        })
    }
}
