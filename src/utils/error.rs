//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving a canary version to a full commit
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("commit lookup for {hash} returned HTTP {status}")]
    LookupFailed { hash: String, status: u16 },

    #[error("canary version {0} has no commit hash after '+'")]
    MissingHash(String),

    #[error("Invalid commit lookup response: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur while acquiring a debug info blob
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("debug info not found at {url}")]
    NotFound { url: String },

    #[error("debug info download from {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    Transfer(#[from] reqwest::Error),

    #[error("cannot read local debug info {}: {source}", .path.display())]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a symbolication engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cannot build symbol cache: {0}")]
    SymbolCacheBuild(String),

    #[error("cannot decode trace at byte {position}: {reason}")]
    TraceDecode { position: usize, reason: String },

    #[error("symbol lookup failed: {0}")]
    Lookup(String),
}

/// Errors that can occur in the result store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored trace is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Whether retrying the same request can ever succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The artifact is absent or the input is malformed
    Permanent,
    /// Infrastructure failure; retry later
    Transient,
}

/// Terminal failure of one symbolication request
#[derive(Error, Debug)]
pub enum SymbolicateError {
    #[error("version resolution failed: {0}")]
    VersionResolution(#[from] VersionError),

    #[error("{0}")]
    DebugInfoNotFound(FetchError),

    #[error("debug info transfer failed: {0}")]
    DebugInfoTransfer(FetchError),

    #[error("{0}")]
    SymbolCacheBuild(EngineError),

    #[error("{0}")]
    TraceDecode(EngineError),

    /// Detail stays in the log; callers only see a generic message
    #[error("internal storage error")]
    Storage(#[source] StorageError),
}

impl From<FetchError> for SymbolicateError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound { .. } => Self::DebugInfoNotFound(err),
            other => Self::DebugInfoTransfer(other),
        }
    }
}

impl From<EngineError> for SymbolicateError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::TraceDecode { .. } => Self::TraceDecode(err),
            other => Self::SymbolCacheBuild(other),
        }
    }
}

impl From<StorageError> for SymbolicateError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl SymbolicateError {
    /// Classify the failure for operators and automated clients
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VersionResolution(VersionError::LookupFailed { status, .. })
                if *status == 404 || *status == 422 =>
            {
                ErrorKind::Permanent
            }
            Self::VersionResolution(VersionError::MissingHash(_)) => ErrorKind::Permanent,
            Self::VersionResolution(_) => ErrorKind::Transient,
            Self::DebugInfoNotFound(_) | Self::SymbolCacheBuild(_) | Self::TraceDecode(_) => {
                ErrorKind::Permanent
            }
            Self::DebugInfoTransfer(_) | Self::Storage(_) => ErrorKind::Transient,
        }
    }

    /// HTTP-style status for the failure
    pub fn status_code(&self) -> u16 {
        match self {
            Self::DebugInfoNotFound(_) => 404,
            Self::SymbolCacheBuild(_) | Self::TraceDecode(_) => 422,
            Self::VersionResolution(_) if self.kind() == ErrorKind::Permanent => 404,
            Self::VersionResolution(_) | Self::DebugInfoTransfer(_) => 502,
            Self::Storage(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_permanent() {
        let err = SymbolicateError::from(FetchError::NotFound {
            url: "https://example.com/x".to_string(),
        });
        assert!(matches!(err, SymbolicateError::DebugInfoNotFound(_)));
        assert_eq!(err.kind(), ErrorKind::Permanent);
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_transfer_status_is_transient() {
        let err = SymbolicateError::from(FetchError::Status {
            url: "https://example.com/x".to_string(),
            status: 503,
        });
        assert!(matches!(err, SymbolicateError::DebugInfoTransfer(_)));
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(err.status_code(), 502);
    }

    #[test]
    fn test_engine_errors_split() {
        let decode = SymbolicateError::from(EngineError::TraceDecode {
            position: 3,
            reason: "bad".to_string(),
        });
        let build = SymbolicateError::from(EngineError::SymbolCacheBuild("bad".to_string()));
        assert!(matches!(decode, SymbolicateError::TraceDecode(_)));
        assert!(matches!(build, SymbolicateError::SymbolCacheBuild(_)));
        assert_eq!(decode.status_code(), 422);
    }

    #[test]
    fn test_lookup_status_classification() {
        let missing = SymbolicateError::from(VersionError::LookupFailed {
            hash: "abcdef0".to_string(),
            status: 422,
        });
        let throttled = SymbolicateError::from(VersionError::LookupFailed {
            hash: "abcdef0".to_string(),
            status: 403,
        });
        assert_eq!(missing.kind(), ErrorKind::Permanent);
        assert_eq!(throttled.kind(), ErrorKind::Transient);
        assert_eq!(throttled.status_code(), 502);
    }

    #[test]
    fn test_storage_message_is_generic() {
        let err = SymbolicateError::from(StorageError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(err.to_string(), "internal storage error");
        assert_eq!(err.status_code(), 500);
    }
}
