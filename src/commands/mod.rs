//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod metrics;
pub mod models;
pub mod resolve;
pub mod symbolicate;
pub mod utils;

// Re-export main command functions
pub use metrics::{build_report, execute_metrics, format_report};
pub use models::{MetricsArgs, ResolveArgs};
pub use resolve::{execute_resolve, validate_args};
pub use symbolicate::{
    AnnotatedFrame, DefaultSymbolicator, Symbolicated, SymbolicatedResponse, Symbolicator,
};
pub use utils::{convert_symcache, display_link, display_version};
