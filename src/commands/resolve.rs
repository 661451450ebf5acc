//! Resolve command implementation.
//!
//! Opens the result store, runs one request through the pipeline and
//! prints the stack trace with its issue URL (or the JSON response).

use super::models::ResolveArgs;
use super::symbolicate::DefaultSymbolicator;
use crate::output::{render_text, to_json};
use crate::parser::schema::RequestKey;
use crate::store::ResultStore;
use crate::utils::error::ErrorKind;
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::time::Instant;

/// Execute the resolve command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// Pipeline failures are reported with their classification, so callers
/// can tell "never resolvable" from "retry later".
pub fn execute_resolve(args: ResolveArgs) -> Result<()> {
    let start_time = Instant::now();
    validate_args(&args)?;

    let key = RequestKey::new(args.version, args.target, args.trace);
    info!("Symbolicating {} on {}", key.version, key.target);

    let store = ResultStore::open(&args.db_path)
        .with_context(|| format!("Failed to open result store {}", args.db_path.display()))?;
    let pipeline = DefaultSymbolicator::from_config(args.pipeline, store)?;

    let result = match pipeline.symbolicate(&key) {
        Ok(result) => result,
        Err(err) => {
            let kind = err.kind();
            let status = err.status_code();
            match kind {
                ErrorKind::Permanent => warn!("Trace cannot be resolved: {}", err),
                ErrorKind::Transient => error!("Symbolication failed, retry later: {}", err),
            }
            return Err(err).with_context(|| {
                format!("Failed to symbolicate {} (status {}, {:?})", key, status, kind)
            });
        }
    };

    let text = render_text(&result.trace, pipeline.links());
    let response = pipeline.assemble(result);

    if args.json {
        println!("{}", to_json(&response)?);
    } else {
        println!("{}", text);
        println!("Requests: {}{}", response.count, if response.cached { " (cached)" } else { "" });
        println!("Report:   {}", response.issue_url);
    }

    info!("Resolve completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Validate resolve arguments
///
/// **Public** - can be called before execute_resolve for early validation
///
/// The key components come from a path-like route, so none may be empty
/// or contain a `/`.
pub fn validate_args(args: &ResolveArgs) -> Result<()> {
    for (name, value) in [
        ("version", &args.version),
        ("target", &args.target),
        ("trace", &args.trace),
    ] {
        if value.is_empty() {
            anyhow::bail!("{} cannot be empty", name);
        }
        if value.contains('/') {
            anyhow::bail!("{} cannot contain '/'", name);
        }
    }

    Ok(())
}
