use crate::output::LinkResolver;
use crate::symbolicate::create_symcache;
use crate::utils::config::{ISSUE_TRACKER_URL, STORE_SCHEMA_VERSION};
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

/// Print the source link for a file and line
///
/// Returns whether any rule matched.
pub fn display_link(links: &LinkResolver, file_path: &str, line: u32) -> Result<bool> {
    if line == 0 {
        anyhow::bail!("line numbers start at 1");
    }

    match links.link_for(file_path, line) {
        Some(link) => {
            println!("{}", link);
            Ok(true)
        }
        None => {
            eprintln!("No link rule matches {}", file_path);
            Ok(false)
        }
    }
}

/// Convert a local debug info file into a SymCache artifact
pub fn convert_symcache(input: &Path, output: &Path) -> Result<usize> {
    let debug_file = fs::read(input)
        .with_context(|| format!("Failed to read debug info from {}", input.display()))?;

    let symcache = create_symcache(&debug_file)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    fs::write(output, &symcache)
        .with_context(|| format!("Failed to write symcache to {}", output.display()))?;

    info!("Wrote {} ({} bytes)", output.display(), symcache.len());
    Ok(symcache.len())
}

/// Display version information
pub fn display_version() {
    println!("Panic Symbolicator v{}", env!("CARGO_PKG_VERSION"));
    println!("Store Schema: v{}", STORE_SCHEMA_VERSION);
    println!();
    println!("Resolves encoded Deno panic traces into source-level stack traces.");
    println!("Reports go to {}", ISSUE_TRACKER_URL);
}
