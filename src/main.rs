//! Panic Symbolicator CLI
//!
//! Resolves encoded Deno panic traces into stack traces with source links
//! and lists the most requested crash signatures.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::time::Duration;

use panic_symbolicator::aggregator::MetricsFilter;
use panic_symbolicator::commands::{
    convert_symcache, display_link, display_version, execute_metrics, execute_resolve, validate_args, MetricsArgs,
    ResolveArgs,
};
use panic_symbolicator::output::LinkResolver;
use panic_symbolicator::utils::config::{
    PipelineConfig, COMMIT_API_ENV, DB_PATH_ENV, DEBUG_INFO_OVERRIDE_ENV, DEFAULT_ARTIFACT_TEMPLATE,
    DEFAULT_COMMIT_API, DEFAULT_DB_PATH, DEFAULT_PUBLIC_URL, DEFAULT_STORAGE_ROOT, PUBLIC_URL_ENV,
    STORAGE_ROOT_ENV,
};

/// Panic Symbolicator - readable stack traces for Deno panics
#[derive(Parser, Debug)]
#[command(name = "panic-symbolicator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Result store database file
    #[arg(long, global = true, env = DB_PATH_ENV, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Public base URL used in view links
    #[arg(long, global = true, env = PUBLIC_URL_ENV, default_value = DEFAULT_PUBLIC_URL)]
    public_url: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Symbolicate an encoded panic trace
    Resolve {
        /// Release tag (v2.2.5) or canary identifier (v2.2.3+abcdef0)
        #[arg(value_name = "VERSION")]
        build_version: String,

        /// Target triple the build was made for
        target: String,

        /// Encoded trace from the panic message
        trace: String,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,

        /// Release artifact storage root
        #[arg(long, env = STORAGE_ROOT_ENV, default_value = DEFAULT_STORAGE_ROOT)]
        storage_root: String,

        /// Commit lookup API base
        #[arg(long, env = COMMIT_API_ENV, default_value = DEFAULT_COMMIT_API)]
        commit_api: String,

        /// Artifact file name; `{target}` is replaced by the target
        #[arg(long, default_value = DEFAULT_ARTIFACT_TEMPLATE)]
        artifact: String,

        /// Local debug info file; skips version resolution and download
        #[arg(long, env = DEBUG_INFO_OVERRIDE_ENV)]
        debug_info: Option<PathBuf>,

        /// HTTP timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// List the most requested traces
    #[command(disable_version_flag = true)]
    Metrics {
        /// Case-insensitive search over trace, version and target
        #[arg(long)]
        text: Option<String>,

        /// Only this exact version
        #[arg(long = "version", value_name = "VERSION")]
        version_filter: Option<String>,

        /// Only this exact target
        #[arg(long = "target", value_name = "TARGET")]
        target_filter: Option<String>,

        /// Number of entries to show
        #[arg(long)]
        limit: Option<usize>,

        /// Print a plain-text table instead of JSON
        #[arg(long)]
        table: bool,

        /// Write the JSON report to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the source link for a file path and line
    Link {
        /// Source path as recorded in debug info
        path: String,

        /// Line number
        line: u32,
    },

    /// Convert a debug info file into a symcache artifact
    Symcache {
        /// Object file with debug info
        input: PathBuf,

        /// Where to write the symcache
        output: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Resolve {
            build_version,
            target,
            trace,
            json,
            storage_root,
            commit_api,
            artifact,
            debug_info,
            timeout,
        } => {
            let pipeline = PipelineConfig::new()
                .with_storage_root(storage_root)
                .with_commit_api(commit_api)
                .with_artifact_template(artifact)
                .with_public_url(cli.public_url)
                .with_debug_info_override(debug_info)
                .with_http_timeout(Duration::from_secs(timeout));

            let args = ResolveArgs {
                db_path: cli.db,
                version: build_version,
                target,
                trace,
                json,
                pipeline,
            };

            // Validate args first
            validate_args(&args)?;

            execute_resolve(args)?;
        }

        Commands::Metrics {
            text,
            version_filter,
            target_filter,
            limit,
            table,
            output,
        } => {
            let args = MetricsArgs {
                db_path: cli.db,
                public_url: cli.public_url,
                filter: MetricsFilter {
                    text,
                    version: version_filter,
                    target: target_filter,
                },
                limit,
                table,
                output,
            };

            execute_metrics(args)?;
        }

        Commands::Link { path, line } => {
            if !display_link(&LinkResolver::new(), &path, line)? {
                std::process::exit(1);
            }
        }

        Commands::Symcache { input, output } => {
            convert_symcache(&input, &output)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn env_of(command: &clap::Command, id: &str) -> Option<String> {
        command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_setting_has_an_env_fallback() {
        let cli = Cli::command();
        assert_eq!(env_of(&cli, "db").as_deref(), Some(DB_PATH_ENV));
        assert_eq!(env_of(&cli, "public_url").as_deref(), Some(PUBLIC_URL_ENV));

        let resolve = cli.find_subcommand("resolve").unwrap();
        assert_eq!(env_of(resolve, "storage_root").as_deref(), Some(STORAGE_ROOT_ENV));
        assert_eq!(env_of(resolve, "commit_api").as_deref(), Some(COMMIT_API_ENV));
        assert_eq!(env_of(resolve, "debug_info").as_deref(), Some(DEBUG_INFO_OVERRIDE_ENV));
    }

    #[test]
    fn test_symcache_subcommand_parses() {
        let args = ["panic-symbolicator", "symcache", "deno.debug", "out.symcache"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Commands::Symcache { .. }));
    }
}
