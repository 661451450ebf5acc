//! Metrics command implementation.
//!
//! Lists the most requested crash signatures, optionally filtered.

use super::models::MetricsArgs;
use crate::aggregator::{
    distinct_targets, distinct_versions, MetricEntry, MetricsAggregator, MetricsReport,
};
use crate::output::{to_json, write_json};
use crate::store::ResultStore;
use anyhow::{Context, Result};
use log::info;

/// Execute the metrics command
///
/// **Public** - main entry point called from main.rs
///
/// The report is printed as JSON unless `args.table` is set; `args.output`
/// takes precedence over both.
pub fn execute_metrics(args: MetricsArgs) -> Result<()> {
    let store = ResultStore::open(&args.db_path)
        .with_context(|| format!("Failed to open result store {}", args.db_path.display()))?;

    let report = build_report(&store, &args)?;
    info!(
        "{} entries, {} requests in total",
        report.entries.len(),
        report.total_requests
    );

    if let Some(path) = &args.output {
        write_json(&report, path).context("Failed to write metrics report")?;
        println!("✓ Metrics written to {}", path.display());
        return Ok(());
    }

    if args.table {
        print!("{}", format_report(&report));
    } else {
        println!("{}", to_json(&report)?);
    }

    Ok(())
}

/// Rank, filter and truncate the store's counters
///
/// **Public** - used by execute_metrics and tests
pub fn build_report(store: &ResultStore, args: &MetricsArgs) -> Result<MetricsReport> {
    let aggregator = MetricsAggregator::new(store, args.public_url.as_str());
    let mut entries = aggregator
        .list_filtered(&args.filter)
        .context("Failed to read request counters")?;

    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    Ok(MetricsReport::new(entries))
}

/// Plain-text ranking table
pub fn format_report(report: &MetricsReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Most requested traces ({} requests)\n",
        report.total_requests
    ));

    if report.entries.is_empty() {
        out.push_str("  (no traces)\n");
        return out;
    }

    for (rank, entry) in report.entries.iter().enumerate() {
        out.push_str(&format_entry(rank + 1, entry));
    }

    out.push('\n');
    out.push_str(&format!(
        "Versions: {}\n",
        distinct_versions(&report.entries).join(", ")
    ));
    out.push_str(&format!(
        "Targets:  {}\n",
        distinct_targets(&report.entries).join(", ")
    ));

    out
}

fn format_entry(rank: usize, entry: &MetricEntry) -> String {
    format!(
        "{:>4}. {:>8}  {} {}\n        {}\n",
        rank, entry.count, entry.version, entry.target, entry.url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::MetricsFilter;
    use crate::parser::schema::{RequestKey, Trace};

    fn seeded_store() -> ResultStore {
        let store = ResultStore::open_in_memory().unwrap();
        let trace = Trace::default();
        for (version, hits) in [("v2.2.5", 3), ("v2.2.4", 1), ("v2.2.3+abcdef0", 2)] {
            let key = RequestKey::new(version, "x86_64-unknown-linux-gnu", "gB");
            store.record_miss(&key, &trace).unwrap();
            for _ in 1..hits {
                store.record_hit(&key).unwrap();
            }
        }
        store
    }

    #[test]
    fn test_build_report_ranks_and_limits() {
        let store = seeded_store();
        let args = MetricsArgs {
            limit: Some(2),
            ..Default::default()
        };

        let report = build_report(&store, &args).unwrap();
        let versions: Vec<&str> = report.entries.iter().map(|e| e.version.as_str()).collect();

        assert_eq!(versions, vec!["v2.2.5", "v2.2.3+abcdef0"]);
        assert_eq!(report.total_requests, 5);
    }

    #[test]
    fn test_build_report_filters() {
        let store = seeded_store();
        let args = MetricsArgs {
            filter: MetricsFilter {
                version: Some("v2.2.4".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let report = build_report(&store, &args).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].count, 1);
    }

    #[test]
    fn test_format_report() {
        let report = build_report(&seeded_store(), &MetricsArgs::default()).unwrap();
        let text = format_report(&report);

        assert!(text.starts_with("Most requested traces (6 requests)\n"));
        assert!(text.contains("   1.        3  v2.2.5 x86_64-unknown-linux-gnu\n"));
        assert!(text.contains("Targets:  x86_64-unknown-linux-gnu\n"));
    }

    #[test]
    fn test_format_empty_report() {
        let text = format_report(&MetricsReport::new(Vec::new()));
        assert!(text.contains("(no traces)"));
    }
}
