//! Ranked request counters for the dashboard.
//!
//! The most requested crash signatures come first; these are the panics
//! worth looking at.

use crate::parser::schema::RequestKey;
use crate::store::ResultStore;
use crate::utils::error::StorageError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One ranked counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub version: String,
    pub target: String,
    pub trace: String,
    pub count: u64,
    /// Where the trace can be viewed
    pub url: String,
}

/// Dashboard filters; `None` or an empty string matches everything
#[derive(Debug, Clone, Default)]
pub struct MetricsFilter {
    /// Case-insensitive substring of trace, version or target
    pub text: Option<String>,
    /// Exact version
    pub version: Option<String>,
    /// Exact target
    pub target: Option<String>,
}

impl MetricsFilter {
    /// Check whether an entry passes every filter
    pub fn matches(&self, entry: &MetricEntry) -> bool {
        let text_ok = match self.text.as_deref().filter(|t| !t.is_empty()) {
            None => true,
            Some(text) => {
                let needle = text.to_lowercase();
                [&entry.trace, &entry.version, &entry.target]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        };

        text_ok
            && exact_match(self.version.as_deref(), &entry.version)
            && exact_match(self.target.as_deref(), &entry.target)
    }
}

fn exact_match(wanted: Option<&str>, value: &str) -> bool {
    match wanted {
        None | Some("") => true,
        Some(wanted) => wanted == value,
    }
}

/// Snapshot served by the metrics command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    /// RFC 3339 timestamp
    pub generated_at: String,
    /// Sum of every listed counter
    pub total_requests: u64,
    pub entries: Vec<MetricEntry>,
}

impl MetricsReport {
    pub fn new(entries: Vec<MetricEntry>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_requests: entries.iter().map(|e| e.count).sum(),
            entries,
        }
    }
}

/// Builds ranked listings from the result store
pub struct MetricsAggregator<'a> {
    store: &'a ResultStore,
    public_url: String,
}

impl<'a> MetricsAggregator<'a> {
    pub fn new(store: &'a ResultStore, public_url: impl Into<String>) -> Self {
        Self {
            store,
            public_url: public_url.into(),
        }
    }

    /// Every counter, strictly descending by count
    ///
    /// **Public** - main entry point for the dashboard
    ///
    /// Ties keep the store's key order, so a fixed snapshot always
    /// produces the same listing.
    pub fn list_all(&self) -> Result<Vec<MetricEntry>, StorageError> {
        let counters = self.store.scan_counters(&[])?;
        Ok(rank_counters(counters, &self.public_url))
    }

    /// Ranked counters that pass `filter`
    pub fn list_filtered(&self, filter: &MetricsFilter) -> Result<Vec<MetricEntry>, StorageError> {
        let entries: Vec<MetricEntry> = self
            .list_all()?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .collect();

        debug!("{} entries after filtering", entries.len());
        Ok(entries)
    }
}

/// Rank raw counters by descending count
///
/// **Public** - pure ranking step, shared with tests
///
/// The sort is stable: equal counts keep their input order.
pub fn rank_counters(counters: Vec<(RequestKey, u64)>, public_url: &str) -> Vec<MetricEntry> {
    let base = public_url.trim_end_matches('/');
    let mut entries: Vec<MetricEntry> = counters
        .into_iter()
        .map(|(key, count)| MetricEntry {
            url: format!("{}/{}/{}/{}", base, key.version, key.target, key.trace),
            version: key.version,
            target: key.target,
            trace: key.trace,
            count,
        })
        .collect();

    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Distinct versions, newest release first, canaries last
pub fn distinct_versions(entries: &[MetricEntry]) -> Vec<String> {
    let mut versions = distinct(entries.iter().map(|e| e.version.as_str()));
    versions.sort_by(|a, b| compare_versions(a, b));
    versions
}

/// Distinct targets in first-seen order
pub fn distinct_targets(entries: &[MetricEntry]) -> Vec<String> {
    distinct(entries.iter().map(|e| e.target.as_str()))
}

fn distinct<'e>(values: impl Iterator<Item = &'e str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Dashboard version order
///
/// Releases sort before canaries. Otherwise parts compare left to right:
/// numeric parts come before non-numeric ones and larger numbers first.
/// With no difference, the version with more parts comes first, and the
/// raw strings break any remaining tie. This is a total order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_canary = a.contains('+');
    let b_canary = b.contains('+');

    a_canary
        .cmp(&b_canary)
        .then_with(|| compare_parts(&numeric_parts(a), &numeric_parts(b)))
        .then_with(|| a.cmp(b))
}

fn compare_parts(a: &[Option<u64>], b: &[Option<u64>]) -> Ordering {
    for (a_part, b_part) in a.iter().zip(b) {
        // Reversed: Some beats None, larger beats smaller
        let ord = b_part.cmp(a_part);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    b.len().cmp(&a.len())
}

fn numeric_parts(version: &str) -> Vec<Option<u64>> {
    version_parts(version)
        .into_iter()
        .map(leading_number)
        .collect()
}

fn version_parts(version: &str) -> Vec<&str> {
    version
        .strip_prefix('v')
        .unwrap_or(version)
        .split(&['.', '-', '+'][..])
        .collect()
}

fn leading_number(part: &str) -> Option<u64> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(version: &str, target: &str, trace: &str, count: u64) -> MetricEntry {
        MetricEntry {
            version: version.to_string(),
            target: target.to_string(),
            trace: trace.to_string(),
            count,
            url: String::new(),
        }
    }

    #[test]
    fn test_rank_counters_builds_urls() {
        let ranked = rank_counters(
            vec![(RequestKey::new("v2.2.5", "x86_64-unknown-linux-gnu", "gB"), 3)],
            "https://panic.example.com/",
        );
        assert_eq!(
            ranked[0].url,
            "https://panic.example.com/v2.2.5/x86_64-unknown-linux-gnu/gB"
        );
    }

    #[test]
    fn test_filter_text_is_case_insensitive() {
        let filter = MetricsFilter {
            text: Some("LINUX".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&entry("v2.2.5", "x86_64-unknown-linux-gnu", "A", 1)));
        assert!(!filter.matches(&entry("v2.2.5", "aarch64-apple-darwin", "A", 1)));
    }

    #[test]
    fn test_filter_exact_fields() {
        let filter = MetricsFilter {
            text: Some(String::new()),
            version: Some("v2.2.5".to_string()),
            target: None,
        };
        assert!(filter.matches(&entry("v2.2.5", "t", "A", 1)));
        assert!(!filter.matches(&entry("v2.2.50", "t", "A", 1)));
    }

    #[test]
    fn test_compare_versions() {
        let mut versions = vec![
            "v2.2.3+abcdef0",
            "v1.46.3",
            "v2.2.5",
            "v2.10.0",
            "v2.2",
        ];
        versions.sort_by(|a, b| compare_versions(a, b));
        assert_eq!(
            versions,
            vec!["v2.10.0", "v2.2.5", "v2.2", "v1.46.3", "v2.2.3+abcdef0"]
        );
    }

    #[test]
    fn test_non_numeric_parts_have_a_fixed_place() {
        // 1ab has a leading number, abc has none, 9x beats both
        assert_eq!(compare_versions("v2.2.3+9x", "v2.2.3+1ab"), Ordering::Less);
        assert_eq!(compare_versions("v2.2.3+1ab", "v2.2.3+abc"), Ordering::Less);
        assert_eq!(compare_versions("v2.2.3+9x", "v2.2.3+abc"), Ordering::Less);

        // Same numeric shape falls back to the raw string
        assert_eq!(compare_versions("v2.2.3+abc", "v2.2.3+abd"), Ordering::Less);
        assert_eq!(compare_versions("v2.2.3+abd", "v2.2.3+abc"), Ordering::Greater);
    }

    #[test]
    fn test_distinct_targets_first_seen() {
        let entries = vec![
            entry("v1", "b", "A", 3),
            entry("v1", "a", "B", 2),
            entry("v2", "b", "C", 1),
        ];
        assert_eq!(distinct_targets(&entries), vec!["b", "a"]);
        assert_eq!(distinct_versions(&entries), vec!["v2", "v1"]);
    }

    #[test]
    fn test_report_totals() {
        let report = MetricsReport::new(vec![entry("v1", "t", "A", 3), entry("v1", "t", "B", 4)]);
        assert_eq!(report.total_requests, 7);
        assert!(chrono::DateTime::parse_from_rfc3339(&report.generated_at).is_ok());
    }
}
