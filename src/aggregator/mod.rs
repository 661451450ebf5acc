//! Aggregation of request counters into dashboard metrics.
//!
//! This module transforms stored counters into:
//! - A ranked listing (most requested signatures first)
//! - Filtered views by text, version and target
//! - Distinct version and target lists for filter pickers

pub mod metrics;

// Re-export main types and functions
pub use metrics::{
    compare_versions, distinct_targets, distinct_versions, rank_counters, MetricEntry,
    MetricsAggregator, MetricsFilter, MetricsReport,
};
