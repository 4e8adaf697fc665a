// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the embedding
//! application chooses the exporter.
//!
//! # Metric Naming Convention
//! - `contentful_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, histogram};
use std::time::Duration;

/// Record the outcome of one sync cycle.
pub fn record_sync(entries: usize, deleted: usize) {
    counter!("contentful_cache_synced_entries_total").increment(entries as u64);
    counter!("contentful_cache_deleted_entries_total").increment(deleted as u64);
    counter!("contentful_cache_sync_cycles_total").increment(1);
}

/// Record the wall-clock duration of one sync cycle.
pub fn record_sync_latency(duration: Duration) {
    histogram!("contentful_cache_sync_seconds").record(duration.as_secs_f64());
}

/// Record a cache operation outcome.
pub fn record_operation(operation: &str, status: &str) {
    counter!(
        "contentful_cache_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
