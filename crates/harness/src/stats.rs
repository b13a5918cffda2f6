//! Per-request statistics.
//!
//! Every call a virtual user makes is recorded under its request name
//! (e.g. `[Recommendation] GET /feed`). Failures that never produced a
//! response are recorded with zero response time and zero bytes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::CallError;
use crate::http::CallResponse;

/// Name used for the aggregated row.
pub const AGGREGATED: &str = "Aggregated";

/// Computed statistics for one request name.
#[derive(Debug, Clone, Serialize)]
pub struct RequestStats {
    pub name: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
    pub avg_bytes: f64,
    pub requests_per_second: f64,
}

/// A distinct failure message and how often it occurred.
#[derive(Debug, Clone, Serialize)]
pub struct FailureCount {
    pub name: String,
    pub error: String,
    pub occurrences: u64,
}

/// Full report for a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub duration_secs: f64,
    pub requests: Vec<RequestStats>,
    pub aggregated: RequestStats,
    pub failures: Vec<FailureCount>,
}

/// Atomic counters for one request name.
#[derive(Default)]
struct AtomicStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_bytes: AtomicU64,
    latencies: Mutex<Vec<u64>>,
    errors: Mutex<HashMap<String, u64>>,
}

impl AtomicStats {
    fn record(&self, success: bool, latency_ms: u64, bytes: usize, error: Option<String>) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.total_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
        self.latencies.lock().push(latency_ms);
        if let Some(error) = error {
            *self.errors.lock().entry(error).or_insert(0) += 1;
        }
    }

    fn compute(&self, name: &str, duration: Duration) -> RequestStats {
        compute_stats(
            name,
            self.total_requests.load(Ordering::Relaxed),
            self.successful_requests.load(Ordering::Relaxed),
            self.failed_requests.load(Ordering::Relaxed),
            self.total_bytes.load(Ordering::Relaxed),
            self.latencies.lock().clone(),
            duration,
        )
    }
}

fn compute_stats(
    name: &str,
    total: u64,
    successful: u64,
    failed: u64,
    total_bytes: u64,
    mut latencies: Vec<u64>,
    duration: Duration,
) -> RequestStats {
    latencies.sort_unstable();

    let min = latencies.first().copied().unwrap_or(0);
    let max = latencies.last().copied().unwrap_or(0);
    let avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<u64>() as f64 / latencies.len() as f64
    };

    let percentile = |p: f64| -> u64 {
        if latencies.is_empty() {
            return 0;
        }
        let idx = ((latencies.len() as f64 * p) as usize).min(latencies.len() - 1);
        latencies[idx]
    };

    let secs = duration.as_secs_f64();

    RequestStats {
        name: name.to_string(),
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        min_latency_ms: min,
        max_latency_ms: max,
        avg_latency_ms: avg,
        p50_latency_ms: percentile(0.5),
        p95_latency_ms: percentile(0.95),
        p99_latency_ms: percentile(0.99),
        avg_bytes: if total == 0 {
            0.0
        } else {
            total_bytes as f64 / total as f64
        },
        requests_per_second: if secs > 0.0 { total as f64 / secs } else { 0.0 },
    }
}

/// Thread-safe registry shared by all virtual users of a run.
#[derive(Default)]
pub struct StatsRegistry {
    entries: DashMap<String, AtomicStats>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one call.
    pub fn record(&self, name: &str, result: &Result<CallResponse, CallError>) {
        match result {
            Ok(response) => self.record_success(name, response.elapsed, response.bytes()),
            Err(err) => self.record_failure(name, err),
        }
    }

    /// Record an accepted response.
    pub fn record_success(&self, name: &str, elapsed: Duration, bytes: usize) {
        self.with_entry(name, |stats| {
            stats.record(true, elapsed.as_millis() as u64, bytes, None);
        });
    }

    /// Record a failed call.
    pub fn record_failure(&self, name: &str, err: &CallError) {
        let message = match err {
            CallError::Status { status, .. } => format!("Status {status}"),
            other => other.to_string(),
        };
        self.with_entry(name, |stats| {
            stats.record(
                false,
                err.elapsed().as_millis() as u64,
                err.bytes(),
                Some(message),
            );
        });
    }

    fn with_entry(&self, name: &str, f: impl FnOnce(&AtomicStats)) {
        if let Some(entry) = self.entries.get(name) {
            f(entry.value());
            return;
        }
        let entry = self.entries.entry(name.to_string()).or_default();
        f(entry.value());
    }

    /// Statistics for a single request name.
    pub fn get(&self, name: &str, duration: Duration) -> Option<RequestStats> {
        self.entries.get(name).map(|s| s.compute(name, duration))
    }

    /// Total number of recorded calls across all names.
    pub fn total_requests(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.total_requests.load(Ordering::Relaxed))
            .sum()
    }

    /// Number of distinct request names seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the full report, sorted by request name.
    pub fn report(&self, duration: Duration) -> Report {
        let mut requests: Vec<RequestStats> = self
            .entries
            .iter()
            .map(|e| e.value().compute(e.key(), duration))
            .collect();
        requests.sort_by(|a, b| a.name.cmp(&b.name));

        let mut all_latencies = Vec::new();
        let (mut total, mut successful, mut failed, mut bytes) = (0, 0, 0, 0);
        let mut failures = Vec::new();
        for entry in self.entries.iter() {
            total += entry.total_requests.load(Ordering::Relaxed);
            successful += entry.successful_requests.load(Ordering::Relaxed);
            failed += entry.failed_requests.load(Ordering::Relaxed);
            bytes += entry.total_bytes.load(Ordering::Relaxed);
            all_latencies.extend_from_slice(&entry.latencies.lock());
            for (error, occurrences) in entry.errors.lock().iter() {
                failures.push(FailureCount {
                    name: entry.key().clone(),
                    error: error.clone(),
                    occurrences: *occurrences,
                });
            }
        }
        failures.sort_by(|a, b| b.occurrences.cmp(&a.occurrences).then(a.name.cmp(&b.name)));

        Report {
            duration_secs: duration.as_secs_f64(),
            requests,
            aggregated: compute_stats(
                AGGREGATED,
                total,
                successful,
                failed,
                bytes,
                all_latencies,
                duration,
            ),
            failures,
        }
    }
}

impl std::fmt::Debug for StatsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsRegistry")
            .field("names", &self.entries.len())
            .field("total_requests", &self.total_requests())
            .finish()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_over_recorded_latencies() {
        let registry = StatsRegistry::new();
        for ms in 1..=100 {
            registry.record_success("GET /feed", Duration::from_millis(ms), 10);
        }
        let stats = registry.get("GET /feed", Duration::from_secs(10)).unwrap();
        assert_eq!(stats.total_requests, 100);
        assert_eq!(stats.min_latency_ms, 1);
        assert_eq!(stats.max_latency_ms, 100);
        assert_eq!(stats.p50_latency_ms, 51);
        assert_eq!(stats.p95_latency_ms, 96);
        assert_eq!(stats.p99_latency_ms, 100);
        assert!((stats.requests_per_second - 10.0).abs() < f64::EPSILON);
        assert!((stats.avg_bytes - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn timeout_recorded_with_zero_response_time() {
        let registry = StatsRegistry::new();
        registry.record(
            "[Weather] GET /api/weather/forecast/coordinates",
            &Err(CallError::Timeout(Duration::from_secs(5))),
        );
        let stats = registry
            .get(
                "[Weather] GET /api/weather/forecast/coordinates",
                Duration::from_secs(1),
            )
            .unwrap();
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.max_latency_ms, 0);
        assert_eq!(stats.avg_bytes, 0.0);
    }

    #[test]
    fn report_aggregates_and_groups_failures() {
        let registry = StatsRegistry::new();
        registry.record_success("a", Duration::from_millis(10), 1);
        registry.record_success("b", Duration::from_millis(30), 1);
        for _ in 0..3 {
            registry.record_failure(
                "b",
                &CallError::Status {
                    status: 500,
                    elapsed: Duration::from_millis(20),
                    bytes: 0,
                    body: String::new(),
                },
            );
        }

        let report = registry.report(Duration::from_secs(1));
        assert_eq!(report.requests.len(), 2);
        assert_eq!(report.requests[0].name, "a");
        assert_eq!(report.aggregated.total_requests, 5);
        assert_eq!(report.aggregated.failed_requests, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error, "Status 500");
        assert_eq!(report.failures[0].occurrences, 3);
        assert_eq!(registry.total_requests(), 5);
    }

    #[test]
    fn empty_registry_reports_zeroes() {
        let report = StatsRegistry::new().report(Duration::ZERO);
        assert_eq!(report.aggregated.total_requests, 0);
        assert_eq!(report.aggregated.requests_per_second, 0.0);
    }
}
