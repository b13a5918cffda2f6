//! Console and JSON output.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tripico_harness::cleanup::CleanupSummary;
use tripico_harness::pool::PoolSizes;
use tripico_harness::runner::RunSummary;
use tripico_harness::seed::SeedSummary;
use tripico_harness::stats::{Report, RequestStats};
use tripico_harness::workload::{ActionTally, ProfileKind};

/// Errors shown at the end of seeding.
const SHOWN_ERRORS: usize = 10;

#[derive(Serialize)]
struct JsonReport<'a> {
    profile: &'static str,
    elapsed_secs: f64,
    pool: PoolSizes,
    aborted_users: usize,
    actions: BTreeMap<&'static str, ActionTally>,
    #[serde(flatten)]
    report: &'a Report,
}

pub fn print_run(summary: &RunSummary) {
    let report = &summary.report;
    println!(
        "\nTest completed in {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );

    println!("\nRequests");
    println!("========");
    println!(
        "{:<58} {:>8} {:>6} {:>8} {:>7} {:>7} {:>7} {:>7} {:>8}",
        "Name", "Reqs", "Fails", "Avg", "Min", "P50", "P95", "Max", "Req/s"
    );
    for stats in &report.requests {
        print_row(stats);
    }
    print_row(&report.aggregated);

    let aggregated = &report.aggregated;
    println!();
    println!("Total requests:      {}", aggregated.total_requests);
    println!("Successful requests: {}", aggregated.successful_requests);
    println!("Failed requests:     {}", aggregated.failed_requests);
    if aggregated.total_requests > 0 {
        println!(
            "Success rate:        {:.2}%",
            (aggregated.successful_requests as f64 / aggregated.total_requests as f64) * 100.0
        );
    }
    println!();
    println!("Latency (ms):");
    println!("  Min:  {}", aggregated.min_latency_ms);
    println!("  Avg:  {:.2}", aggregated.avg_latency_ms);
    println!("  P50:  {}", aggregated.p50_latency_ms);
    println!("  P95:  {}", aggregated.p95_latency_ms);
    println!("  P99:  {}", aggregated.p99_latency_ms);
    println!("  Max:  {}", aggregated.max_latency_ms);

    if !report.failures.is_empty() {
        println!("\nFailures");
        println!("========");
        for failure in &report.failures {
            println!(
                "{:>6}  {}: {}",
                failure.occurrences, failure.name, failure.error
            );
        }
    }

    println!("\nActions (ok / failed / skipped)");
    println!("===============================");
    for (name, tally) in sorted_actions(summary) {
        println!(
            "{name:<28} {:>8} {:>8} {:>8}",
            tally.succeeded, tally.failed, tally.skipped
        );
    }

    println!(
        "\nContent pool: {} hot, {} known",
        summary.pool.hot, summary.pool.all
    );
    if summary.aborted_users > 0 {
        println!("Aborted users: {}", summary.aborted_users);
    }
}

fn print_row(stats: &RequestStats) {
    println!(
        "{:<58} {:>8} {:>6} {:>8.1} {:>7} {:>7} {:>7} {:>7} {:>8.2}",
        stats.name,
        stats.total_requests,
        stats.failed_requests,
        stats.avg_latency_ms,
        stats.min_latency_ms,
        stats.p50_latency_ms,
        stats.p95_latency_ms,
        stats.max_latency_ms,
        stats.requests_per_second,
    );
}

fn sorted_actions(summary: &RunSummary) -> BTreeMap<&'static str, ActionTally> {
    summary
        .actions
        .iter()
        .map(|(name, tally)| (*name, *tally))
        .collect()
}

/// Advisory gate results, one line each.
pub fn gate_lines(aggregated: &RequestStats, max_p95_ms: u64) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if aggregated.p95_latency_ms <= max_p95_ms {
        lines.push(format!(
            "✅ PASS: P95 latency ({} ms) <= {max_p95_ms} ms",
            aggregated.p95_latency_ms
        ));
    } else {
        lines.push(format!(
            "❌ FAIL: P95 latency ({} ms) > {max_p95_ms} ms",
            aggregated.p95_latency_ms
        ));
    }

    if aggregated.failed_requests == 0 {
        lines.push("✅ PASS: No failed requests".to_string());
    } else {
        lines.push(format!(
            "❌ FAIL: {} failed requests",
            aggregated.failed_requests
        ));
    }
    lines
}

pub fn print_gates(aggregated: &RequestStats, max_p95_ms: u64) {
    println!();
    for line in gate_lines(aggregated, max_p95_ms) {
        println!("{line}");
    }
}

pub fn write_json(path: &Path, profile: ProfileKind, summary: &RunSummary) -> Result<()> {
    let report = JsonReport {
        profile: profile.name(),
        elapsed_secs: summary.elapsed.as_secs_f64(),
        pool: summary.pool,
        aborted_users: summary.aborted_users,
        actions: sorted_actions(summary),
        report: &summary.report,
    };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn print_seed(summary: &SeedSummary) {
    println!("\nSeeding summary");
    println!("===============");
    println!("Users:             {}", summary.users_created);
    println!("Identity accounts: {}", summary.identity_accounts_created);
    println!("Itineraries:       {}", summary.itineraries_created);
    println!("Locations:         {}", summary.locations_created);
    println!("Likes:             {}", summary.likes_created);
    println!("Comments:          {}", summary.comments_created);
    println!("Graph nodes:       {}", summary.graph_nodes_created);
    println!("Weather cached:    {}", summary.weather_cached);

    if !summary.errors.is_empty() {
        let shown = summary.first_errors(SHOWN_ERRORS);
        println!(
            "\n⚠️  {} errors, first {}:",
            summary.errors.len(),
            shown.len()
        );
        for error in shown {
            println!("  - {error}");
        }
    }
}

pub fn print_cleanup(summary: &CleanupSummary) {
    println!("\nCleanup summary");
    println!("===============");
    println!("Seeded users:     {}", summary.users);
    println!("Accounts deleted: {}", summary.accounts_deleted);
    println!("Already gone:     {}", summary.accounts_missing);
    for path in &summary.files_removed {
        println!("Removed:          {}", path.display());
    }
    if !summary.errors.is_empty() {
        println!("\n⚠️  {} errors:", summary.errors.len());
        for error in &summary.errors {
            println!("  - {error}");
        }
    }
}
