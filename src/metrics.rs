// src/metrics.rs
use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration so series carry descriptions wherever a
/// recorder is installed. The library itself installs no recorder; that is
/// the embedding application's choice.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "pipeline_discovered_total",
            "Candidates consumed from the discovery surface."
        );
        describe_counter!(
            "discovery_candidates_total",
            "Candidates extracted from captured discovery payloads."
        );
        describe_counter!(
            "pipeline_dedup_total",
            "Postings discarded by the identity index as duplicates."
        );
        describe_counter!(
            "pipeline_fetch_failures_total",
            "Per-company ATS fetches that raised or returned nothing."
        );
        describe_counter!("pipeline_blocks_total", "Access-denial signatures observed.");
        describe_counter!("http_retries_total", "Transport errors retried with backoff.");
        describe_counter!("http_errors_total", "Requests failed after retries or bad status.");
        describe_histogram!("ats_fetch_ms", "Per-company ATS fetch time in milliseconds.");
    });
}
