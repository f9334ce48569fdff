// src/http.rs
// Shared HTTP plumbing for discovery and ATS clients: every request is rate
// governed, every response is reported to the Block Monitor, and transport
// errors get a short exponential-backoff retry. Status errors are not
// retried; by the time we see a 4xx/5xx the monitor has already classified
// anything block-shaped.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Response;

use crate::block::{BlockMonitor, NetworkEvent};
use crate::rate::RateGovernor;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_RETRIES: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Build the one client shared by a run: fixed timeout, browser-ish UA,
/// JSON accept header.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .context("building http client")
}

fn event_from_response(resp: &Response) -> NetworkEvent {
    let headers = resp
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    NetworkEvent {
        url: resp.url().to_string(),
        status: resp.status().as_u16(),
        headers,
    }
}

/// GET a JSON document. Transport failures (timeout, connect) are retried
/// with exponential backoff and surface as an error only once retries are
/// exhausted; the caller decides whether that is fatal to anything larger
/// than the one call.
pub async fn get_json(
    http: &reqwest::Client,
    governor: &RateGovernor,
    monitor: &BlockMonitor,
    url: &str,
) -> Result<serde_json::Value> {
    let mut attempt = 0u32;
    let resp = loop {
        governor.wait().await;
        match http.get(url).header("Accept", "application/json").send().await {
            Ok(resp) => break resp,
            Err(e) if attempt < MAX_RETRIES => {
                let delay = RETRY_BASE_DELAY_MS << attempt;
                attempt += 1;
                tracing::warn!(error = ?e, url, attempt, "transport error, retrying");
                metrics::counter!("http_retries_total").increment(1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => {
                metrics::counter!("http_errors_total").increment(1);
                return Err(e).with_context(|| format!("GET {url}"));
            }
        }
    };

    monitor.observe(&event_from_response(&resp));

    let status = resp.status();
    if !status.is_success() {
        metrics::counter!("http_errors_total").increment(1);
        bail!("GET {url} returned {status}");
    }

    resp.json::<serde_json::Value>()
        .await
        .with_context(|| format!("decoding JSON from {url}"))
}
