// src/block.rs
// Block Monitor: watches every network exchange the run makes and flips the
// run to "blocked" the moment an access-denial signature shows up. Detection
// is a state transition, not an exception; callers poll at checkpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::BlockReason;

/// One observed network exchange. Every component doing network I/O must
/// report one of these per response; it is the only mandatory
/// instrumentation hook.
#[derive(Debug, Clone)]
pub struct NetworkEvent {
    pub url: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
}

impl NetworkEvent {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            headers: HashMap::new(),
        }
    }
}

/// URL signatures in classification order. Checkpoint patterns come before
/// captcha so `/checkpoint/challenge` classifies as CHECKPOINT.
static BLOCK_URL_PATTERNS: Lazy<Vec<(BlockReason, Vec<Regex>)>> = Lazy::new(|| {
    let table: [(BlockReason, &[&str]); 4] = [
        (
            BlockReason::LoginRequired,
            &[r"/login", r"/signin", r"/sign-in", r"/uas/login"],
        ),
        (BlockReason::Authwall, &[r"/authwall", r"/auth-wall"]),
        (
            BlockReason::Checkpoint,
            &[r"/checkpoint", r"/security-check"],
        ),
        (
            BlockReason::CaptchaDetected,
            &[
                r"/captcha",
                r"/challenge",
                r"/security-verification",
                r"^https?://challenge\.",
            ],
        ),
    ];
    table
        .into_iter()
        .map(|(reason, pats)| {
            let compiled = pats.iter().map(|p| Regex::new(p).expect("block pattern")).collect();
            (reason, compiled)
        })
        .collect()
});

/// Classify a URL against the block signature table. `None` means the URL
/// carries no denial signal.
pub fn block_reason_from_url(url: &str) -> Option<BlockReason> {
    let url = url.to_lowercase();
    for (reason, patterns) in BLOCK_URL_PATTERNS.iter() {
        if patterns.iter().any(|p| p.is_match(&url)) {
            return Some(*reason);
        }
    }
    None
}

/// Classify a full response. Status codes outrank URL signatures: 429 is
/// rate limiting, 401/403 a login wall, regardless of path.
pub fn classify_response(status: u16, url: &str) -> Option<BlockReason> {
    match status {
        429 => Some(BlockReason::RateLimited),
        401 | 403 => Some(BlockReason::LoginRequired),
        _ => block_reason_from_url(url),
    }
}

type BlockCallback = Arc<dyn Fn(BlockReason) + Send + Sync>;

/// Shared watcher over all network traffic in a run. The monitor never holds
/// run state; on the first classified event it invokes the registered
/// callback exactly once and stays tripped for the rest of the run.
#[derive(Default)]
pub struct BlockMonitor {
    tripped: AtomicBool,
    observed: AtomicU64,
    on_block: RwLock<Option<BlockCallback>>,
}

impl BlockMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the single on-block callback. Later registrations replace
    /// earlier ones; the exactly-once guarantee is per run, not per callback.
    pub fn set_block_callback(&self, callback: impl Fn(BlockReason) + Send + Sync + 'static) {
        let mut slot = self.on_block.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(callback));
    }

    /// Inspect one network exchange. Unclassified events are counted and
    /// ignored; the first classified event trips the monitor.
    pub fn observe(&self, event: &NetworkEvent) {
        self.observed.fetch_add(1, Ordering::Relaxed);

        let Some(reason) = classify_response(event.status, &event.url) else {
            return;
        };
        // swap returns the previous value: only the first classified event
        // gets to run the callback.
        if self.tripped.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::warn!(url = %event.url, status = event.status, reason = %reason, "block detected");
        metrics::counter!("pipeline_blocks_total").increment(1);
        let cb = {
            let slot = self.on_block.read().unwrap_or_else(|e| e.into_inner());
            slot.clone()
        };
        if let Some(cb) = cb {
            cb(reason);
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Total exchanges observed, classified or not.
    pub fn requests_observed(&self) -> u64 {
        self.observed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn url_table_classifies_denial_paths() {
        assert_eq!(
            block_reason_from_url("https://x.com/login"),
            Some(BlockReason::LoginRequired)
        );
        assert_eq!(
            block_reason_from_url("https://x.com/authwall"),
            Some(BlockReason::Authwall)
        );
        assert_eq!(
            block_reason_from_url("https://x.com/checkpoint/challenge"),
            Some(BlockReason::Checkpoint)
        );
        assert_eq!(
            block_reason_from_url("https://challenge.surface.example/c/42"),
            Some(BlockReason::CaptchaDetected)
        );
        assert_eq!(block_reason_from_url("https://x.com/jobs/search"), None);
    }

    #[test]
    fn status_outranks_url() {
        assert_eq!(
            classify_response(429, "https://x.com/jobs/search"),
            Some(BlockReason::RateLimited)
        );
        assert_eq!(
            classify_response(403, "https://x.com/captcha"),
            Some(BlockReason::LoginRequired)
        );
        assert_eq!(classify_response(200, "https://x.com/jobs/search"), None);
    }

    #[test]
    fn callback_fires_once() {
        let monitor = BlockMonitor::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        monitor.set_block_callback(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        monitor.observe(&NetworkEvent::new("https://x.com/jobs/search", 200));
        assert!(!monitor.is_tripped());

        monitor.observe(&NetworkEvent::new("https://x.com/authwall", 200));
        monitor.observe(&NetworkEvent::new("https://x.com/login", 200));
        monitor.observe(&NetworkEvent::new("https://x.com/anything", 429));

        assert!(monitor.is_tripped());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.requests_observed(), 4);
    }
}
