// tests/block_monitor.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use job_harvester::block::{block_reason_from_url, classify_response};
use job_harvester::{BlockMonitor, BlockReason, NetworkEvent};

#[test]
fn url_classification_table() {
    assert_eq!(block_reason_from_url("https://x.com/login"), Some(BlockReason::LoginRequired));
    assert_eq!(block_reason_from_url("https://x.com/authwall"), Some(BlockReason::Authwall));
    assert_eq!(
        block_reason_from_url("https://x.com/checkpoint/challenge"),
        Some(BlockReason::Checkpoint)
    );
    assert_eq!(block_reason_from_url("https://x.com/jobs/search"), None);
}

#[test]
fn status_classification_has_priority() {
    assert_eq!(classify_response(429, "https://x.com/jobs"), Some(BlockReason::RateLimited));
    assert_eq!(classify_response(401, "https://x.com/jobs"), Some(BlockReason::LoginRequired));
    assert_eq!(classify_response(403, "https://x.com/jobs"), Some(BlockReason::LoginRequired));
    assert_eq!(
        classify_response(200, "https://x.com/security-verification"),
        Some(BlockReason::CaptchaDetected)
    );
}

#[test]
fn first_classified_event_wins_and_callback_is_idempotent() {
    let monitor = BlockMonitor::new();
    let seen: Arc<Mutex<Vec<BlockReason>>> = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let seen = seen.clone();
        let calls = calls.clone();
        monitor.set_block_callback(move |reason| {
            seen.lock().unwrap().push(reason);
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }

    monitor.observe(&NetworkEvent::new("https://x.com/jobs/search", 200));
    monitor.observe(&NetworkEvent::new("https://x.com/checkpoint", 200));
    monitor.observe(&NetworkEvent::new("https://x.com/login", 200));

    assert!(monitor.is_tripped());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen.lock().unwrap(), vec![BlockReason::Checkpoint]);
    assert_eq!(monitor.requests_observed(), 3);
}
