//! Deterministic jitter example.
//!
//! Run with: cargo run --example deterministic_jitter -p edge-reconnect
//!
//! The controller's randomness is injectable: seed the jitter stream for
//! reproducible runs, or pin it to a constant to make every delay exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use edge_reconnect::{ConnectionOutcome, EdgeRetryer, FnReconnector, ReconnectConfig, Reconnector};

#[tokio::main]
async fn main() {
    println!("Edge Reconnect Controller - Deterministic Jitter\n");

    // A constant draw of 0.5 makes each delay base + round(1.5 * multiplier).
    let config = ReconnectConfig::builder()
        .name("pinned-jitter")
        .server_disconnect_retry(Duration::from_millis(100))
        .backoff_multiplier(10)
        .maximum_backoff_time(Duration::from_secs(1))
        .jitter_fn(|| 0.5)
        .on_backoff(|delay| println!("  pinned delay: {:?}", delay))
        .build();

    let retryer = EdgeRetryer::new(config);

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let reconnector: Arc<dyn Reconnector> = Arc::new(FnReconnector::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    for _ in 0..3 {
        retryer.report(
            ConnectionOutcome::ServerWasDisconnected,
            Arc::clone(&reconnector),
        );
    }
    while attempts.load(Ordering::SeqCst) < 3 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Seeded jitter: same seed, same delays, run after run.
    let seeded = ReconnectConfig::builder()
        .name("seeded-jitter")
        .server_disconnect_retry(Duration::from_millis(100))
        .seed(42)
        .on_backoff(|delay| println!("  seeded delay: {:?}", delay))
        .build();

    println!("\nSeeded stream (stable across runs):");
    let retryer2 = EdgeRetryer::new(seeded);
    let counter = Arc::clone(&attempts);
    let reconnector2 = Arc::new(FnReconnector::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    retryer2.report(ConnectionOutcome::ServerWasDisconnected, reconnector2);
    while attempts.load(Ordering::SeqCst) < 4 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    retryer.close();
    retryer2.close();
}
