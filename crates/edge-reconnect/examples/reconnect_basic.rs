//! Basic reconnect controller example with a simulated transport.
//!
//! Run with: cargo run --example reconnect_basic -p edge-reconnect
//!
//! This example drives the controller with a scripted sequence of connection
//! outcomes and prints each backoff delay as it is computed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use edge_reconnect::{ConnectionOutcome, EdgeRetryer, FnReconnector, ReconnectConfig, Reconnector};

#[tokio::main]
async fn main() {
    println!("Edge Reconnect Controller - Basic Example\n");

    let config = ReconnectConfig::builder()
        .name("example-client")
        .server_connect_timeout(Duration::from_millis(100))
        .server_disconnect_retry(Duration::from_millis(100))
        .server_bye_reconnect(Duration::from_millis(50))
        .backoff_multiplier(10)
        .maximum_backoff_time(Duration::from_secs(1))
        .on_backoff(|delay| println!("  backing off for {:?}", delay))
        .build();

    println!("Configuration:");
    println!("  Disconnect retry base: 100ms");
    println!("  Bye reconnect base:    50ms");
    println!("  Maximum backoff:       1s\n");

    let retryer = EdgeRetryer::new(config);

    // A stand-in for the transport: counts the dial attempts it is asked for.
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let reconnector: Arc<dyn Reconnector> = Arc::new(FnReconnector::new(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        println!("  transport dialing (attempt {})", n);
    }));

    println!("Simulating three transport disconnects:");
    for _ in 0..3 {
        retryer.report(
            ConnectionOutcome::ServerWasDisconnected,
            Arc::clone(&reconnector),
        );
    }

    // Attempts are serialized on the controller's worker; give them time to drain.
    while attempts.load(Ordering::SeqCst) < 3 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    println!(
        "\nBackoff multiplier after repeated failures: {}",
        retryer.current_backoff_multiplier()
    );

    println!("\nReporting a successful connection:");
    retryer.report(ConnectionOutcome::Success, Arc::clone(&reconnector));
    println!(
        "Backoff multiplier reset to: {}",
        retryer.current_backoff_multiplier()
    );

    retryer.close();
    println!("\nController closed.");
}
