use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use edge_reconnect::{ConnectionOutcome, EdgeRetryer, ReconnectConfig, Reconnector};

/// Instrumented reconnector that counts how often the transport is asked to
/// dial.
struct CountingReconnector {
    calls: AtomicUsize,
}

impl CountingReconnector {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Reconnector for CountingReconnector {
    fn reconnect(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 2s");
}

fn fast_config() -> ReconnectConfig {
    ReconnectConfig::builder()
        .server_connect_timeout(Duration::from_millis(5))
        .server_disconnect_retry(Duration::from_millis(5))
        .server_bye_reconnect(Duration::from_millis(2))
        .backoff_multiplier(4)
        .maximum_backoff_time(Duration::from_millis(100))
        .jitter_fn(|| 0.5)
        .build()
}

#[tokio::test]
async fn terminal_failure_suppresses_all_future_outcomes() {
    let retryer = EdgeRetryer::new(fast_config());
    let reconnector = CountingReconnector::new();

    retryer.report(
        ConnectionOutcome::ApiKeyNotFound,
        Arc::clone(&reconnector) as Arc<dyn Reconnector>,
    );
    assert!(retryer.is_terminal());

    for outcome in [
        ConnectionOutcome::ServerWasDisconnected,
        ConnectionOutcome::ServerSaidBye,
        ConnectionOutcome::ServerConnectTimeout,
        ConnectionOutcome::Success,
        ConnectionOutcome::ApiKeyNotFound,
    ] {
        retryer.report(outcome, Arc::clone(&reconnector) as Arc<dyn Reconnector>);
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(reconnector.calls(), 0);
    assert_eq!(
        retryer.current_backoff_multiplier(),
        retryer.config().backoff_multiplier()
    );
}

#[tokio::test]
async fn success_restores_the_configured_multiplier() {
    let retryer = EdgeRetryer::new(fast_config());
    let reconnector = CountingReconnector::new();

    for expected in 1..=3 {
        retryer.report(
            ConnectionOutcome::ServerWasDisconnected,
            Arc::clone(&reconnector) as Arc<dyn Reconnector>,
        );
        wait_until(|| reconnector.calls() == expected).await;
    }
    assert!(retryer.current_backoff_multiplier() > 4);

    retryer.report(
        ConnectionOutcome::Success,
        Arc::clone(&reconnector) as Arc<dyn Reconnector>,
    );
    assert_eq!(retryer.current_backoff_multiplier(), 4);
}

#[tokio::test]
async fn bye_reports_never_touch_the_multiplier() {
    let retryer = EdgeRetryer::new(fast_config());
    let reconnector = CountingReconnector::new();

    for expected in 1..=4 {
        retryer.report(
            ConnectionOutcome::ServerSaidBye,
            Arc::clone(&reconnector) as Arc<dyn Reconnector>,
        );
        wait_until(|| reconnector.calls() == expected).await;
        assert_eq!(retryer.current_backoff_multiplier(), 4);
    }
}

#[tokio::test]
async fn repeated_failures_respect_floor_and_ceiling() {
    let delays: Arc<Mutex<Vec<Duration>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delays);

    // Default thread-local jitter: the bounds must hold for any draw.
    let config = ReconnectConfig::builder()
        .server_disconnect_retry(Duration::from_millis(5))
        .backoff_multiplier(4)
        .maximum_backoff_time(Duration::from_millis(40))
        .on_backoff(move |delay| sink.lock().unwrap().push(delay))
        .build();

    let retryer = EdgeRetryer::new(config);
    let reconnector = CountingReconnector::new();

    for expected in 1..=6 {
        retryer.report(
            ConnectionOutcome::ServerWasDisconnected,
            Arc::clone(&reconnector) as Arc<dyn Reconnector>,
        );
        wait_until(|| reconnector.calls() == expected).await;
        assert!(retryer.current_backoff_multiplier() >= 3);
    }

    let delays = delays.lock().unwrap();
    assert_eq!(delays.len(), 6);
    for delay in delays.iter() {
        assert!(*delay >= Duration::from_millis(5));
        assert!(*delay <= Duration::from_millis(40));
    }
}

#[tokio::test]
async fn close_then_report_is_a_silent_no_op() {
    let retryer = EdgeRetryer::new(fast_config());
    let reconnector = CountingReconnector::new();

    retryer.close();
    retryer.close(); // idempotent

    retryer.report(
        ConnectionOutcome::ServerConnectTimeout,
        Arc::clone(&reconnector) as Arc<dyn Reconnector>,
    );
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(retryer.is_closed());
    assert_eq!(reconnector.calls(), 0);
}

#[tokio::test]
async fn close_interrupts_an_in_progress_delay() {
    let config = ReconnectConfig::builder()
        .server_disconnect_retry(Duration::from_secs(30))
        .backoff_multiplier(4)
        .maximum_backoff_time(Duration::from_secs(60))
        .jitter_fn(|| 0.5)
        .build();

    let retryer = EdgeRetryer::new(config);
    let reconnector = CountingReconnector::new();

    retryer.report(
        ConnectionOutcome::ServerWasDisconnected,
        Arc::clone(&reconnector) as Arc<dyn Reconnector>,
    );
    tokio::time::sleep(Duration::from_millis(20)).await;

    // The worker is mid-sleep on a 30s delay; close must not wait it out.
    retryer.close();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(reconnector.calls(), 0);
}

/// Three connect timeouts with tunables (100, 100, 50, 10, 1000): every
/// computed delay stays within `[100, 1000]` ms and the multiplier after the
/// third attempt exceeds its value after the first.
#[tokio::test]
async fn connect_timeout_scenario_grows_backoff_within_bounds() {
    let delays: Arc<Mutex<Vec<Duration>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delays);

    let config = ReconnectConfig::builder()
        .server_connect_timeout(Duration::from_millis(100))
        .server_disconnect_retry(Duration::from_millis(100))
        .server_bye_reconnect(Duration::from_millis(50))
        .backoff_multiplier(10)
        .maximum_backoff_time(Duration::from_millis(1000))
        .jitter_fn(|| 0.5)
        .on_backoff(move |delay| sink.lock().unwrap().push(delay))
        .build();

    let retryer = EdgeRetryer::new(config);
    let reconnector = CountingReconnector::new();

    retryer.report(
        ConnectionOutcome::ServerConnectTimeout,
        Arc::clone(&reconnector) as Arc<dyn Reconnector>,
    );
    wait_until(|| reconnector.calls() == 1).await;
    let after_first = retryer.current_backoff_multiplier();

    for expected in 2..=3 {
        retryer.report(
            ConnectionOutcome::ServerConnectTimeout,
            Arc::clone(&reconnector) as Arc<dyn Reconnector>,
        );
        wait_until(|| reconnector.calls() == expected).await;
    }
    let after_third = retryer.current_backoff_multiplier();

    let delays = delays.lock().unwrap();
    assert_eq!(delays.len(), 3);
    for delay in delays.iter() {
        assert!(*delay >= Duration::from_millis(100));
        assert!(*delay <= Duration::from_millis(1000));
    }
    assert!(after_third > after_first);
}

#[tokio::test]
async fn events_carry_the_instance_name() {
    let names: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&names);

    let config = ReconnectConfig::builder()
        .name("session-7")
        .server_bye_reconnect(Duration::from_millis(2))
        .backoff_multiplier(0)
        .jitter_fn(|| 0.0)
        .on_event(move |event| sink.lock().unwrap().push(event.name().to_string()))
        .build();

    let retryer = EdgeRetryer::new(config);
    let reconnector = CountingReconnector::new();

    retryer.report(
        ConnectionOutcome::ServerSaidBye,
        Arc::clone(&reconnector) as Arc<dyn Reconnector>,
    );
    wait_until(|| reconnector.calls() == 1).await;

    let names = names.lock().unwrap();
    assert!(!names.is_empty());
    assert!(names.iter().all(|name| name == "session-7"));
}
