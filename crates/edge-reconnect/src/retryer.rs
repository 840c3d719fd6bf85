//! The reconnect controller: outcome dispatch and the single reconnect worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

#[cfg(feature = "metrics")]
use std::sync::Once;

use crate::backoff;
use crate::config::ReconnectConfig;
use crate::events::ReconnectEvent;
use crate::outcome::{ConnectionOutcome, Reconnector};

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

#[cfg(feature = "metrics")]
fn register_metrics() {
    METRICS_INIT.call_once(|| {
        metrics::describe_counter!(
            "edge_reconnect_scheduled_total",
            "Reconnect jobs queued by outcome dispatch"
        );
        metrics::describe_counter!(
            "edge_reconnect_attempts_total",
            "Reconnect attempts handed to the transport"
        );
        metrics::describe_counter!(
            "edge_reconnect_terminal_total",
            "Terminal credential failures observed"
        );
        metrics::describe_gauge!(
            "edge_reconnect_backoff_multiplier",
            "Current backoff multiplier"
        );
    });
}

/// One queued reconnect attempt.
struct ReconnectJob {
    base_delay: Duration,
    adjust_backoff: bool,
    reconnector: Arc<dyn Reconnector>,
}

/// State shared between reporting callers and the worker task.
struct Shared {
    current_backoff_multiplier: AtomicU32,
    terminal_failure: AtomicBool,
    closed: AtomicBool,
}

/// Reconnection controller for a persistent streaming connection to an edge
/// configuration service.
///
/// The transport reports a [`ConnectionOutcome`] whenever its connection
/// state changes; outcomes that warrant a retry queue a job for a dedicated
/// worker task, which waits out a jittered, exponentially-growing delay and
/// then asks the supplied [`Reconnector`] to dial again. At most one attempt
/// is ever in flight, and attempts run in the order their outcomes arrived.
///
/// [`report`](EdgeRetryer::report) never blocks and may be called from any
/// task or thread. A fatal credential rejection parks the controller
/// permanently; [`close`](EdgeRetryer::close) tears the worker down,
/// abandoning queued and in-progress work. Dropping the controller instead
/// lets already-queued attempts drain before the worker exits.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use edge_reconnect::{
///     ConnectionOutcome, EdgeRetryer, FnReconnector, ReconnectConfig,
/// };
///
/// # #[tokio::main]
/// # async fn main() {
/// let retryer = EdgeRetryer::new(ReconnectConfig::builder().name("edge-client").build());
/// let reconnector = Arc::new(FnReconnector::new(|| {
///     // ask the transport to dial a fresh connection
/// }));
///
/// retryer.report(ConnectionOutcome::ServerWasDisconnected, reconnector);
/// # }
/// ```
pub struct EdgeRetryer {
    config: Arc<ReconnectConfig>,
    shared: Arc<Shared>,
    jobs: UnboundedSender<ReconnectJob>,
    worker: JoinHandle<()>,
}

impl EdgeRetryer {
    /// Creates a controller and spawns its worker task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(config: ReconnectConfig) -> Self {
        #[cfg(feature = "metrics")]
        register_metrics();

        let config = Arc::new(config);
        let shared = Arc::new(Shared {
            current_backoff_multiplier: AtomicU32::new(config.backoff_multiplier),
            terminal_failure: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        });

        let (jobs, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(rx, Arc::clone(&config), Arc::clone(&shared)));

        Self {
            config,
            shared,
            jobs,
            worker,
        }
    }

    /// Dispatches a connection outcome.
    ///
    /// Silently ignored once the controller is terminal or closed. Never
    /// blocks: retry-worthy outcomes only enqueue work for the worker.
    pub fn report(&self, outcome: ConnectionOutcome, reconnector: Arc<dyn Reconnector>) {
        if self.shared.terminal_failure.load(Ordering::Acquire)
            || self.shared.closed.load(Ordering::Acquire)
        {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(name = %self.config.name, outcome = ?outcome, "retryer triggered");

        match outcome {
            ConnectionOutcome::Success => {
                let multiplier = self.config.backoff_multiplier;
                self.shared
                    .current_backoff_multiplier
                    .store(multiplier, Ordering::Release);

                #[cfg(feature = "metrics")]
                metrics::gauge!(
                    "edge_reconnect_backoff_multiplier",
                    "name" => self.config.name.clone()
                )
                .set(f64::from(multiplier));

                self.config.event_listeners.emit(&ReconnectEvent::BackoffReset {
                    name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    multiplier,
                });
            }
            ConnectionOutcome::ApiKeyNotFound => {
                self.shared.terminal_failure.store(true, Ordering::Release);

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    name = %self.config.name,
                    "terminal failure connecting to edge server, API key does not exist"
                );

                #[cfg(feature = "metrics")]
                metrics::counter!(
                    "edge_reconnect_terminal_total",
                    "name" => self.config.name.clone()
                )
                .increment(1);

                self.config
                    .event_listeners
                    .emit(&ReconnectEvent::TerminalFailure {
                        name: self.config.name.clone(),
                        timestamp: Instant::now(),
                    });
            }
            ConnectionOutcome::ServerWasDisconnected => {
                self.schedule(self.config.server_disconnect_retry, true, outcome, reconnector)
            }
            ConnectionOutcome::ServerSaidBye => {
                self.schedule(self.config.server_bye_reconnect, false, outcome, reconnector)
            }
            ConnectionOutcome::ServerConnectTimeout => {
                self.schedule(self.config.server_connect_timeout, true, outcome, reconnector)
            }
            // Outcomes added by future transports fall through to a no-op.
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }

    fn schedule(
        &self,
        base_delay: Duration,
        adjust_backoff: bool,
        outcome: ConnectionOutcome,
        reconnector: Arc<dyn Reconnector>,
    ) {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            name = %self.config.name,
            outcome = ?outcome,
            "scheduling reconnect"
        );

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "edge_reconnect_scheduled_total",
            "name" => self.config.name.clone()
        )
        .increment(1);

        self.config.event_listeners.emit(&ReconnectEvent::Scheduled {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
            outcome,
        });

        // Fails only when the worker is gone, and close() already gates that.
        let _ = self.jobs.send(ReconnectJob {
            base_delay,
            adjust_backoff,
            reconnector,
        });
    }

    /// Shuts the controller down, abandoning queued and in-progress work.
    ///
    /// An in-progress delay is interrupted rather than waited out, and the
    /// pending attempt is discarded. Idempotent; subsequent
    /// [`report`](EdgeRetryer::report) calls are no-ops.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.worker.abort();

        #[cfg(feature = "tracing")]
        tracing::trace!(name = %self.config.name, "retryer closed");

        self.config.event_listeners.emit(&ReconnectEvent::Closed {
            name: self.config.name.clone(),
            timestamp: Instant::now(),
        });
    }

    /// Returns the multiplier the next growth-enabled attempt will use.
    pub fn current_backoff_multiplier(&self) -> u32 {
        self.shared
            .current_backoff_multiplier
            .load(Ordering::Acquire)
    }

    /// Returns true once the server has rejected the credential.
    pub fn is_terminal(&self) -> bool {
        self.shared.terminal_failure.load(Ordering::Acquire)
    }

    /// Returns true once [`close`](EdgeRetryer::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Returns a reference to the controller configuration.
    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }
}

/// Drains reconnect jobs one at a time: wait out the jittered delay, grow the
/// multiplier when asked, then hand control to the transport's reconnector.
async fn run_worker(
    mut jobs: UnboundedReceiver<ReconnectJob>,
    config: Arc<ReconnectConfig>,
    shared: Arc<Shared>,
) {
    while let Some(job) = jobs.recv().await {
        let multiplier = shared.current_backoff_multiplier.load(Ordering::Acquire);
        let delay = backoff::jittered_delay(
            job.base_delay,
            multiplier,
            config.maximum_backoff_time,
            (config.jitter)(),
        );

        #[cfg(feature = "tracing")]
        tracing::trace!(name = %config.name, delay_ms = delay.as_millis() as u64, "backing off");

        config.event_listeners.emit(&ReconnectEvent::Backoff {
            name: config.name.clone(),
            timestamp: Instant::now(),
            delay,
        });

        tokio::time::sleep(delay).await;

        if job.adjust_backoff {
            let grown = backoff::next_multiplier(
                shared.current_backoff_multiplier.load(Ordering::Acquire),
                (config.jitter)(),
            );
            shared
                .current_backoff_multiplier
                .store(grown, Ordering::Release);

            #[cfg(feature = "metrics")]
            metrics::gauge!(
                "edge_reconnect_backoff_multiplier",
                "name" => config.name.clone()
            )
            .set(f64::from(grown));
        }

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "edge_reconnect_attempts_total",
            "name" => config.name.clone()
        )
        .increment(1);

        config.event_listeners.emit(&ReconnectEvent::Reconnecting {
            name: config.name.clone(),
            timestamp: Instant::now(),
        });

        job.reconnector.reconnect();
    }
}
