//! Reconnection control for persistent streaming connections to an edge
//! configuration service.
//!
//! A transport that holds a long-lived stream open against a remote
//! config/event server reports a [`ConnectionOutcome`] whenever the
//! connection's state changes. [`EdgeRetryer`] decides whether and when to
//! dial again: retry-worthy outcomes are queued for a dedicated worker task
//! that waits out a jittered, growing delay and then invokes the transport's
//! [`Reconnector`]. Credential rejections park the controller permanently.
//!
//! # Features
//!
//! - **Per-outcome base delays**: connect timeouts, transport disconnects,
//!   and graceful server closes each retry on their own schedule
//! - **Jittered exponential backoff**: randomized delays avoid synchronized
//!   retry storms across a fleet of clients; graceful closes retry at a
//!   stable cadence instead of escalating
//! - **Serialized attempts**: a single worker task guarantees at most one
//!   reconnect attempt in flight, in outcome order
//! - **Terminal failure detection**: an invalid API key stops all future
//!   retries for the life of the controller
//! - **Event system**: observability through [`ReconnectEvent`] listeners
//! - **Injectable jitter**: seed the stream or pin it entirely for
//!   deterministic tests
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use edge_reconnect::{
//!     ConnectionOutcome, EdgeRetryer, FnReconnector, ReconnectConfig,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = ReconnectConfig::builder()
//!     .name("edge-client")
//!     .server_disconnect_retry(Duration::from_secs(5))
//!     .maximum_backoff_time(Duration::from_secs(30))
//!     .on_backoff(|delay| println!("next attempt in {:?}", delay))
//!     .build();
//!
//! let retryer = EdgeRetryer::new(config);
//! let reconnector = Arc::new(FnReconnector::new(|| {
//!     // ask the transport for a fresh connection
//! }));
//!
//! retryer.report(ConnectionOutcome::ServerWasDisconnected, reconnector);
//!
//! // ...on session teardown:
//! retryer.close();
//! # }
//! ```

mod backoff;
mod config;
mod events;
mod outcome;
mod retryer;

pub use backoff::{MULTIPLIER_FLOOR, jittered_delay, next_multiplier};
pub use config::{
    ConfigError, ENV_BACKOFF_MULTIPLIER, ENV_MAXIMUM_BACKOFF_MS, ENV_SERVER_BYE_RECONNECT_MS,
    ENV_SERVER_CONNECT_TIMEOUT_MS, ENV_SERVER_DISCONNECT_RETRY_MS, JitterFn, ReconnectConfig,
    ReconnectConfigBuilder,
};
pub use events::{EventListeners, ReconnectEvent};
pub use outcome::{ConnectionOutcome, FnReconnector, Reconnector};
pub use retryer::EdgeRetryer;
