//! Configuration for the reconnect controller.

use std::env;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::events::{EventListeners, ReconnectEvent};

/// Draws the uniform `[0, 1)` value used to randomize delays and multiplier
/// growth.
pub type JitterFn = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Environment variable for the connect-timeout base delay, in milliseconds.
pub const ENV_SERVER_CONNECT_TIMEOUT_MS: &str = "EDGE_SERVER_CONNECT_TIMEOUT_MS";
/// Environment variable for the disconnect-retry base delay, in milliseconds.
pub const ENV_SERVER_DISCONNECT_RETRY_MS: &str = "EDGE_SERVER_DISCONNECT_RETRY_MS";
/// Environment variable for the graceful-close reconnect base delay, in milliseconds.
pub const ENV_SERVER_BYE_RECONNECT_MS: &str = "EDGE_SERVER_BYE_RECONNECT_MS";
/// Environment variable for the starting backoff multiplier.
pub const ENV_BACKOFF_MULTIPLIER: &str = "EDGE_BACKOFF_MULTIPLIER";
/// Environment variable for the delay ceiling, in milliseconds.
pub const ENV_MAXIMUM_BACKOFF_MS: &str = "EDGE_MAXIMUM_BACKOFF_MS";

const DEFAULT_SERVER_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_SERVER_DISCONNECT_RETRY: Duration = Duration::from_millis(5000);
const DEFAULT_SERVER_BYE_RECONNECT: Duration = Duration::from_millis(3000);
const DEFAULT_BACKOFF_MULTIPLIER: u32 = 10;
const DEFAULT_MAXIMUM_BACKOFF_TIME: Duration = Duration::from_millis(30000);

/// Errors produced while resolving configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but did not parse as an integer.
    #[error("invalid value for {name}: {value:?}")]
    InvalidTunable {
        /// The environment variable that failed to parse.
        name: &'static str,
        /// The raw value found in the environment.
        value: String,
    },
}

/// Configuration for [`EdgeRetryer`](crate::EdgeRetryer).
///
/// Base delays are chosen per connection outcome; the multiplier and ceiling
/// shape how delays escalate across repeated failures.
pub struct ReconnectConfig {
    pub(crate) name: String,
    pub(crate) server_connect_timeout: Duration,
    pub(crate) server_disconnect_retry: Duration,
    pub(crate) server_bye_reconnect: Duration,
    pub(crate) backoff_multiplier: u32,
    pub(crate) maximum_backoff_time: Duration,
    pub(crate) jitter: JitterFn,
    pub(crate) event_listeners: EventListeners,
}

impl Clone for ReconnectConfig {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            server_connect_timeout: self.server_connect_timeout,
            server_disconnect_retry: self.server_disconnect_retry,
            server_bye_reconnect: self.server_bye_reconnect,
            backoff_multiplier: self.backoff_multiplier,
            maximum_backoff_time: self.maximum_backoff_time,
            jitter: Arc::clone(&self.jitter),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl std::fmt::Debug for ReconnectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectConfig")
            .field("name", &self.name)
            .field("server_connect_timeout", &self.server_connect_timeout)
            .field("server_disconnect_retry", &self.server_disconnect_retry)
            .field("server_bye_reconnect", &self.server_bye_reconnect)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("maximum_backoff_time", &self.maximum_backoff_time)
            .field("event_listeners", &self.event_listeners.len())
            .finish()
    }
}

impl ReconnectConfig {
    /// Creates a new builder with default tunables.
    pub fn builder() -> ReconnectConfigBuilder {
        ReconnectConfigBuilder::new()
    }

    /// Returns the instance name used in events, logs, and metrics labels.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the base delay after a connect timeout.
    pub fn server_connect_timeout(&self) -> Duration {
        self.server_connect_timeout
    }

    /// Returns the base delay after a transport-level disconnect.
    pub fn server_disconnect_retry(&self) -> Duration {
        self.server_disconnect_retry
    }

    /// Returns the base delay after a graceful server close.
    pub fn server_bye_reconnect(&self) -> Duration {
        self.server_bye_reconnect
    }

    /// Returns the starting backoff multiplier.
    pub fn backoff_multiplier(&self) -> u32 {
        self.backoff_multiplier
    }

    /// Returns the ceiling applied to every computed delay.
    pub fn maximum_backoff_time(&self) -> Duration {
        self.maximum_backoff_time
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ReconnectConfig`].
pub struct ReconnectConfigBuilder {
    name: String,
    server_connect_timeout: Duration,
    server_disconnect_retry: Duration,
    server_bye_reconnect: Duration,
    backoff_multiplier: u32,
    maximum_backoff_time: Duration,
    jitter: Option<JitterFn>,
    event_listeners: EventListeners,
}

impl std::fmt::Debug for ReconnectConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectConfigBuilder")
            .field("name", &self.name)
            .field("server_connect_timeout", &self.server_connect_timeout)
            .field("server_disconnect_retry", &self.server_disconnect_retry)
            .field("server_bye_reconnect", &self.server_bye_reconnect)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("maximum_backoff_time", &self.maximum_backoff_time)
            .field("event_listeners", &self.event_listeners.len())
            .finish()
    }
}

impl Default for ReconnectConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectConfigBuilder {
    /// Creates a new builder with default settings.
    ///
    /// Defaults:
    /// - server_connect_timeout: 5000 ms
    /// - server_disconnect_retry: 5000 ms
    /// - server_bye_reconnect: 3000 ms
    /// - backoff_multiplier: 10
    /// - maximum_backoff_time: 30000 ms
    /// - name: `"<unnamed>"`
    /// - jitter: thread-local RNG
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            server_connect_timeout: DEFAULT_SERVER_CONNECT_TIMEOUT,
            server_disconnect_retry: DEFAULT_SERVER_DISCONNECT_RETRY,
            server_bye_reconnect: DEFAULT_SERVER_BYE_RECONNECT,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            maximum_backoff_time: DEFAULT_MAXIMUM_BACKOFF_TIME,
            jitter: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Creates a builder seeded from the environment.
    ///
    /// Each tunable is read from its `EDGE_*` environment variable when set,
    /// falling back to the default otherwise. A variable that is set but does
    /// not parse as a non-negative integer is an error rather than a silent
    /// fallback.
    ///
    /// # Example
    ///
    /// ```
    /// use edge_reconnect::ReconnectConfigBuilder;
    ///
    /// let config = ReconnectConfigBuilder::from_env()
    ///     .expect("EDGE_* variables should hold integers")
    ///     .name("edge-client")
    ///     .build();
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::new();
        if let Some(ms) = env_var::<u64>(ENV_SERVER_CONNECT_TIMEOUT_MS)? {
            builder.server_connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_var::<u64>(ENV_SERVER_DISCONNECT_RETRY_MS)? {
            builder.server_disconnect_retry = Duration::from_millis(ms);
        }
        if let Some(ms) = env_var::<u64>(ENV_SERVER_BYE_RECONNECT_MS)? {
            builder.server_bye_reconnect = Duration::from_millis(ms);
        }
        if let Some(multiplier) = env_var::<u32>(ENV_BACKOFF_MULTIPLIER)? {
            builder.backoff_multiplier = multiplier;
        }
        if let Some(ms) = env_var::<u64>(ENV_MAXIMUM_BACKOFF_MS)? {
            builder.maximum_backoff_time = Duration::from_millis(ms);
        }
        Ok(builder)
    }

    /// Sets the instance name used in events, logs, and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the base delay after a connect timeout.
    pub fn server_connect_timeout(mut self, delay: Duration) -> Self {
        self.server_connect_timeout = delay;
        self
    }

    /// Sets the base delay after a transport-level disconnect.
    pub fn server_disconnect_retry(mut self, delay: Duration) -> Self {
        self.server_disconnect_retry = delay;
        self
    }

    /// Sets the base delay after a graceful server close.
    pub fn server_bye_reconnect(mut self, delay: Duration) -> Self {
        self.server_bye_reconnect = delay;
        self
    }

    /// Sets the starting backoff multiplier.
    pub fn backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the ceiling applied to every computed delay.
    pub fn maximum_backoff_time(mut self, max: Duration) -> Self {
        self.maximum_backoff_time = max;
        self
    }

    /// Draws jitter from a deterministic stream seeded with `seed`.
    ///
    /// Useful for reproducible tests and simulations.
    ///
    /// # Example
    ///
    /// ```
    /// use edge_reconnect::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::builder().seed(42).build();
    /// ```
    pub fn seed(self, seed: u64) -> Self {
        let rng = Mutex::new(StdRng::seed_from_u64(seed));
        self.jitter_fn(move || rng.lock().unwrap().random::<f64>())
    }

    /// Sets a custom jitter source returning draws in `[0, 1)`.
    ///
    /// A constant closure pins every delay exactly:
    ///
    /// ```
    /// use edge_reconnect::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::builder().jitter_fn(|| 0.5).build();
    /// ```
    pub fn jitter_fn<F>(mut self, f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.jitter = Some(Arc::new(f));
        self
    }

    /// Registers a listener for every [`ReconnectEvent`].
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ReconnectEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(f);
        self
    }

    /// Registers a callback invoked with each computed attempt delay, before
    /// the worker waits it out.
    ///
    /// # Example
    ///
    /// ```
    /// use edge_reconnect::ReconnectConfig;
    ///
    /// let config = ReconnectConfig::builder()
    ///     .on_backoff(|delay| println!("backing off {:?}", delay))
    ///     .build();
    /// ```
    pub fn on_backoff<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event| {
            if let ReconnectEvent::Backoff { delay, .. } = event {
                f(*delay);
            }
        });
        self
    }

    /// Registers a callback invoked just before the reconnector runs.
    pub fn on_reconnect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event| {
            if matches!(event, ReconnectEvent::Reconnecting { .. }) {
                f();
            }
        });
        self
    }

    /// Registers a callback invoked when a successful connection resets the
    /// backoff multiplier; receives the restored starting multiplier.
    pub fn on_backoff_reset<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event| {
            if let ReconnectEvent::BackoffReset { multiplier, .. } = event {
                f(*multiplier);
            }
        });
        self
    }

    /// Registers a callback invoked when the server rejects the credential
    /// and the controller goes inert.
    pub fn on_terminal<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(move |event| {
            if matches!(event, ReconnectEvent::TerminalFailure { .. }) {
                f();
            }
        });
        self
    }

    /// Builds the [`ReconnectConfig`].
    pub fn build(self) -> ReconnectConfig {
        let jitter = self
            .jitter
            .unwrap_or_else(|| Arc::new(|| rand::rng().random::<f64>()));

        ReconnectConfig {
            name: self.name,
            server_connect_timeout: self.server_connect_timeout,
            server_disconnect_retry: self.server_disconnect_retry,
            server_bye_reconnect: self.server_bye_reconnect,
            backoff_multiplier: self.backoff_multiplier,
            maximum_backoff_time: self.maximum_backoff_time,
            jitter,
            event_listeners: self.event_listeners,
        }
    }
}

fn env_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidTunable { name, value }),
        Err(_) => Ok(None),
    }
}
