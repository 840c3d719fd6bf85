//! Events emitted by the reconnect controller for observability.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::outcome::ConnectionOutcome;

/// Events emitted by [`EdgeRetryer`](crate::EdgeRetryer) over its lifetime.
#[derive(Debug, Clone)]
pub enum ReconnectEvent {
    /// An outcome was dispatched and a reconnect job queued for the worker.
    Scheduled {
        name: String,
        timestamp: Instant,
        outcome: ConnectionOutcome,
    },
    /// The worker computed an attempt delay and is about to wait it out.
    Backoff {
        name: String,
        timestamp: Instant,
        delay: Duration,
    },
    /// The delay elapsed; the reconnector is being invoked.
    Reconnecting { name: String, timestamp: Instant },
    /// A successful connection reset the backoff multiplier.
    BackoffReset {
        name: String,
        timestamp: Instant,
        multiplier: u32,
    },
    /// The server rejected the credential; the controller is now inert.
    TerminalFailure { name: String, timestamp: Instant },
    /// The controller was shut down.
    Closed { name: String, timestamp: Instant },
}

impl ReconnectEvent {
    /// Returns the type of event (e.g. `"Scheduled"`).
    pub fn event_type(&self) -> &'static str {
        match self {
            ReconnectEvent::Scheduled { .. } => "Scheduled",
            ReconnectEvent::Backoff { .. } => "Backoff",
            ReconnectEvent::Reconnecting { .. } => "Reconnecting",
            ReconnectEvent::BackoffReset { .. } => "BackoffReset",
            ReconnectEvent::TerminalFailure { .. } => "TerminalFailure",
            ReconnectEvent::Closed { .. } => "Closed",
        }
    }

    /// Returns when this event occurred.
    pub fn timestamp(&self) -> Instant {
        match self {
            ReconnectEvent::Scheduled { timestamp, .. }
            | ReconnectEvent::Backoff { timestamp, .. }
            | ReconnectEvent::Reconnecting { timestamp, .. }
            | ReconnectEvent::BackoffReset { timestamp, .. }
            | ReconnectEvent::TerminalFailure { timestamp, .. }
            | ReconnectEvent::Closed { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the name of the controller instance that emitted this event.
    pub fn name(&self) -> &str {
        match self {
            ReconnectEvent::Scheduled { name, .. }
            | ReconnectEvent::Backoff { name, .. }
            | ReconnectEvent::Reconnecting { name, .. }
            | ReconnectEvent::BackoffReset { name, .. }
            | ReconnectEvent::TerminalFailure { name, .. }
            | ReconnectEvent::Closed { name, .. } => name,
        }
    }
}

type ListenerFn = Arc<dyn Fn(&ReconnectEvent) + Send + Sync>;

/// A collection of event listeners.
#[derive(Clone, Default)]
pub struct EventListeners {
    listeners: Vec<ListenerFn>,
}

impl EventListeners {
    /// Creates a new empty listener collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener to the collection.
    pub fn add<F>(&mut self, listener: F)
    where
        F: Fn(&ReconnectEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits an event to all registered listeners.
    ///
    /// A panicking listener does not prevent the remaining listeners from
    /// being called.
    pub fn emit(&self, event: &ReconnectEvent) {
        for listener in &self.listeners {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener(event);
            }));
        }
    }

    /// Returns true if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.len())
            .finish()
    }
}
