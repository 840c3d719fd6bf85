//! Connection outcomes reported by the transport layer, and the reconnect
//! capability the transport hands back to the controller.

/// Why the previous connection attempt ended.
///
/// The transport reports exactly one of these per connection-state change.
/// The enum is non-exhaustive so outcomes added by future transports degrade
/// to a no-op in the controller instead of breaking it.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionOutcome {
    /// Connection established and functioning.
    Success,
    /// The server rejected the API key. Unrecoverable.
    ApiKeyNotFound,
    /// Transport-level disconnect (network drop, stream reset).
    ServerWasDisconnected,
    /// The server issued a graceful close.
    ServerSaidBye,
    /// The initial connection attempt timed out.
    ServerConnectTimeout,
}

/// Capability supplied by the transport: open a fresh connection now.
///
/// Fire-and-forget. The controller never inspects or waits on the result of
/// an attempt; the transport reports how it went through a later
/// [`ConnectionOutcome`].
pub trait Reconnector: Send + Sync {
    /// Attempt to open a new connection.
    fn reconnect(&self);
}

/// A function-based [`Reconnector`].
///
/// # Example
///
/// ```
/// use edge_reconnect::{FnReconnector, Reconnector};
///
/// let reconnector = FnReconnector::new(|| println!("dialing edge server"));
/// reconnector.reconnect();
/// ```
pub struct FnReconnector<F>
where
    F: Fn() + Send + Sync,
{
    f: F,
}

impl<F> FnReconnector<F>
where
    F: Fn() + Send + Sync,
{
    /// Creates a new function-based reconnector.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Reconnector for FnReconnector<F>
where
    F: Fn() + Send + Sync,
{
    fn reconnect(&self) {
        (self.f)()
    }
}
