//! Backoff arithmetic: jittered attempt delays and multiplier growth.
//!
//! Both functions take the uniform draw as a parameter rather than sampling
//! internally, so the caller decides where randomness comes from (see
//! [`ReconnectConfigBuilder::jitter_fn`](crate::ReconnectConfigBuilder::jitter_fn)).

use std::time::Duration;

/// Lowest value the backoff multiplier may grow to.
///
/// A growth step that computes below 2 is bumped here so the multiplier can
/// neither collapse to zero nor stall.
pub const MULTIPLIER_FLOOR: u32 = 3;

/// Computes the delay before the next reconnect attempt.
///
/// `unit` is a uniform draw in `[0, 1)`. The delay is
/// `base + round((1 + unit) * multiplier)` milliseconds, capped at `max`.
/// The jitter term spreads simultaneous retries from many clients so they do
/// not hammer a recovering server in lockstep.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use edge_reconnect::jittered_delay;
///
/// let delay = jittered_delay(
///     Duration::from_millis(100),
///     10,
///     Duration::from_secs(30),
///     0.5,
/// );
/// assert_eq!(delay, Duration::from_millis(115));
/// ```
pub fn jittered_delay(base: Duration, multiplier: u32, max: Duration, unit: f64) -> Duration {
    let jitter = ((1.0 + unit) * f64::from(multiplier)).round() as u64;
    let delay = (base.as_millis() as u64).saturating_add(jitter);
    Duration::from_millis(delay.min(max.as_millis() as u64))
}

/// Grows the multiplier for the next attempt.
///
/// `unit` is a fresh uniform draw in `[0, 1)`; the multiplier becomes
/// `round((1 + unit) * current)`, floored at [`MULTIPLIER_FLOOR`] if the
/// computed value falls below 2.
pub fn next_multiplier(current: u32, unit: f64) -> u32 {
    let grown = ((1.0 + unit) * f64::from(current)).round() as u32;
    if grown < 2 { MULTIPLIER_FLOOR } else { grown }
}
