//! Destination key derivation.
//!
//! Keys are `wins/{recipient}/{ts}` for forwarded mail and
//! `sorted/{recipient}/{ts}[-{otp}]` for sorted mail, where `ts` is seconds
//! since the epoch with two fractional digits. Two runs within the same
//! 10ms for the same recipient produce the same key; swap the [`Clock`]
//! for a source with a stronger uniqueness guarantee if that matters.

use chrono::Utc;

use crate::pipeline::types::RoutingDecision;

/// Prefix for forwarded notifications.
pub const WINS_PREFIX: &str = "wins";

/// Prefix for sorted mail.
pub const SORTED_PREFIX: &str = "sorted";

/// Source of key timestamps (seconds since the epoch).
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        let now = Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.0
    }
}

/// Build the destination key for a decision.
///
/// Pure: the same inputs always give the same key.
pub fn build_destination_key(decision: &RoutingDecision, recipient: &str, timestamp: f64) -> String {
    match decision {
        RoutingDecision::ForwardGiveaway { .. } => {
            format!("{WINS_PREFIX}/{recipient}/{timestamp:.2}")
        }
        RoutingDecision::Sort { otp: Some(otp) } => {
            format!("{SORTED_PREFIX}/{recipient}/{timestamp:.2}-{otp}")
        }
        RoutingDecision::Sort { otp: None } => {
            format!("{SORTED_PREFIX}/{recipient}/{timestamp:.2}")
        }
    }
}

/// Derives destination keys, stamping them with its clock.
pub struct KeyRouter {
    clock: Box<dyn Clock>,
}

impl KeyRouter {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Key for `decision`, timestamped at the moment of the call.
    pub fn destination_key(&self, decision: &RoutingDecision, recipient: &str) -> String {
        build_destination_key(decision, recipient, self.clock.now())
    }
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new(Box::new(SystemClock))
    }
}

impl std::fmt::Debug for KeyRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRouter").finish_non_exhaustive()
    }
}
