//! Routing pipeline.
//!
//! Every stored email flows through:
//! 1. `ObjectStore::get_object()`: fetch raw bytes
//! 2. `parse_envelope()`: sender, recipient, subject, body text
//! 3. `Classifier::classify()`: forward or sort
//! 4. `KeyRouter::destination_key()`: where the object goes
//! 5. `Pipeline::run()`: act, relocate, delete

pub mod classifier;
pub mod keys;
pub mod orchestrator;
pub mod types;

pub use classifier::{Classifier, DEFAULT_NOTIFICATION_SENDER, ForwardTarget};
pub use keys::{Clock, FixedClock, KeyRouter, SystemClock, build_destination_key};
pub use orchestrator::{Pipeline, exit_code};
pub use types::{ObjectRef, Outcome, RoutingDecision, Stage};
