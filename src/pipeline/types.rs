//! Shared types for the routing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Storage reference ───────────────────────────────────────────────

/// Location of one object in the storage collaborator.
///
/// `container` is never empty; `key` is a slash-delimited path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub container: String,
    pub key: String,
}

impl ObjectRef {
    /// Create a reference, rejecting an empty container.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Option<Self> {
        let container = container.into();
        if container.is_empty() {
            return None;
        }
        Some(Self {
            container,
            key: key.into(),
        })
    }

    /// Another key in the same container.
    pub fn sibling(&self, key: impl Into<String>) -> Self {
        Self {
            container: self.container.clone(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

// ── Routing decision ────────────────────────────────────────────────

/// Classification outcome for one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Forward to a fixed mailbox list, archive under `wins/`.
    ForwardGiveaway {
        from_address: String,
        to_addresses: Vec<String>,
    },
    /// Archive under `sorted/`, keyed by recipient and OTP when present.
    Sort { otp: Option<String> },
}

impl RoutingDecision {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ForwardGiveaway { .. } => "forward_giveaway",
            Self::Sort { .. } => "sort",
        }
    }
}

// ── State machine ───────────────────────────────────────────────────

/// Pipeline stages, in the order a run passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetched,
    Parsed,
    Classified,
    Acted,
    Relocated,
    Done,
    Skipped,
    Failed,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fetched => "fetched",
            Self::Parsed => "parsed",
            Self::Classified => "classified",
            Self::Acted => "acted",
            Self::Relocated => "relocated",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Whether the run stops in this stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Outcome ─────────────────────────────────────────────────────────

/// Result of a run that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No usable body text; source object left untouched.
    Skipped { source: ObjectRef },
    /// Copied under `sorted/` and removed from the source location.
    Sorted {
        destination: ObjectRef,
        otp: Option<String>,
    },
    /// Forward attempted, then copied under `wins/` and removed from the source.
    ///
    /// `message_id` is `None` when the mail service did not confirm the send.
    Forwarded {
        destination: ObjectRef,
        message_id: Option<String>,
    },
}

impl Outcome {
    /// Terminal stage of the run.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Skipped { .. } => Stage::Skipped,
            Self::Sorted { .. } | Self::Forwarded { .. } => Stage::Done,
        }
    }

    /// Whether the run finished with an anomaly (empty body or unconfirmed send).
    pub fn is_anomaly(&self) -> bool {
        match self {
            Self::Skipped { .. } => true,
            Self::Sorted { .. } => false,
            Self::Forwarded { message_id, .. } => message_id.is_none(),
        }
    }

    /// Binary process code: 0 handled, 1 handled with an anomaly.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.is_anomaly())
    }

    /// Destination the source object was moved to, if any.
    pub fn destination(&self) -> Option<&ObjectRef> {
        match self {
            Self::Skipped { .. } => None,
            Self::Sorted { destination, .. } | Self::Forwarded { destination, .. } => {
                Some(destination)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest() -> ObjectRef {
        ObjectRef::new("bucket", "sorted/user@example.com/1.00").unwrap()
    }

    #[test]
    fn object_ref_rejects_empty_container() {
        assert!(ObjectRef::new("", "inbox/abc").is_none());
        assert!(ObjectRef::new("bucket", "").is_some());
    }

    #[test]
    fn object_ref_display_joins_with_slash() {
        let r = ObjectRef::new("bucket", "inbox/abc").unwrap();
        assert_eq!(r.to_string(), "bucket/inbox/abc");
        assert_eq!(r.sibling("wins/x").to_string(), "bucket/wins/x");
    }

    #[test]
    fn exit_code_sorted_is_zero() {
        let outcome = Outcome::Sorted {
            destination: dest(),
            otp: None,
        };
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.stage(), Stage::Done);
    }

    #[test]
    fn exit_code_skipped_is_one() {
        let outcome = Outcome::Skipped {
            source: ObjectRef::new("bucket", "inbox/abc").unwrap(),
        };
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.stage(), Stage::Skipped);
        assert!(outcome.destination().is_none());
    }

    #[test]
    fn exit_code_forward_depends_on_confirmation() {
        let confirmed = Outcome::Forwarded {
            destination: dest(),
            message_id: Some("abc".into()),
        };
        let unconfirmed = Outcome::Forwarded {
            destination: dest(),
            message_id: None,
        };
        assert_eq!(confirmed.exit_code(), 0);
        assert_eq!(unconfirmed.exit_code(), 1);
        assert!(unconfirmed.destination().is_some());
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Skipped.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Classified.is_terminal());
    }
}
