//! # Message Envelopes
//!
//! Everything that travels through an actor's ordinary mailbox is an
//! [`Envelope`]: either a user message or one of the two reserved
//! termination markers. Because the markers share the queue with user
//! messages, they are processed in order: everything enqueued before a
//! marker is handled first, and everything after it is discarded.

use std::fmt;

/// A unit in an actor's ordinary mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<M> {
    /// A user message, handed to `Actor::receive`.
    Message(M),
    /// Stop normally once every earlier message was processed.
    PoisonPill,
    /// Fail once every earlier message was processed. The handler never
    /// sees this marker.
    Kill,
}

impl<M> Envelope<M> {
    pub fn is_marker(&self) -> bool {
        !matches!(self, Envelope::Message(_))
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Message(_) => "message",
            Envelope::PoisonPill => "poison_pill",
            Envelope::Kill => "kill",
        }
    }
}

/// Why an actor reached `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Stopped through `stop`, a `PoisonPill`, graceful stop or a parent's
    /// cascade.
    Normal,
    /// Stopped because it dequeued a `Kill` marker.
    Killed,
    /// Stopped because a hook or handler failed.
    Failed(String),
}

impl ExitReason {
    pub fn is_normal(&self) -> bool {
        matches!(self, ExitReason::Normal)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Normal => f.write_str("normal"),
            ExitReason::Killed => f.write_str("killed"),
            ExitReason::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
