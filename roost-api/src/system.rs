//! # System-level Types
//!
//! Status snapshots and the events an actor system publishes to its
//! subscribers. Events are diagnostics: nothing in the runtime depends on
//! anyone listening.

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::address::ActorPath;
use crate::message::ExitReason;

/// Lifecycle of the actor system itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    Running,
    ShuttingDown,
    Stopped,
}

/// Point-in-time view of a running system.
#[derive(Debug, Clone)]
pub struct SystemStatus {
    pub name: String,
    pub state: SystemState,
    /// Actors registered and not yet stopped
    pub active_actors: usize,
    pub uptime: Duration,
    /// Dead letters recorded since the system started
    pub dead_letters: u64,
}

/// Why a message ended up in the dead-letter sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadLetterReason {
    /// Sent after the recipient's mailbox closed (or after it stopped).
    MailboxClosed,
    /// Queued before the recipient began stopping, then dropped by the
    /// termination protocol.
    Discarded,
}

impl fmt::Display for DeadLetterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadLetterReason::MailboxClosed => f.write_str("mailbox closed"),
            DeadLetterReason::Discarded => f.write_str("discarded on stop"),
        }
    }
}

/// A message that could not be delivered.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub recipient: ActorPath,
    /// Rust type name of the undelivered message
    pub message_type: &'static str,
    pub reason: DeadLetterReason,
    pub timestamp: SystemTime,
}

/// Events published on the system's event stream.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    DeadLetter(DeadLetter),
    /// An actor declared a message it received as unhandled.
    Unhandled {
        recipient: ActorPath,
        message_type: &'static str,
    },
    /// An actor terminated abnormally (handler error, panic, failed startup
    /// or `Kill`).
    ActorFailed { actor: ActorPath, error: String },
    /// An actor reached `Stopped`.
    Terminated { actor: ActorPath, reason: ExitReason },
}
