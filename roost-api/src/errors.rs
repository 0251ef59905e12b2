//! # Actor Error Types
//!
//! Errors an actor reports to the runtime. Any `Err` returned from a hook or
//! a handler is treated as an abnormal termination: the actor is stopped,
//! its children are stopped first, and its parent is told about the failure
//! so it can pick a [`SupervisorDirective`](crate::supervisor::SupervisorDirective).
//!
//! ## Usage Example
//!
//! ```rust
//! use roost_api::errors::ActorError;
//!
//! fn describe(error: &ActorError) -> &'static str {
//!     match error {
//!         ActorError::InitializationError(_) => "failed in on_start",
//!         ActorError::Killed => "received a Kill marker",
//!         ActorError::Panicked(_) => "handler panicked",
//!         _ => "failed while running",
//!     }
//! }
//! ```

use thiserror::Error;

/// Core error type for actor failures.
#[derive(Error, Debug)]
pub enum ActorError {
    /// The startup hook failed.
    #[error("Actor initialization failed: {0}")]
    InitializationError(String),

    /// A message handler returned an error.
    #[error("Message handling failed: {0}")]
    MessageHandlingError(String),

    /// The actor dequeued a `Kill` marker.
    ///
    /// The handler never sees the marker; the runtime fails the actor on its
    /// behalf so the failure travels the normal escalation path.
    #[error("Actor was killed")]
    Killed,

    /// A hook or handler panicked. Carries the panic payload when it was a
    /// string.
    #[error("Actor panicked: {0}")]
    Panicked(String),

    /// A child failed and this actor's supervisor hook chose to escalate.
    #[error("Child {child} failed: {reason}")]
    Escalated { child: String, reason: String },

    /// Anything else, typically bubbled up from user code with `?`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActorError {
    /// Whether this failure was requested through a `Kill` marker rather than
    /// raised by the actor itself.
    pub fn is_kill(&self) -> bool {
        matches!(self, ActorError::Killed)
    }
}
