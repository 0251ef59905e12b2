use std::time::Duration;

use roost_api::ActorError;
use thiserror::Error;

/// Errors related to Mailbox operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    #[error("Mailbox is closed")]
    Closed,
}

/// Errors related to spawning actors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    #[error("Actor name already taken: {0}")]
    NameTaken(String),
    #[error("Invalid actor name: {0}")]
    InvalidName(String),
    #[error("System is shutting down")]
    SystemShutdown,
    #[error("Parent {0} is stopping")]
    ParentStopping(String),
}

// Lets hooks spawn children with `?`.
impl From<SpawnError> for ActorError {
    fn from(error: SpawnError) -> Self {
        ActorError::Other(error.into())
    }
}

/// Errors returned by graceful stop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopError {
    #[error("Actor {path} did not stop within {timeout:?}")]
    Timeout { path: String, timeout: Duration },
}

/// Errors related to the Actor System itself.
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Operation timed out: {0}")]
    Timeout(String),
    #[error("Internal system error: {0}")]
    Other(#[from] anyhow::Error),
}
