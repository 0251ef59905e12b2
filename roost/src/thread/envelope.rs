use roost_api::{ActorError, ActorId, ActorPath};

/// Internal control messages used for lifecycle management.
///
/// They travel in a separate lane of the mailbox that is never closed and
/// is always drained before the next user message.
#[derive(Debug)]
pub(crate) enum SystemMessage {
    /// Begin stopping. Sent by `stop`, by a parent's cascade and by system
    /// shutdown.
    Terminate,

    /// A child reached `Stopped`.
    ChildTerminated {
        id: ActorId,
        name: String,
    },

    /// A child failed. It is already stopping on its own.
    ChildFailed {
        path: ActorPath,
        error: ActorError,
    },
}
