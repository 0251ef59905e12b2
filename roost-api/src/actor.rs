use async_trait::async_trait;

use crate::address::ActorPath;
use crate::errors::ActorError;
use crate::supervisor::SupervisorDirective;
use crate::types::ActorResult;

/// Actor lifecycle state.
///
/// Transitions are strictly monotonic: `Created → Running → Stopping →
/// Stopped`. Nothing leaves `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActorState {
    /// Registered with its parent, startup hook not yet run.
    Created,
    /// Startup hook finished; messages are being processed.
    Running,
    /// A termination request was accepted; waiting for the mailbox and the
    /// children to wind down.
    Stopping,
    /// Shutdown hook ran and all resources were released.
    Stopped,
}

impl ActorState {
    /// True once the actor has accepted a termination request.
    pub fn is_terminating(&self) -> bool {
        matches!(self, ActorState::Stopping | ActorState::Stopped)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, ActorState::Stopped)
    }
}

/// Core Actor trait.
///
/// An actor owns its state exclusively. The runtime calls at most one of
/// these methods at a time, so `&mut self` never races with anything.
///
/// `Message` is the closed set of messages the actor understands, usually an
/// enum. `Context` is supplied by the runtime; with the thread runtime it is
/// `roost::thread::Context<Self>`.
#[async_trait]
pub trait Actor: Send + Sized + 'static {
    /// Messages accepted by this actor
    type Message: Send + 'static;
    /// Runtime context handed to every hook
    type Context: Send;

    /// Runs exactly once, before the first message is processed.
    ///
    /// Children spawned here are registered synchronously. Returning an error
    /// stops the actor abnormally; `on_stop` still runs.
    async fn on_start(&mut self, _ctx: &mut Self::Context) -> ActorResult<()> {
        Ok(())
    }

    /// Handle one message.
    async fn receive(&mut self, msg: Self::Message, ctx: &mut Self::Context) -> ActorResult<()>;

    /// Runs exactly once, after every child has stopped and before the actor
    /// is marked `Stopped`.
    async fn on_stop(&mut self, _ctx: &mut Self::Context) {}

    /// Decide what happens to this actor when one of its children fails.
    ///
    /// The failed child always stops. `Escalate` fails this actor as well.
    fn on_child_failure(&mut self, _child: &ActorPath, _error: &ActorError) -> SupervisorDirective {
        SupervisorDirective::Stop
    }
}
