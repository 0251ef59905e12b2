use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use std::time::Duration;

use roost_api::{ActorId, ActorPath, ActorState, DeadLetterReason, Envelope, ExitReason};
use tokio::sync::watch;

use crate::log_message;
use crate::thread::actor::MessageSink;
use crate::thread::error::StopError;
use crate::thread::system::SystemShared;

/// Handle to an actor accepting messages of type `M`.
///
/// Cheap to clone and safe to share between threads. Equality and hashing
/// follow the actor's identity, not its path.
///
/// The reference never keeps the actor alive and stays usable after the
/// actor stopped: messages sent to it from then on are recorded as dead
/// letters and otherwise dropped. Sending never fails observably.
pub struct ActorRef<M: Send + 'static> {
    id: ActorId,
    path: ActorPath,
    cell: Weak<dyn MessageSink<M>>,
    system: Weak<SystemShared>,
    terminated: watch::Receiver<Option<ExitReason>>,
}

impl<M: Send + 'static> ActorRef<M> {
    pub(crate) fn new(
        id: ActorId,
        path: ActorPath,
        cell: Weak<dyn MessageSink<M>>,
        system: Weak<SystemShared>,
        terminated: watch::Receiver<Option<ExitReason>>,
    ) -> Self {
        Self {
            id,
            path,
            cell,
            system,
            terminated,
        }
    }

    /// A reference to an actor that was never started. It reports itself
    /// stopped and dead-letters every message.
    pub(crate) fn detached(
        id: ActorId,
        path: ActorPath,
        cell: Weak<dyn MessageSink<M>>,
        system: Weak<SystemShared>,
    ) -> Self {
        let (_, terminated) = watch::channel(Some(ExitReason::Normal));
        Self::new(id, path, cell, system, terminated)
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn path(&self) -> &ActorPath {
        &self.path
    }

    /// Enqueue a message. Fire-and-forget.
    pub fn tell(&self, msg: M) {
        self.send(Envelope::Message(msg));
    }

    /// Enqueue a message or one of the termination markers.
    pub fn send(&self, envelope: Envelope<M>) {
        let undelivered = match self.cell.upgrade() {
            Some(cell) => match cell.deliver(envelope) {
                Ok(()) => return,
                Err(rejected) => {
                    log_message!(
                        type_name::<M>(),
                        "rejected",
                        recipient = %self.path,
                        error = %rejected.error
                    );
                    rejected.envelope
                }
            },
            None => envelope,
        };

        match undelivered {
            Envelope::Message(_) => {
                if let Some(system) = self.system.upgrade() {
                    system.record_dead_letter(
                        &self.path,
                        type_name::<M>(),
                        DeadLetterReason::MailboxClosed,
                    );
                }
            }
            // Terminating a terminated actor is a no-op.
            marker => log_message!(marker.kind(), "ignored", recipient = %self.path),
        }
    }

    /// Stop after every message already queued has been processed.
    pub fn poison_pill(&self) {
        self.send(Envelope::PoisonPill);
    }

    /// Fail after every message already queued has been processed. The
    /// failure is reported to the parent like any other.
    pub fn kill(&self) {
        self.send(Envelope::Kill);
    }

    /// Stop now. Messages still queued are discarded and no further message
    /// is handled once the actor observes the request.
    pub fn stop(&self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.stop();
        }
    }

    /// Request a stop with a `PoisonPill` and wait up to `timeout` for the
    /// actor to reach `Stopped`.
    ///
    /// On timeout the stop keeps going; only the wait is abandoned. An actor
    /// that already stopped returns its exit reason immediately.
    pub async fn graceful_stop(&self, timeout: Duration) -> Result<ExitReason, StopError> {
        if let Some(reason) = self.exit_reason() {
            return Ok(reason);
        }
        self.poison_pill();
        tokio::time::timeout(timeout, self.stopped())
            .await
            .map_err(|_| StopError::Timeout {
                path: self.path.to_string(),
                timeout,
            })
    }

    /// Resolves once the actor reaches `Stopped`.
    pub async fn stopped(&self) -> ExitReason {
        let mut rx = self.terminated.clone();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                // The cell went away without publishing a reason.
                return rx.borrow().clone().unwrap_or(ExitReason::Normal);
            }
        }
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.terminated.borrow().clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.borrow().is_some()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ActorState {
        if self.is_terminated() {
            return ActorState::Stopped;
        }
        self.cell
            .upgrade()
            .map(|cell| cell.state())
            .unwrap_or(ActorState::Stopped)
    }

    /// A send-only handle accepting any `T` this actor's message type can be
    /// built from. Used to pass reply addresses inside messages.
    pub fn recipient<T>(&self) -> Recipient<T>
    where
        T: Send + 'static,
        M: From<T>,
    {
        let target = self.clone();
        Recipient {
            path: Some(self.path.clone()),
            deliver: Arc::new(move |msg: T| target.tell(M::from(msg))),
        }
    }
}

impl<M: Send + 'static> Clone for ActorRef<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            path: self.path.clone(),
            cell: self.cell.clone(),
            system: self.system.clone(),
            terminated: self.terminated.clone(),
        }
    }
}

impl<M: Send + 'static> PartialEq for ActorRef<M> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<M: Send + 'static> Eq for ActorRef<M> {}

impl<M: Send + 'static> Hash for ActorRef<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<M: Send + 'static> fmt::Debug for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

impl<M: Send + 'static> fmt::Display for ActorRef<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Send-only capability for messages of type `T`.
///
/// Usually obtained from [`ActorRef::recipient`]. [`Recipient::from_fn`]
/// wraps arbitrary code, which lets tests and non-actor callers receive
/// replies.
pub struct Recipient<T> {
    path: Option<ActorPath>,
    deliver: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T: Send + 'static> Recipient<T> {
    pub fn from_fn(deliver: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            path: None,
            deliver: Arc::new(deliver),
        }
    }

    pub fn tell(&self, msg: T) {
        (self.deliver)(msg);
    }

    /// Path of the actor behind this recipient, if it is one.
    pub fn path(&self) -> Option<&ActorPath> {
        self.path.as_ref()
    }
}

impl<T: Send + 'static> From<ActorRef<T>> for Recipient<T> {
    fn from(actor: ActorRef<T>) -> Self {
        Recipient {
            path: Some(actor.path.clone()),
            deliver: Arc::new(move |msg: T| actor.tell(msg)),
        }
    }
}

impl<T> Clone for Recipient<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            deliver: self.deliver.clone(),
        }
    }
}

impl<T> fmt::Debug for Recipient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "Recipient({path})"),
            None => f.write_str("Recipient(<fn>)"),
        }
    }
}
