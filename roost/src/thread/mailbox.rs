use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crossbeam_queue::SegQueue;
use flume::{Receiver, Sender};
use roost_api::{ActorPath, Envelope};

use crate::thread::envelope::SystemMessage;
use crate::thread::error::MailboxError;

/// An envelope the mailbox refused, handed back so the caller can route it
/// to dead letters.
pub(crate) struct Rejected<M> {
    pub error: MailboxError,
    pub envelope: Envelope<M>,
}

/// Per-actor message queue.
///
/// Two lanes:
/// - the user lane, an unbounded flume channel carrying [`Envelope`]s in
///   FIFO order. It closes when the actor starts stopping.
/// - the system lane, a lock-free queue of [`SystemMessage`]s that is never
///   closed and is always drained first.
///
/// The `scheduled` flag gives the at-most-one-consumer guarantee: only the
/// caller that flips it from idle to scheduled may drain the mailbox, until
/// it flips it back.
pub(crate) struct Mailbox<M> {
    sender: Sender<Envelope<M>>,
    receiver: Receiver<Envelope<M>>,
    system: SegQueue<SystemMessage>,
    /// Producers hold the read side while sending, so a close lands either
    /// before or after a given send, never during it.
    closed: RwLock<bool>,
    scheduled: AtomicBool,
    path: ActorPath,
}

impl<M> fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("system_len", &self.system.len())
            .field("closed", &self.is_closed())
            .field("scheduled", &self.is_scheduled())
            .finish()
    }
}

impl<M> Mailbox<M> {
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }
}

impl<M: Send + 'static> Mailbox<M> {
    pub fn new(path: ActorPath) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            sender,
            receiver,
            system: SegQueue::new(),
            closed: RwLock::new(false),
            scheduled: AtomicBool::new(false),
            path,
        }
    }

    /// Append an envelope to the user lane.
    pub fn push(&self, envelope: Envelope<M>) -> Result<(), Rejected<M>> {
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return Err(Rejected {
                error: MailboxError::Closed,
                envelope,
            });
        }
        // The receiver lives as long as `self`, so this only fails if the
        // channel was torn down underneath us.
        self.sender.send(envelope).map_err(|err| Rejected {
            error: MailboxError::Closed,
            envelope: err.into_inner(),
        })
    }

    /// Append a control message. Always accepted.
    pub fn push_system(&self, msg: SystemMessage) {
        self.system.push(msg);
    }

    /// Remove the head of the user lane, if any.
    pub fn pop(&self) -> Option<Envelope<M>> {
        self.receiver.try_recv().ok()
    }

    pub fn pop_system(&self) -> Option<SystemMessage> {
        self.system.pop()
    }

    /// Close the user lane. Returns `true` only for the call that closed it.
    ///
    /// Messages already queued stay queued; use [`Mailbox::discard`] to drop
    /// them.
    pub fn close(&self) -> bool {
        let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            return false;
        }
        *closed = true;
        true
    }

    /// Drain every envelope still in the user lane.
    pub fn discard(&self) -> Vec<Envelope<M>> {
        self.receiver.drain().collect()
    }

    pub fn has_messages(&self) -> bool {
        !self.receiver.is_empty()
    }

    pub fn has_system_messages(&self) -> bool {
        !self.system.is_empty()
    }

    /// Try to become the mailbox's single consumer.
    pub fn set_scheduled(&self) -> bool {
        self.scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Give up the consumer role.
    pub fn set_idle(&self) {
        self.scheduled.store(false, Ordering::SeqCst);
    }
}
