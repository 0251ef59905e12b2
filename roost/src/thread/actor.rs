//! # Actor Cell
//!
//! The runtime side of one actor: its mailbox, lifecycle state, user state
//! and supervision links. A cell is driven exclusively by the dispatcher
//! worker that currently holds its mailbox's `scheduled` flag, so every
//! lifecycle transition below happens on a single logical thread.
//!
//! ## Batch Order
//! 1. `on_start`, if the actor is still `Created`
//! 2. every pending system message (stop requests, child notifications)
//! 3. one user envelope, if still `Running`; then back to 2, up to the
//!    throughput limit
//!
//! ## Stopping
//! Entering `Stopping` closes the mailbox, discards what is left in it to
//! dead letters and asks every child to stop. Once the last child reports
//! back, `on_stop` runs and the cell becomes `Stopped`: it leaves the
//! registry, publishes its exit reason and notifies its parent. Spawning
//! from `on_stop` is refused, so no child can outlive that hook.

use std::any::type_name;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use roost_api::{
    Actor, ActorError, ActorId, ActorPath, ActorState, BoxedFuture, DeadLetterReason, Envelope,
    ExitReason, SupervisorDirective, SystemEvent,
};
use tokio::sync::{watch, Mutex};
use tracing::Instrument;

use crate::thread::address::ActorRef;
use crate::thread::context::Context;
use crate::thread::envelope::SystemMessage;
use crate::thread::mailbox::{Mailbox, Rejected};
use crate::thread::scheduler::{panic_message, Runnable};
use crate::thread::system::SystemShared;
use crate::{actor_span, log_error, log_lifecycle};

/// Type-erased view of a cell used for supervision links and the registry.
pub(crate) trait Supervised: Send + Sync {
    fn id(&self) -> ActorId;

    fn path(&self) -> &ActorPath;

    fn state(&self) -> ActorState;

    /// Stop immediately: refuse new messages and drop queued ones.
    fn stop(&self);

    /// Enqueue a control message and make sure the cell gets scheduled.
    fn send_system(&self, msg: SystemMessage);
}

/// Typed enqueue capability behind an `ActorRef<M>`.
pub(crate) trait MessageSink<M>: Supervised {
    fn deliver(&self, envelope: Envelope<M>) -> Result<(), Rejected<M>>;
}

struct Instance<A: Actor> {
    actor: A,
    ctx: Context<A>,
    exit: Option<ExitReason>,
    stop_hook_ran: bool,
    released: bool,
}

pub(crate) struct ActorCell<A: Actor> {
    id: ActorId,
    path: ActorPath,
    myself: Weak<ActorCell<A>>,
    parent: Option<Weak<dyn Supervised>>,
    mailbox: Mailbox<A::Message>,
    state: AtomicU8,
    instance: Mutex<Option<Instance<A>>>,
    terminated: watch::Sender<Option<ExitReason>>,
    system: Arc<SystemShared>,
}

fn encode(state: ActorState) -> u8 {
    state as u8
}

fn decode(raw: u8) -> ActorState {
    match raw {
        0 => ActorState::Created,
        1 => ActorState::Running,
        2 => ActorState::Stopping,
        _ => ActorState::Stopped,
    }
}

/// Create a cell, register it and schedule its startup.
///
/// The caller records the returned handle in the parent's child set (or the
/// system's top-level set).
pub(crate) fn spawn_cell<A>(
    system: &Arc<SystemShared>,
    parent: Option<Weak<dyn Supervised>>,
    path: ActorPath,
    actor: A,
) -> (Arc<ActorCell<A>>, ActorRef<A::Message>)
where
    A: Actor<Context = Context<A>>,
{
    let id = ActorId::new();
    let (terminated, terminated_rx) = watch::channel(None);

    let cell = Arc::new_cyclic(|weak: &Weak<ActorCell<A>>| {
        let sink: Weak<dyn MessageSink<A::Message>> = weak.clone();
        let supervised: Weak<dyn Supervised> = weak.clone();
        let myself = ActorRef::new(
            id,
            path.clone(),
            sink,
            Arc::downgrade(system),
            terminated_rx.clone(),
        );
        let ctx = Context::<A>::new(myself, supervised, system.clone());

        ActorCell {
            id,
            path: path.clone(),
            myself: weak.clone(),
            parent,
            mailbox: Mailbox::new(path.clone()),
            state: AtomicU8::new(encode(ActorState::Created)),
            instance: Mutex::new(Some(Instance {
                actor,
                ctx,
                exit: None,
                stop_hook_ran: false,
                released: false,
            })),
            terminated,
            system: system.clone(),
        }
    });

    system.register(cell.clone());
    log_lifecycle!(type_name::<A>(), path, "created", id = %id);
    cell.schedule();

    let weak = Arc::downgrade(&cell);
    let sink: Weak<dyn MessageSink<A::Message>> = weak;
    let actor_ref = ActorRef::new(id, path, sink, Arc::downgrade(system), terminated_rx);
    (cell, actor_ref)
}

impl<A> ActorCell<A>
where
    A: Actor<Context = Context<A>>,
{
    fn set_state(&self, state: ActorState) {
        self.state.store(encode(state), Ordering::SeqCst);
    }

    /// Put the cell on the dispatcher unless it is already there.
    fn schedule(&self) {
        if !self.mailbox.set_scheduled() {
            return;
        }
        match self.myself.upgrade() {
            Some(me) => self.system.dispatcher.dispatch(me),
            None => self.mailbox.set_idle(),
        }
    }

    fn has_pending_work(&self) -> bool {
        match self.state() {
            ActorState::Created | ActorState::Running => {
                self.mailbox.has_system_messages() || self.mailbox.has_messages()
            }
            ActorState::Stopping => self.mailbox.has_system_messages(),
            ActorState::Stopped => false,
        }
    }

    async fn run_batch(self: Arc<Self>, throughput: usize) {
        {
            let mut guard = self.instance.lock().await;
            let released = match guard.as_mut() {
                Some(instance) => {
                    self.process(instance, throughput).await;
                    instance.released
                }
                None => false,
            };
            if released {
                // Drops the user state and the context, children included.
                guard.take();
            }
        }

        self.mailbox.set_idle();
        // A message may have arrived after the last check but before the
        // flag was cleared; its sender saw the flag set and did not schedule.
        if self.has_pending_work() {
            self.schedule();
        }
    }

    async fn process(&self, instance: &mut Instance<A>, throughput: usize) {
        if self.state() == ActorState::Created {
            self.start(instance).await;
        }

        let mut processed = 0;
        loop {
            while let Some(msg) = self.mailbox.pop_system() {
                self.handle_system(instance, msg).await;
            }
            if self.state() != ActorState::Running || processed >= throughput {
                return;
            }
            let Some(envelope) = self.mailbox.pop() else {
                return;
            };
            match envelope {
                Envelope::Message(msg) => {
                    processed += 1;
                    self.invoke(instance, msg).await;
                }
                Envelope::PoisonPill => {
                    log_lifecycle!(type_name::<A>(), self.path, "poison_pill_received");
                    self.begin_stopping(instance, ExitReason::Normal).await;
                }
                Envelope::Kill => {
                    log_lifecycle!(type_name::<A>(), self.path, "kill_received");
                    self.fail(instance, ActorError::Killed).await;
                }
            }
        }
    }

    async fn start(&self, instance: &mut Instance<A>) {
        let result = AssertUnwindSafe(instance.actor.on_start(&mut instance.ctx))
            .catch_unwind()
            .await;
        self.set_state(ActorState::Running);
        log_lifecycle!(type_name::<A>(), self.path, "started", children = instance.ctx.child_count());

        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(error @ ActorError::InitializationError(_))) => error,
            Ok(Err(other)) => ActorError::InitializationError(other.to_string()),
            Err(payload) => ActorError::Panicked(panic_message(payload.as_ref())),
        };
        self.fail(instance, error).await;
    }

    async fn invoke(&self, instance: &mut Instance<A>, msg: A::Message) {
        let result = AssertUnwindSafe(instance.actor.receive(msg, &mut instance.ctx))
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(error)) => self.fail(instance, error).await,
            Err(payload) => {
                let error = ActorError::Panicked(panic_message(payload.as_ref()));
                self.fail(instance, error).await
            }
        }
    }

    async fn handle_system(&self, instance: &mut Instance<A>, msg: SystemMessage) {
        match msg {
            SystemMessage::Terminate => {
                if self.state() == ActorState::Running {
                    self.begin_stopping(instance, ExitReason::Normal).await;
                }
            }
            SystemMessage::ChildTerminated { id, name } => {
                instance.ctx.remove_child(&name, id);
                self.try_finish(instance).await;
            }
            SystemMessage::ChildFailed { path, error } => {
                if self.state() != ActorState::Running {
                    return;
                }
                let directive = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    instance.actor.on_child_failure(&path, &error)
                }))
                .unwrap_or(SupervisorDirective::Escalate);
                log_lifecycle!(
                    type_name::<A>(),
                    self.path,
                    "child_failed",
                    child = %path,
                    directive = ?directive
                );
                if directive == SupervisorDirective::Escalate {
                    let escalated = ActorError::Escalated {
                        child: path.to_string(),
                        reason: error.to_string(),
                    };
                    self.fail(instance, escalated).await;
                }
            }
        }
    }

    /// Abnormal termination: report the failure upwards, then stop.
    async fn fail(&self, instance: &mut Instance<A>, error: ActorError) {
        if self.state().is_terminating() {
            return;
        }
        log_error!(error, actor = %self.path, actor_type = type_name::<A>());

        let reason = if error.is_kill() {
            ExitReason::Killed
        } else {
            ExitReason::Failed(error.to_string())
        };
        self.system.publish(SystemEvent::ActorFailed {
            actor: self.path.clone(),
            error: error.to_string(),
        });
        // Sent before the stop begins so the parent sees the failure ahead of
        // the termination notice.
        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            parent.send_system(SystemMessage::ChildFailed {
                path: self.path.clone(),
                error,
            });
        }
        self.begin_stopping(instance, reason).await;
    }

    async fn begin_stopping(&self, instance: &mut Instance<A>, reason: ExitReason) {
        if self.state().is_terminating() {
            return;
        }
        self.set_state(ActorState::Stopping);
        instance.exit = Some(reason);

        self.mailbox.close();
        let mut discarded = 0usize;
        for envelope in self.mailbox.discard() {
            if let Envelope::Message(_) = envelope {
                discarded += 1;
                self.system.record_dead_letter(
                    &self.path,
                    type_name::<A::Message>(),
                    DeadLetterReason::Discarded,
                );
            }
        }

        let children = instance.ctx.child_handles();
        for child in &children {
            child.stop();
        }
        log_lifecycle!(
            type_name::<A>(),
            self.path,
            "stopping",
            children = children.len(),
            discarded = discarded
        );

        self.try_finish(instance).await;
    }

    /// Complete the stop once no child is left.
    async fn try_finish(&self, instance: &mut Instance<A>) {
        if self.state() != ActorState::Stopping || instance.ctx.has_children() {
            return;
        }

        if !instance.stop_hook_ran {
            instance.stop_hook_ran = true;
            instance.ctx.seal();
            let result = AssertUnwindSafe(instance.actor.on_stop(&mut instance.ctx))
                .catch_unwind()
                .await;
            if let Err(payload) = result {
                log_error!(
                    panic_message(payload.as_ref()),
                    actor = %self.path,
                    hook = "on_stop"
                );
            }
        }

        self.set_state(ActorState::Stopped);
        instance.released = true;
        let reason = instance.exit.clone().unwrap_or(ExitReason::Normal);

        self.system.unregister(&self.path, self.id);
        // Top-level names are free again before anyone observes `Stopped`.
        match self.parent.as_ref().and_then(Weak::upgrade) {
            Some(parent) => parent.send_system(SystemMessage::ChildTerminated {
                id: self.id,
                name: self.path.name().to_string(),
            }),
            None => self.system.top_level_stopped(self.path.name(), self.id),
        }

        log_lifecycle!(type_name::<A>(), self.path, "stopped", reason = %reason);
        self.system.publish(SystemEvent::Terminated {
            actor: self.path.clone(),
            reason: reason.clone(),
        });
        self.terminated.send_replace(Some(reason));
    }
}

impl<A> Supervised for ActorCell<A>
where
    A: Actor<Context = Context<A>>,
{
    fn id(&self) -> ActorId {
        self.id
    }

    fn path(&self) -> &ActorPath {
        &self.path
    }

    fn state(&self) -> ActorState {
        decode(self.state.load(Ordering::SeqCst))
    }

    fn stop(&self) {
        self.mailbox.close();
        self.send_system(SystemMessage::Terminate);
    }

    fn send_system(&self, msg: SystemMessage) {
        self.mailbox.push_system(msg);
        self.schedule();
    }
}

impl<A> MessageSink<A::Message> for ActorCell<A>
where
    A: Actor<Context = Context<A>>,
{
    fn deliver(&self, envelope: Envelope<A::Message>) -> Result<(), Rejected<A::Message>> {
        self.mailbox.push(envelope)?;
        self.schedule();
        Ok(())
    }
}

impl<A> Runnable for ActorCell<A>
where
    A: Actor<Context = Context<A>>,
{
    fn run(self: Arc<Self>, throughput: usize) -> BoxedFuture<'static, ()> {
        let span = actor_span!(type_name::<A>(), self.path);
        Box::pin(self.run_batch(throughput).instrument(span))
    }

    fn path(&self) -> &ActorPath {
        &self.path
    }
}
