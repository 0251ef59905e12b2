use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use roost_api::{Actor, ActorId, ActorPath, ActorState, SystemEvent};

use crate::thread::actor::{spawn_cell, ActorCell, MessageSink, Supervised};
use crate::{log_lifecycle, log_message};
use crate::thread::address::ActorRef;
use crate::thread::error::SpawnError;
use crate::thread::system::{ActorSystem, SystemShared};

/// Context provides the execution context for an actor instance.
///
/// It is handed to every hook and gives access to:
/// - The actor's own reference
/// - Its path and its parent's path
/// - Its children, and spawning new ones
/// - The actor system
///
/// The child set is only touched by the worker running this actor, so it
/// needs no locking.
pub struct Context<A: Actor> {
    myself: ActorRef<A::Message>,
    cell: Weak<dyn Supervised>,
    children: HashMap<String, Arc<dyn Supervised>>,
    system: Arc<SystemShared>,
    next_child: u64,
    /// Set once `on_stop` begins; no child may be adopted after that.
    sealed: bool,
}

impl<A: Actor> fmt::Debug for Context<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", self.myself.path())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<A: Actor> Context<A> {
    pub(crate) fn new(
        myself: ActorRef<A::Message>,
        cell: Weak<dyn Supervised>,
        system: Arc<SystemShared>,
    ) -> Self {
        Self {
            myself,
            cell,
            children: HashMap::new(),
            system,
            next_child: 0,
            sealed: false,
        }
    }

    /// This actor's own reference.
    pub fn myself(&self) -> &ActorRef<A::Message> {
        &self.myself
    }

    pub fn id(&self) -> ActorId {
        self.myself.id()
    }

    pub fn path(&self) -> &ActorPath {
        self.myself.path()
    }

    /// Path of the supervising actor, `None` for top-level actors.
    pub fn parent(&self) -> Option<ActorPath> {
        self.path().parent()
    }

    /// Paths of the children that have not reported termination yet.
    pub fn children(&self) -> Vec<ActorPath> {
        self.children.values().map(|c| c.path().clone()).collect()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Handle to the system this actor runs in.
    pub fn system(&self) -> ActorSystem {
        ActorSystem::from_shared(self.system.clone())
    }

    /// Spawn a child with a generated name.
    ///
    /// Once this actor's `on_stop` has begun the child is never started: the
    /// returned reference is already stopped and dead-letters every message.
    pub fn spawn<B>(&mut self, actor: B) -> ActorRef<B::Message>
    where
        B: Actor<Context = Context<B>>,
    {
        let name = loop {
            let candidate = format!("${}", self.next_child);
            self.next_child += 1;
            if !self.children.contains_key(&candidate) {
                break candidate;
            }
        };
        if self.sealed {
            return self.refuse(name, actor);
        }
        self.spawn_child(name, actor)
    }

    /// Spawn a child under `name`, which must be unique among this actor's
    /// live children.
    pub fn spawn_named<B>(&mut self, name: &str, actor: B) -> Result<ActorRef<B::Message>, SpawnError>
    where
        B: Actor<Context = Context<B>>,
    {
        ActorPath::validate_name(name).map_err(SpawnError::InvalidName)?;
        if self.sealed {
            self.refuse(name.to_string(), actor);
            return Err(SpawnError::ParentStopping(self.path().to_string()));
        }
        if self.children.contains_key(name) {
            return Err(SpawnError::NameTaken(self.path().child(name).to_string()));
        }
        Ok(self.spawn_child(name.to_string(), actor))
    }

    fn refuse<B>(&self, name: String, actor: B) -> ActorRef<B::Message>
    where
        B: Actor<Context = Context<B>>,
    {
        let path = self.path().child(&name);
        log_lifecycle!(type_name::<B>(), path, "spawn_refused", parent = %self.path());
        drop(actor);
        let cell: Weak<dyn MessageSink<B::Message>> = Weak::<ActorCell<B>>::new();
        ActorRef::detached(ActorId::new(), path, cell, Arc::downgrade(&self.system))
    }

    fn spawn_child<B>(&mut self, name: String, actor: B) -> ActorRef<B::Message>
    where
        B: Actor<Context = Context<B>>,
    {
        let path = self.path().child(&name);
        let (cell, actor_ref) = spawn_cell(&self.system, Some(self.cell.clone()), path, actor);
        let handle: Arc<dyn Supervised> = cell;
        self.children.insert(name, handle.clone());

        // A parent already winding down, but not yet in `on_stop`, still
        // adopts the child; it stops straight away and gates our own stop.
        let parent_state = self
            .cell
            .upgrade()
            .map(|cell| cell.state())
            .unwrap_or(ActorState::Stopped);
        if parent_state.is_terminating() {
            handle.stop();
        }
        actor_ref
    }

    /// Stop this actor as if `stop` was called on its reference: queued
    /// messages are discarded and no further message is handled.
    pub fn stop_self(&self) {
        self.myself.stop();
    }

    /// Report a message this actor does not handle.
    ///
    /// The message is dropped and an `Unhandled` event is published.
    pub fn unhandled<T>(&self, _msg: T) {
        let message_type = type_name::<T>();
        log_message!(message_type, "unhandled", recipient = %self.path());
        self.system.publish(SystemEvent::Unhandled {
            recipient: self.path().clone(),
            message_type,
        });
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub(crate) fn remove_child(&mut self, name: &str, id: ActorId) {
        // A newer child may have reused the name; only drop the one that stopped.
        if self.children.get(name).is_some_and(|child| child.id() == id) {
            self.children.remove(name);
        }
    }

    pub(crate) fn child_handles(&self) -> Vec<Arc<dyn Supervised>> {
        self.children.values().cloned().collect()
    }
}
