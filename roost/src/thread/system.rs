use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use roost_api::{
    Actor, ActorId, ActorPath, DeadLetter, DeadLetterReason, ExitReason, SystemEvent, SystemState,
    SystemStatus,
};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch, Notify};

use crate::thread::actor::{spawn_cell, Supervised};
use crate::thread::address::ActorRef;
use crate::thread::config::SystemConfig;
use crate::thread::context::Context;
use crate::thread::dead_letter::DeadLetters;
use crate::thread::error::{SpawnError, StopError, SystemError};
use crate::thread::scheduler::Dispatcher;
use crate::{log_system, system_span};

/// Upper bound on how long shutdown waits for busy workers to finish their
/// current batch.
const WORKER_GRACE: Duration = Duration::from_secs(1);

/// Top-level actors and the system state, guarded together so that a spawn
/// either lands before shutdown takes its snapshot or is rejected.
struct TopLevel {
    state: SystemState,
    actors: HashMap<String, Arc<dyn Supervised>>,
}

/// State shared by the system handle, every actor cell and every context.
pub(crate) struct SystemShared {
    config: SystemConfig,
    pub(crate) dispatcher: Dispatcher,
    registry: RwLock<HashMap<ActorPath, Arc<dyn Supervised>>>,
    top_level: Mutex<TopLevel>,
    top_level_empty: Notify,
    next_name: AtomicU64,
    dead_letters: DeadLetters,
    events: broadcast::Sender<SystemEvent>,
    started_at: Instant,
    terminated: watch::Sender<bool>,
}

impl SystemShared {
    fn top_level(&self) -> MutexGuard<'_, TopLevel> {
        self.top_level.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, actor: Arc<dyn Supervised>) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(actor.path().clone(), actor);
    }

    pub(crate) fn unregister(&self, path: &ActorPath, id: ActorId) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.get(path).is_some_and(|actor| actor.id() == id) {
            registry.remove(path);
        }
    }

    pub(crate) fn top_level_stopped(&self, name: &str, id: ActorId) {
        let mut top = self.top_level();
        if top.actors.get(name).is_some_and(|actor| actor.id() == id) {
            top.actors.remove(name);
        }
        if top.actors.is_empty() {
            self.top_level_empty.notify_waiters();
        }
    }

    pub(crate) fn record_dead_letter(
        &self,
        recipient: &ActorPath,
        message_type: &'static str,
        reason: DeadLetterReason,
    ) {
        self.dead_letters
            .record(recipient, message_type, reason, &self.events);
    }

    pub(crate) fn publish(&self, event: SystemEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn wait_top_level_empty(&self) {
        loop {
            let notified = self.top_level_empty.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a notification sent in
            // between is not lost.
            notified.as_mut().enable();
            if self.top_level().actors.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

/// Handle to a running actor system.
///
/// The system is the root supervisor: it owns the registry of live actors,
/// the dispatcher and the dead-letter sink. Handles are cheap to clone and
/// all refer to the same system. Dropping them does not stop anything; call
/// [`ActorSystem::shutdown`] to tear the system down.
#[derive(Clone)]
pub struct ActorSystem {
    shared: Arc<SystemShared>,
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("name", &self.shared.config.name)
            .field("state", &self.state())
            .field("actors", &self.actor_count())
            .field("dispatcher", &self.shared.dispatcher)
            .finish()
    }
}

impl ActorSystem {
    /// Start a system on the tokio runtime the caller is running in.
    pub fn new(config: SystemConfig) -> Result<Self, SystemError> {
        let handle = Handle::try_current().map_err(|e| SystemError::NoRuntime(e.to_string()))?;
        Self::with_handle(config, &handle)
    }

    /// Start a system whose workers run on `handle`.
    pub fn with_handle(config: SystemConfig, handle: &Handle) -> Result<Self, SystemError> {
        config.validate()?;
        let span = system_span!("start", system = %config.name);
        let _guard = span.enter();

        let dispatcher = Dispatcher::start(config.worker_count, config.throughput, handle);
        let (events, _) = broadcast::channel(config.event_capacity);
        let (terminated, _) = watch::channel(false);

        let shared = Arc::new(SystemShared {
            dead_letters: DeadLetters::new(config.dead_letter_capacity),
            dispatcher,
            registry: RwLock::new(HashMap::new()),
            top_level: Mutex::new(TopLevel {
                state: SystemState::Running,
                actors: HashMap::new(),
            }),
            top_level_empty: Notify::new(),
            next_name: AtomicU64::new(0),
            events,
            started_at: Instant::now(),
            terminated,
            config,
        });

        log_system!("start", "completed", workers = shared.dispatcher.worker_count());
        Ok(Self { shared })
    }

    pub(crate) fn from_shared(shared: Arc<SystemShared>) -> Self {
        Self { shared }
    }

    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn config(&self) -> &SystemConfig {
        &self.shared.config
    }

    /// Spawn a top-level actor with a generated name.
    pub fn spawn<A>(&self, actor: A) -> Result<ActorRef<A::Message>, SpawnError>
    where
        A: Actor<Context = Context<A>>,
    {
        let name = format!("${}", self.shared.next_name.fetch_add(1, Ordering::Relaxed));
        self.spawn_top_level(name, actor)
    }

    /// Spawn a top-level actor under `name`, unique among live top-level
    /// actors.
    pub fn spawn_named<A>(&self, name: &str, actor: A) -> Result<ActorRef<A::Message>, SpawnError>
    where
        A: Actor<Context = Context<A>>,
    {
        ActorPath::validate_name(name).map_err(SpawnError::InvalidName)?;
        self.spawn_top_level(name.to_string(), actor)
    }

    fn spawn_top_level<A>(&self, name: String, actor: A) -> Result<ActorRef<A::Message>, SpawnError>
    where
        A: Actor<Context = Context<A>>,
    {
        // Lock order: `top_level`, then the registry (taken inside
        // `spawn_cell`). Nothing may take `top_level` while holding the
        // registry lock.
        let mut top = self.shared.top_level();
        if top.state != SystemState::Running {
            return Err(SpawnError::SystemShutdown);
        }
        let path = ActorPath::top_level(&self.shared.config.name, &name);
        if top.actors.contains_key(&name) {
            return Err(SpawnError::NameTaken(path.to_string()));
        }

        let (cell, actor_ref) = spawn_cell(&self.shared, None, path, actor);
        top.actors.insert(name, cell);
        Ok(actor_ref)
    }

    /// Stop an actor immediately, discarding its queued messages.
    pub fn stop<M: Send + 'static>(&self, actor: &ActorRef<M>) {
        actor.stop();
    }

    /// Poison an actor and wait up to `timeout` for it to stop.
    pub async fn graceful_stop<M: Send + 'static>(
        &self,
        actor: &ActorRef<M>,
        timeout: Duration,
    ) -> Result<ExitReason, StopError> {
        actor.graceful_stop(timeout).await
    }

    /// Subscribe to dead letters, unhandled messages, failures and
    /// terminations published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SystemEvent> {
        self.shared.events.subscribe()
    }

    /// Most recent dead letters, oldest first.
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.shared.dead_letters.snapshot()
    }

    pub fn state(&self) -> SystemState {
        self.shared.top_level().state
    }

    /// Number of actors that have not reached `Stopped`.
    pub fn actor_count(&self) -> usize {
        self.shared
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether a live actor is registered at `path`.
    pub fn is_registered(&self, path: &ActorPath) -> bool {
        self.shared
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            name: self.shared.config.name.clone(),
            state: self.state(),
            active_actors: self.actor_count(),
            uptime: self.shared.started_at.elapsed(),
            dead_letters: self.shared.dead_letters.total(),
        }
    }

    /// Shut down with the configured `shutdown_timeout`.
    pub async fn shutdown(&self) -> Result<(), SystemError> {
        self.shutdown_with_timeout(self.shared.config.shutdown_timeout)
            .await
    }

    /// Stop every top-level actor (and so every actor), wait up to `timeout`
    /// for the tree to drain, then stop the dispatcher.
    ///
    /// New spawns are rejected from the moment this is called. Concurrent
    /// callers all wait for the same shutdown.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<(), SystemError> {
        let snapshot: Option<Vec<Arc<dyn Supervised>>> = {
            let mut top = self.shared.top_level();
            if top.state == SystemState::Running {
                top.state = SystemState::ShuttingDown;
                Some(top.actors.values().cloned().collect())
            } else {
                None
            }
        };
        let Some(actors) = snapshot else {
            self.terminated().await;
            return Ok(());
        };

        log_system!("shutdown", "started", system = %self.name(), top_level = actors.len());
        for actor in &actors {
            actor.stop();
        }

        let drained = tokio::time::timeout(timeout, self.shared.wait_top_level_empty()).await;
        self.shared.dispatcher.shutdown(timeout.min(WORKER_GRACE)).await;

        self.shared.top_level().state = SystemState::Stopped;
        self.shared.terminated.send_replace(true);

        match drained {
            Ok(()) => {
                log_system!("shutdown", "completed", system = %self.name());
                Ok(())
            }
            Err(_) => {
                let remaining = self.actor_count();
                log_system!("shutdown", "timed_out", system = %self.name(), remaining = remaining);
                Err(SystemError::Timeout(format!(
                    "{remaining} actors still running after {timeout:?}"
                )))
            }
        }
    }

    /// Resolves once shutdown has completed.
    pub async fn terminated(&self) {
        let mut rx = self.shared.terminated.subscribe();
        // The sender lives in `shared`, which `self` keeps alive.
        let _ = rx.wait_for(|done| *done).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::runtime::Builder;

    #[test]
    fn test_system_creation() {
        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        let system = ActorSystem::with_handle(SystemConfig::named("unit"), runtime.handle()).unwrap();

        assert_eq!(system.state(), SystemState::Running);
        assert_eq!(system.actor_count(), 0);
        assert_eq!(system.name(), "unit");
    }

    #[test]
    fn test_system_shutdown() {
        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        let system = ActorSystem::with_handle(SystemConfig::default(), runtime.handle()).unwrap();

        runtime.block_on(async {
            let result = system.shutdown_with_timeout(Duration::from_millis(100)).await;
            assert!(result.is_ok(), "System shutdown failed: {:?}", result);
            assert_eq!(system.state(), SystemState::Stopped);
            // A second call returns straight away.
            assert!(system.shutdown().await.is_ok());
        });
    }

    #[test]
    fn new_requires_a_runtime() {
        assert!(matches!(
            ActorSystem::new(SystemConfig::default()),
            Err(SystemError::NoRuntime(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        let config = SystemConfig {
            throughput: 0,
            ..Default::default()
        };
        assert!(matches!(
            ActorSystem::with_handle(config, runtime.handle()),
            Err(SystemError::ConfigError(_))
        ));
    }
}
