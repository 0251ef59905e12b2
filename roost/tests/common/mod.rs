// Shared fixtures for the runtime integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use roost::thread::{ActorRef, ActorSystem, Context, SystemConfig};
use roost::{Actor, ActorError, ActorPath, ActorResult, SupervisorDirective};
use tokio::sync::Notify;

/// Default upper bound for anything a test waits on.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// A system with a few workers, logging at WARN.
pub fn test_system(name: &str) -> ActorSystem {
    roost::logging::init_test();
    ActorSystem::new(SystemConfig {
        worker_count: 4,
        ..SystemConfig::named(name)
    })
    .expect("system should start")
}

/// Fail the test if `fut` does not finish within `DEFAULT_WAIT`.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(DEFAULT_WAIT, fut)
        .await
        .expect("operation timed out")
}

/// Poll `condition` until it holds or `DEFAULT_WAIT` elapses.
pub async fn wait_until(condition: impl Fn() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

/// Ordered log shared between actors and the test body.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().unwrap().iter().any(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == entry)
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Messages understood by [`Recorder`].
#[derive(Debug)]
pub enum Probe {
    Record(String),
    Fail(String),
    Panic,
    Sleep(Duration),
    StopSelf,
}

/// Test actor that writes every lifecycle step into a [`Journal`].
///
/// With a gate, `on_start` blocks until the gate is opened, which lets a
/// test queue messages while the actor is still `Created`.
pub struct Recorder {
    name: String,
    journal: Journal,
    gate: Option<Arc<Notify>>,
}

impl Recorder {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            gate: None,
        }
    }

    pub fn gated(name: &str, journal: &Journal, gate: &Arc<Notify>) -> Self {
        Self {
            gate: Some(gate.clone()),
            ..Self::new(name, journal)
        }
    }
}

#[async_trait]
impl Actor for Recorder {
    type Message = Probe;
    type Context = Context<Self>;

    async fn on_start(&mut self, _ctx: &mut Context<Self>) -> ActorResult<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.journal.push(format!("{} started", self.name));
        Ok(())
    }

    async fn receive(&mut self, msg: Probe, ctx: &mut Context<Self>) -> ActorResult<()> {
        match msg {
            Probe::Record(text) => self.journal.push(format!("{} got {}", self.name, text)),
            Probe::Fail(reason) => return Err(ActorError::MessageHandlingError(reason)),
            Probe::Panic => panic!("{} was asked to panic", self.name),
            Probe::Sleep(duration) => {
                self.journal.push(format!("{} sleeping", self.name));
                tokio::time::sleep(duration).await;
                self.journal.push(format!("{} slept", self.name));
            }
            Probe::StopSelf => ctx.stop_self(),
        }
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &mut Context<Self>) {
        self.journal.push(format!("{} stopped", self.name));
    }
}

/// References to the children a [`Parent`] spawned, by name.
pub type ChildRefs = Arc<Mutex<HashMap<String, ActorRef<Probe>>>>;

/// Supervisor fixture: spawns one [`Recorder`] per name in `on_start` and
/// journals the failures it is told about.
pub struct Parent {
    inner: Recorder,
    children: Vec<String>,
    refs: ChildRefs,
    directive: SupervisorDirective,
}

impl Parent {
    pub fn new(name: &str, journal: &Journal, children: &[&str]) -> (Self, ChildRefs) {
        let refs = ChildRefs::default();
        let parent = Self {
            inner: Recorder::new(name, journal),
            children: children.iter().map(|c| c.to_string()).collect(),
            refs: refs.clone(),
            directive: SupervisorDirective::Stop,
        };
        (parent, refs)
    }

    pub fn escalating(mut self) -> Self {
        self.directive = SupervisorDirective::Escalate;
        self
    }
}

/// Look up a child reference captured by a [`Parent`].
pub fn child(refs: &ChildRefs, name: &str) -> ActorRef<Probe> {
    refs.lock().unwrap().get(name).cloned().expect("child was spawned")
}

#[async_trait]
impl Actor for Parent {
    type Message = Probe;
    type Context = Context<Self>;

    async fn on_start(&mut self, ctx: &mut Context<Self>) -> ActorResult<()> {
        for name in &self.children {
            let child = ctx.spawn_named(name, Recorder::new(name, &self.inner.journal))?;
            self.refs.lock().unwrap().insert(name.clone(), child);
        }
        self.inner.journal.push(format!("{} started", self.inner.name));
        Ok(())
    }

    async fn receive(&mut self, msg: Probe, ctx: &mut Context<Self>) -> ActorResult<()> {
        match msg {
            Probe::Record(text) => self
                .inner
                .journal
                .push(format!("{} got {}", self.inner.name, text)),
            Probe::Fail(reason) => return Err(ActorError::MessageHandlingError(reason)),
            Probe::StopSelf => ctx.stop_self(),
            other => ctx.unhandled(other),
        }
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &mut Context<Self>) {
        self.inner.journal.push(format!("{} stopped", self.inner.name));
    }

    fn on_child_failure(&mut self, child: &ActorPath, error: &ActorError) -> SupervisorDirective {
        self.inner
            .journal
            .push(format!("{} saw {} fail: {}", self.inner.name, child.name(), error));
        self.directive
    }
}
