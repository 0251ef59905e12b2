// Walks a small supervision tree through each way of stopping an actor:
// an immediate stop, a poison pill, a kill and a graceful stop.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use roost::thread::{ActorRef, ActorSystem, Context, SystemConfig};
use roost::{Actor, ActorError, ActorPath, ActorResult, SupervisorDirective, SystemEvent};
use tracing::{info, warn};

struct Worker {
    key: &'static str,
}

#[async_trait]
impl Actor for Worker {
    type Message = String;
    type Context = Context<Self>;

    async fn on_start(&mut self, _ctx: &mut Context<Self>) -> ActorResult<()> {
        info!("{} Started", self.key);
        Ok(())
    }

    async fn receive(&mut self, msg: String, _ctx: &mut Context<Self>) -> ActorResult<()> {
        info!("{} handling {}", self.key, msg);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &mut Context<Self>) {
        info!("{} Stopped", self.key);
    }
}

enum SupervisorMsg {
    /// Hand out a child reference so main can poke at it
    Child(&'static str, tokio::sync::oneshot::Sender<ActorRef<String>>),
}

struct Supervisor {
    children: Vec<(&'static str, ActorRef<String>)>,
}

#[async_trait]
impl Actor for Supervisor {
    type Message = SupervisorMsg;
    type Context = Context<Self>;

    async fn on_start(&mut self, ctx: &mut Context<Self>) -> ActorResult<()> {
        info!("Supervisor Starting");
        for (name, key) in [("first", "First Child"), ("second", "Second Child"), ("third", "Third Child")] {
            let child = ctx.spawn_named(name, Worker { key })?;
            self.children.push((name, child));
        }
        Ok(())
    }

    async fn receive(&mut self, msg: SupervisorMsg, _ctx: &mut Context<Self>) -> ActorResult<()> {
        let SupervisorMsg::Child(name, reply) = msg;
        if let Some((_, child)) = self.children.iter().find(|(n, _)| *n == name) {
            let _ = reply.send(child.clone());
        }
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &mut Context<Self>) {
        info!("Supervisor Stopped");
    }

    fn on_child_failure(&mut self, child: &ActorPath, error: &ActorError) -> SupervisorDirective {
        warn!("Child {} failed: {}", child, error);
        SupervisorDirective::Stop
    }
}

async fn child(supervisor: &ActorRef<SupervisorMsg>, name: &'static str) -> Result<ActorRef<String>> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    supervisor.tell(SupervisorMsg::Child(name, tx));
    Ok(rx.await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    roost::logging::init_development();

    let system = ActorSystem::new(SystemConfig::named("lifecycle"))?;
    let mut events = system.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SystemEvent::Terminated { actor, reason } => info!("{} terminated ({})", actor, reason),
                SystemEvent::DeadLetter(letter) => {
                    info!("dead letter for {}: {}", letter.recipient, letter.reason)
                }
                _ => {}
            }
        }
    });

    let supervisor = system.spawn_named("supervisor", Supervisor { children: Vec::new() })?;
    let first = child(&supervisor, "first").await?;
    let second = child(&supervisor, "second").await?;
    let third = child(&supervisor, "third").await?;

    // Stop: the queued messages are dropped to dead letters
    for i in 0..3 {
        first.tell(format!("job {i}"));
    }
    first.stop();
    info!("first exited: {}", first.stopped().await);

    // PoisonPill: the queued messages are handled first
    for i in 0..3 {
        second.tell(format!("job {i}"));
    }
    second.poison_pill();
    info!("second exited: {}", second.stopped().await);

    // Kill: the supervisor is told about the failure and keeps running
    third.tell("last job".to_string());
    third.kill();
    info!("third exited: {}", third.stopped().await);

    // GracefulStop: poison the supervisor and wait for the whole tree
    let reason = supervisor.graceful_stop(Duration::from_secs(5)).await?;
    info!("supervisor exited: {}", reason);

    info!("{} dead letters recorded", system.status().dead_letters);
    system.shutdown().await?;
    Ok(())
}
