use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use roost::thread::{ActorSystem, Context, SystemConfig};
use roost::{Actor, ActorResult};
use tracing::info;

// Prints every greeting it receives
struct Greeter;

#[async_trait]
impl Actor for Greeter {
    type Message = String;
    type Context = Context<Self>;

    async fn on_start(&mut self, ctx: &mut Context<Self>) -> ActorResult<()> {
        info!("Greeter started at {}", ctx.path());
        Ok(())
    }

    async fn receive(&mut self, msg: String, _ctx: &mut Context<Self>) -> ActorResult<()> {
        info!("Received: {}", msg);
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &mut Context<Self>) {
        info!("Greeter stopped");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    roost::logging::init_default();

    let system = ActorSystem::new(SystemConfig::named("flight-booking"))?;
    let greeter = system.spawn_named("greeter", Greeter)?;

    greeter.tell("Hello from the booking desk".to_string());
    greeter.tell("Seat 12A is confirmed".to_string());

    let reason = greeter.graceful_stop(Duration::from_secs(5)).await?;
    info!("Greeter exited: {}", reason);

    system.shutdown().await?;
    Ok(())
}
