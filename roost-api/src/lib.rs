//! # Roost Actor Framework API
//!
//! Roost's programming model: the pieces a user writes against, independent
//! of how the runtime schedules work.
//!
//! ## Core Components
//!
//! - **Actors**: units of computation with private state, a typed message
//!   handler and startup/shutdown hooks
//! - **Lifecycle**: the monotonic `Created → Running → Stopping → Stopped`
//!   state machine every actor goes through
//! - **Addressing**: stable identities and hierarchical paths
//! - **Termination**: the reserved `PoisonPill` and `Kill` markers and the
//!   exit reasons they produce
//! - **Supervision**: the directive a parent returns when a child fails
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use roost::thread::{ActorSystem, Context, SystemConfig};
//! use roost_api::{Actor, ActorResult};
//!
//! struct Greeter;
//!
//! #[async_trait::async_trait]
//! impl Actor for Greeter {
//!     type Message = String;
//!     type Context = Context<Self>;
//!
//!     async fn receive(&mut self, msg: String, _ctx: &mut Context<Self>) -> ActorResult<()> {
//!         println!("hello, {msg}");
//!         Ok(())
//!     }
//! }
//!
//! async fn example() -> anyhow::Result<()> {
//!     let system = ActorSystem::new(SystemConfig::default())?;
//!     let greeter = system.spawn_named("greeter", Greeter)?;
//!     greeter.tell("roost".to_string());
//!     system.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`actor`]: the `Actor` trait and `ActorState`
//! - [`address`]: `ActorId` and `ActorPath`
//! - [`message`]: the `Envelope` wrapper and `ExitReason`
//! - [`supervisor`]: `SupervisorDirective`
//! - [`system`]: system status and event types
//! - [`errors`]: `ActorError`
//! - [`types`]: common aliases

pub mod actor;
pub mod address;
pub mod errors;
pub mod message;
pub mod supervisor;
pub mod system;
pub mod types;

pub use actor::{Actor, ActorState};
pub use address::{ActorId, ActorPath};
pub use errors::ActorError;
pub use message::{Envelope, ExitReason};
pub use supervisor::SupervisorDirective;
pub use system::{DeadLetter, DeadLetterReason, SystemEvent, SystemState, SystemStatus};
pub use types::{ActorResult, BoxedFuture};
