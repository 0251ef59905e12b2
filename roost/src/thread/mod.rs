#![doc = " Worker-pool based actor runtime for Roost."]

pub(crate) mod actor;
pub mod address;
pub mod config;
pub mod context;
pub(crate) mod dead_letter;
pub(crate) mod envelope;
pub mod error;
pub(crate) mod mailbox;
pub(crate) mod scheduler;
pub mod system;

// Re-export key types for easier usage
pub use address::{ActorRef, Recipient};
pub use config::SystemConfig;
pub use context::Context;
pub use error::{MailboxError, SpawnError, StopError, SystemError};
pub use system::ActorSystem;
