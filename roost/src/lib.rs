// Roost Actor Runtime
//
// This crate runs actors written against `roost-api` on a fixed pool of
// tokio worker tasks. The runtime lives in the `thread` module; `logging`
// configures the `tracing` subscriber the runtime reports through.

pub mod logging;
pub mod thread;

// Re-export commonly used types
pub use roost_api::{
    Actor, ActorError, ActorId, ActorPath, ActorResult, ActorState, DeadLetter, DeadLetterReason,
    Envelope, ExitReason, SupervisorDirective, SystemEvent, SystemState, SystemStatus,
};
pub use thread::{ActorRef, ActorSystem, Context, Recipient, SystemConfig};

// Actor implementations need it for their async hooks.
pub use async_trait::async_trait;
