use roost_api::message::{Envelope, ExitReason};
use roost_api::supervisor::SupervisorDirective;
use roost_api::system::{DeadLetterReason, SystemState};
use roost_api::ActorState;

#[test]
fn test_envelope_kinds() {
    let message: Envelope<&str> = Envelope::Message("hello");

    assert_eq!(message.kind(), "message");
    assert!(!message.is_marker());
    assert_eq!(Envelope::<&str>::PoisonPill.kind(), "poison_pill");
    assert!(Envelope::<&str>::PoisonPill.is_marker());
    assert_eq!(Envelope::<&str>::Kill.kind(), "kill");
    assert!(Envelope::<&str>::Kill.is_marker());
}

#[test]
fn test_exit_reason_display() {
    assert_eq!(ExitReason::Normal.to_string(), "normal");
    assert_eq!(ExitReason::Killed.to_string(), "killed");
    assert_eq!(
        ExitReason::Failed("Actor panicked: boom".to_string()).to_string(),
        "failed: Actor panicked: boom"
    );
    assert!(ExitReason::Normal.is_normal());
    assert!(!ExitReason::Killed.is_normal());
}

#[test]
fn test_actor_state_ordering() {
    assert!(ActorState::Created < ActorState::Running);
    assert!(ActorState::Running < ActorState::Stopping);
    assert!(ActorState::Stopping < ActorState::Stopped);

    assert!(!ActorState::Running.is_terminating());
    assert!(ActorState::Stopping.is_terminating());
    assert!(ActorState::Stopped.is_terminating());
    assert!(ActorState::Stopped.is_stopped());
    assert!(!ActorState::Stopping.is_stopped());
}

#[test]
fn test_defaults_and_display() {
    assert_eq!(SupervisorDirective::default(), SupervisorDirective::Stop);
    assert_eq!(DeadLetterReason::MailboxClosed.to_string(), "mailbox closed");
    assert_eq!(DeadLetterReason::Discarded.to_string(), "discarded on stop");
    assert_ne!(SystemState::Running, SystemState::Stopped);
}
