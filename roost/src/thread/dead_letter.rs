use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use roost_api::{ActorPath, DeadLetter, DeadLetterReason, SystemEvent};
use tokio::sync::broadcast;

use crate::log_message;

/// Bounded record of undeliverable messages.
///
/// Keeps the most recent `capacity` entries and a running total. Every
/// recorded letter is also published on the system event stream.
#[derive(Debug)]
pub(crate) struct DeadLetters {
    entries: Mutex<VecDeque<DeadLetter>>,
    capacity: usize,
    total: AtomicU64,
}

impl DeadLetters {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            total: AtomicU64::new(0),
        }
    }

    pub fn record(
        &self,
        recipient: &ActorPath,
        message_type: &'static str,
        reason: DeadLetterReason,
        events: &broadcast::Sender<SystemEvent>,
    ) {
        let letter = DeadLetter {
            recipient: recipient.clone(),
            message_type,
            reason,
            timestamp: SystemTime::now(),
        };
        log_message!(message_type, "dead_letter", recipient = %recipient, reason = %reason);

        self.total.fetch_add(1, Ordering::Relaxed);
        if self.capacity > 0 {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(letter.clone());
        }
        // No subscribers is fine.
        let _ = events.send(SystemEvent::DeadLetter(letter));
    }

    /// Retained letters, oldest first.
    pub fn snapshot(&self) -> Vec<DeadLetter> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let (events, _rx) = broadcast::channel(16);
        let store = DeadLetters::new(2);
        for name in ["a", "b", "c"] {
            store.record(
                &ActorPath::top_level("test", name),
                "u32",
                DeadLetterReason::MailboxClosed,
                &events,
            );
        }
        let names: Vec<_> = store
            .snapshot()
            .iter()
            .map(|l| l.recipient.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(store.total(), 3);
    }

    #[test]
    fn publishes_each_letter() {
        let (events, mut rx) = broadcast::channel(16);
        let store = DeadLetters::new(8);
        store.record(
            &ActorPath::top_level("test", "gone"),
            "alloc::string::String",
            DeadLetterReason::Discarded,
            &events,
        );
        match rx.try_recv() {
            Ok(SystemEvent::DeadLetter(letter)) => {
                assert_eq!(letter.reason, DeadLetterReason::Discarded);
                assert_eq!(letter.message_type, "alloc::string::String");
            }
            other => panic!("expected a dead letter event, got {:?}", other),
        }
    }
}
