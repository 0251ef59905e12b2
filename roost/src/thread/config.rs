use std::time::Duration;

use crate::thread::error::SystemError;

/// Messages a worker processes from one mailbox before yielding it.
pub const DEFAULT_THROUGHPUT: usize = 10;
/// Dead letters kept for inspection before the oldest are evicted.
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 512;
/// Buffered events per subscriber before slow subscribers start lagging.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Configuration for an `ActorSystem`.
#[derive(Clone, Debug)]
pub struct SystemConfig {
    /// Name of the system, used as the authority of every actor path.
    pub name: String,

    /// Number of worker tasks draining mailboxes.
    pub worker_count: usize,

    /// Max user messages processed in one scheduling run before the
    /// mailbox goes to the back of the queue.
    pub throughput: usize,

    /// How long `ActorSystem::shutdown` waits for the actor tree to stop.
    pub shutdown_timeout: Duration,

    /// Number of dead letters retained by the system.
    pub dead_letter_capacity: usize,

    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: "roost".to_string(),
            worker_count: num_cpus::get(),
            throughput: DEFAULT_THROUGHPUT,
            shutdown_timeout: Duration::from_secs(10),
            dead_letter_capacity: DEFAULT_DEAD_LETTER_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SystemConfig {
    /// Default configuration with the given system name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check the configuration before a system is built from it.
    pub fn validate(&self) -> Result<(), SystemError> {
        if self.name.is_empty() || self.name.contains('/') {
            return Err(SystemError::ConfigError(format!(
                "invalid system name '{}'",
                self.name
            )));
        }
        if self.worker_count == 0 {
            return Err(SystemError::ConfigError(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.throughput == 0 {
            return Err(SystemError::ConfigError(
                "throughput must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(SystemError::ConfigError(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keeps_defaults() {
        let config = SystemConfig::named("bookings");
        assert_eq!(config.name, "bookings");
        assert_eq!(config.throughput, DEFAULT_THROUGHPUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = SystemConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SystemError::ConfigError(_))));
    }

    #[test]
    fn slash_in_name_is_rejected() {
        assert!(SystemConfig::named("a/b").validate().is_err());
        assert!(SystemConfig::named("").validate().is_err());
    }
}
