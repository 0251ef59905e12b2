// Integration tests for config types in roost::thread::config

use roost::thread::config::*;
use roost::thread::SystemError;
use std::time::Duration;

#[test]
fn test_system_config_defaults() {
    let config = SystemConfig::default();

    assert_eq!(config.name, "roost");
    assert_eq!(config.worker_count, num_cpus::get());
    assert_eq!(config.throughput, DEFAULT_THROUGHPUT);
    assert_eq!(config.throughput, 10);
    assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    assert_eq!(config.dead_letter_capacity, DEFAULT_DEAD_LETTER_CAPACITY);
    assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    assert!(config.validate().is_ok());
}

#[test]
fn test_named_config() {
    let config = SystemConfig::named("flight-booking");

    assert_eq!(config.name, "flight-booking");
    assert_eq!(config.shutdown_timeout, SystemConfig::default().shutdown_timeout);
}

#[test]
fn test_config_validation() {
    let invalid = [
        SystemConfig::named(""),
        SystemConfig::named("a/b"),
        SystemConfig {
            worker_count: 0,
            ..Default::default()
        },
        SystemConfig {
            throughput: 0,
            ..Default::default()
        },
        SystemConfig {
            event_capacity: 0,
            ..Default::default()
        },
    ];
    for config in invalid {
        assert!(
            matches!(config.validate(), Err(SystemError::ConfigError(_))),
            "{config:?} should be rejected"
        );
    }

    // Retaining no dead letters is allowed; the total is still counted.
    let config = SystemConfig {
        dead_letter_capacity: 0,
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_debug_format() {
    let config = SystemConfig::default();
    // Basic check to ensure Debug trait doesn't panic
    assert!(format!("{:?}", config).contains("worker_count"));
}
