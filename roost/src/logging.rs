// Logging for Roost
//
// The runtime reports through `tracing`. This module installs a global
// subscriber and provides the structured macros the runtime uses, so every
// lifecycle transition, dead letter and scheduling event carries the same
// field names.
//
// # Usage Examples
//
// ```rust,ignore
// use roost::logging;
//
// // INFO level, human readable console output
// logging::init_default();
//
// // JSON lines for log shippers
// logging::init(logging::LogConfig::production());
//
// // Or pick the fields yourself
// logging::init(logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: true,
//     ..Default::default()
// });
// ```
//
// Filters from `RUST_LOG` are honoured on top of the configured level, e.g.
// `RUST_LOG=roost::thread::actor=trace`.

use std::io;
use std::sync::Once;

use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

// Re-exported so the macros below resolve without the caller depending on
// `tracing` directly.
pub use tracing;

/// Configuration for the logging subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

impl LogConfig {
    /// DEBUG everywhere, TRACE for the runtime internals.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            target_filters: Some("roost=debug,roost::thread=trace".to_string()),
            ..Default::default()
        }
    }

    /// JSON lines at INFO, without source locations.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            show_file_line: false,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }

    /// Warnings and errors only, compact, for test runs.
    pub fn test() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            show_file_line: true,
            show_thread_info: false,
            show_time: false,
            target_filters: None,
        }
    }
}

// Only the first initialization takes effect
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(config.level.into());
    if let Some(filters) = &config.target_filters {
        for directive in filters.split(',').filter_map(|f| f.trim().parse().ok()) {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn console_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if config.json_format {
        return fmt::layer()
            .json()
            .flatten_event(true)
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info)
            .boxed();
    }

    let layer = fmt::layer()
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_file(config.show_file_line)
        .with_line_number(config.show_file_line)
        .with_thread_names(config.show_thread_info)
        .with_thread_ids(config.show_thread_info);

    if config.show_time {
        layer.boxed()
    } else {
        layer.without_time().boxed()
    }
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Install the global subscriber. Only the first call in a process has any
/// effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer(&config));
        set_global_subscriber(subscriber);
    });
}

/// Open `path` for appending, creating it if needed.
pub fn file_writer(path: &str) -> io::Result<std::fs::File> {
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Log to the console as configured and, in plain text, to `log_file`.
///
/// The file is opened up front so a bad path is reported to the caller
/// instead of being swallowed later.
pub fn init_with_file(config: LogConfig, log_file: &str) -> io::Result<()> {
    let file = file_writer(log_file)?;
    INIT.call_once(move || {
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer(&config))
            .with(file_layer);
        set_global_subscriber(subscriber);
    });
    Ok(())
}

/// INFO level, human readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

pub fn init_development() {
    init(LogConfig::development());
}

pub fn init_test() {
    init(LogConfig::test());
}

/// Span wrapping work done on behalf of one actor.
///
/// ```rust,ignore
/// let span = roost::actor_span!("Supervisor", "roost://sys/user/supervisor");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! actor_span {
    ($actor_type:expr, $actor_path:expr) => {
        $crate::logging::tracing::debug_span!("actor", actor_type = $actor_type, actor = %$actor_path)
    };
    ($actor_type:expr, $actor_path:expr, $($fields:tt)*) => {
        $crate::logging::tracing::debug_span!("actor", actor_type = $actor_type, actor = %$actor_path, $($fields)*)
    };
}

/// Span for system level operations such as start and shutdown.
#[macro_export]
macro_rules! system_span {
    ($operation:expr) => {
        $crate::logging::tracing::info_span!("system", operation = $operation)
    };
    ($operation:expr, $($fields:tt)*) => {
        $crate::logging::tracing::info_span!("system", operation = $operation, $($fields)*)
    };
}

/// Lifecycle transition of an actor.
///
/// ```rust,ignore
/// roost::log_lifecycle!("Worker", path, "stopped", reason = "normal");
/// ```
#[macro_export]
macro_rules! log_lifecycle {
    ($actor_type:expr, $actor_path:expr, $event:expr) => {
        $crate::logging::tracing::debug!(actor_type = $actor_type, actor = %$actor_path, event = $event)
    };
    ($actor_type:expr, $actor_path:expr, $event:expr, $($fields:tt)*) => {
        $crate::logging::tracing::debug!(actor_type = $actor_type, actor = %$actor_path, event = $event, $($fields)*)
    };
}

/// Message delivery events: dead letters, unhandled messages, discards.
#[macro_export]
macro_rules! log_message {
    ($message_type:expr, $status:expr) => {
        $crate::logging::tracing::debug!(message_type = $message_type, status = $status)
    };
    ($message_type:expr, $status:expr, $($fields:tt)*) => {
        $crate::logging::tracing::debug!(message_type = $message_type, status = $status, $($fields)*)
    };
}

/// System level state changes.
#[macro_export]
macro_rules! log_system {
    ($operation:expr, $status:expr) => {
        $crate::logging::tracing::info!(operation = $operation, status = $status)
    };
    ($operation:expr, $status:expr, $($fields:tt)*) => {
        $crate::logging::tracing::info!(operation = $operation, status = $status, $($fields)*)
    };
}

/// Error conditions. The first argument must implement `Display`.
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        $crate::logging::tracing::error!(error = %$error)
    };
    ($error:expr, $($fields:tt)*) => {
        $crate::logging::tracing::error!(error = %$error, $($fields)*)
    };
}

/// Dispatcher events, at TRACE/DEBUG volume.
#[macro_export]
macro_rules! log_scheduler {
    ($scheduler:expr, $event:expr) => {
        $crate::logging::tracing::debug!(scheduler = $scheduler, event = $event)
    };
    ($scheduler:expr, $event:expr, $($fields:tt)*) => {
        $crate::logging::tracing::debug!(scheduler = $scheduler, event = $event, $($fields)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_pick_their_level_and_format() {
        let development = LogConfig::development();
        assert_eq!(development.level, Level::DEBUG);
        assert!(!development.json_format);

        let production = LogConfig::production();
        assert!(production.json_format);
        assert!(!production.show_file_line);

        let test = LogConfig::test();
        assert_eq!(test.level, Level::WARN);
        assert!(!test.show_time);
    }

    #[test]
    fn target_filters_are_added_to_the_level() {
        let filter = env_filter(&LogConfig::development()).to_string();
        assert!(filter.contains("roost::thread=trace"), "{filter}");
        assert!(filter.contains("debug"), "{filter}");
    }

    #[test]
    fn file_writer_appends() {
        let path = std::env::temp_dir().join(format!("roost-log-{}.log", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        {
            use std::io::Write;
            writeln!(file_writer(&path).unwrap(), "first").unwrap();
            writeln!(file_writer(&path).unwrap(), "second").unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn init_with_file_reports_a_bad_path() {
        let missing = std::env::temp_dir().join("roost-no-such-dir").join("roost.log");
        let result = init_with_file(LogConfig::test(), &missing.to_string_lossy());
        assert!(result.is_err());
    }
}
