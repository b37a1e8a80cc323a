//! Logging infrastructure - structured tracing for the boundary runtime
//!
//! Design: uses `tracing` for structured, contextual logging with:
//! - Configurable level through `SEQBIND_LOG_LEVEL`
//! - Zero cost when disabled
//! - Optional JSON output and span events
//!
//! The host embedding calls [`init`] (or `seqbind_runtime_init` over the C
//! ABI) once; repeated calls are no-ops.

use once_cell::sync::OnceCell;
use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::refnum::Handle;

pub use tracing::{debug, error, info, trace, warn};

static LOGGER_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level
    pub level: Level,
    /// Enable JSON format (vs human-readable)
    pub json_format: bool,
    /// Show span events (enter/exit)
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // SEQBIND_LOG_LEVEL: trace, debug, info, warn, error
        if let Ok(level) = std::env::var("SEQBIND_LOG_LEVEL") {
            config.level = parse_level(&level);
        }

        config.json_format = std::env::var("SEQBIND_LOG_JSON").is_ok();
        config.show_spans = std::env::var("SEQBIND_LOG_SPANS").is_ok();

        config
    }

    /// Errors only
    pub fn quiet() -> Self {
        Self {
            level: Level::ERROR,
            ..Self::default()
        }
    }

    /// Everything, including per-handle traces
    pub fn verbose() -> Self {
        Self {
            level: Level::TRACE,
            json_format: false,
            show_spans: true,
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize logging from the environment
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Initialize logging with custom configuration.
///
/// Leaves an already installed global subscriber in place.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "seqbind_runtime={}",
                config.level.as_str().to_lowercase()
            ))
        });

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_span_events(span_events)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(io::stderr)
                .with_span_events(span_events)
                .with_target(true)
                .with_thread_ids(cfg!(debug_assertions))
                .boxed()
        };

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init();
    });
}

/// Check if logging is initialized
pub fn is_initialized() -> bool {
    LOGGER_INITIALIZED.get().is_some()
}

// ============================================================================
// Registry events
// ============================================================================

/// Log a registration or re-crossing
#[inline]
pub fn log_register(handle: Handle, refcount: u32, fresh: bool) {
    trace!(
        event = "register",
        handle,
        refcount,
        fresh,
        "handle registered"
    );
}

/// Log a release
#[inline]
pub fn log_release(handle: Handle, remaining: u32) {
    trace!(
        event = "release",
        handle,
        remaining,
        "handle released"
    );
}

/// Log a foreign-runtime protocol violation
pub fn log_protocol_violation(handle: Handle, violation: &str) {
    error!(
        event = "protocol_violation",
        handle,
        violation,
        "reference protocol violation"
    );
}

/// Log the managed side dropping its last proxy to a foreign object
#[inline]
pub fn log_finalize(handle: Handle) {
    debug!(
        event = "finalize",
        handle,
        "foreign object finalized"
    );
}

// ============================================================================
// Call boundary events
// ============================================================================

/// Log a foreign exception surfacing in managed code
pub fn log_foreign_exception(handle: Handle, description: &str, fatal: bool) {
    debug!(
        event = "foreign_exception",
        handle,
        description,
        fatal,
        "foreign exception received"
    );
}

/// Log a stub invocation from a foreign runtime
#[inline]
pub fn log_stub_invoke(class: &str, method: &str, args: usize) {
    trace!(
        event = "stub_invoke",
        class,
        method,
        args,
        "stub invoked"
    );
}

/// Log a stub call that ends in an exception for the foreign caller
pub fn log_stub_failure(class: &str, method: &str, reason: &str) {
    warn!(
        event = "stub_failure",
        class,
        method,
        reason,
        "stub raised"
    );
}

/// Log runtime initialization
pub fn log_runtime_init() {
    info!(event = "runtime_init", "seqbind runtime initializing");
}

/// Log runtime shutdown
pub fn log_runtime_shutdown() {
    info!(event = "runtime_shutdown", "seqbind runtime shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);

        assert_eq!(LogConfig::quiet().level, Level::ERROR);

        let verbose = LogConfig::verbose();
        assert_eq!(verbose.level, Level::TRACE);
        assert!(verbose.show_spans);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("nonsense"), Level::INFO);
    }

    #[test]
    fn test_init_idempotent() {
        init();
        init();
        assert!(is_initialized());
    }
}
