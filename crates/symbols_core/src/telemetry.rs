//! Telemetry and observability infrastructure
//!
//! Structured logging setup plus a small set of process-wide gauges and
//! counters a host process can sample for operational visibility.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Guards that must be kept alive for logging to work
static LOG_GUARDS: OnceLock<Vec<WorkerGuard>> = OnceLock::new();

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "debug", "symbols_lsp=trace")
    pub log_filter: String,
    /// Directory for log files (None for stderr only)
    pub log_dir: Option<std::path::PathBuf>,
    /// Enable JSON format for logs
    pub json_logs: bool,
    /// Enable span enter/exit events
    pub span_events: bool,
    /// Application name used for the log file prefix
    pub app_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: "info,symbols_lsp=debug".to_string(),
            log_dir: None,
            json_logs: false,
            span_events: false,
            app_name: "symbols".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Verbose configuration suitable for local development
    pub fn development() -> Self {
        Self {
            log_filter: "debug,symbols_lsp=trace".to_string(),
            ..Self::default()
        }
    }

    /// JSON-structured configuration that also rolls logs to disk
    pub fn production(log_dir: impl AsRef<Path>) -> Self {
        Self {
            log_dir: Some(log_dir.as_ref().to_path_buf()),
            json_logs: true,
            ..Self::default()
        }
    }
}

/// Initialize the telemetry system.
///
/// Must never write to stdout: stdout is reserved for the agent-protocol
/// wire in the surrounding process, so all formatted output here targets
/// stderr (or the rolling file appender, if configured). Safe to call more
/// than once; subsequent calls are a no-op.
pub fn init(config: TelemetryConfig) -> crate::Result<()> {
    if LOG_GUARDS.get().is_some() {
        tracing::warn!("telemetry already initialized, ignoring duplicate init() call");
        return Ok(());
    }

    let env_filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if config.span_events {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };

    let mut guards = Vec::new();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(span_events);

    if let Some(log_dir) = &config.log_dir {
        let file_appender = tracing_appender::rolling::daily(log_dir, &config.app_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        guards.push(guard);

        if config.json_logs {
            let file_layer = fmt::layer().json().with_writer(non_blocking);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| crate::Error::Internal(format!("failed to init logging: {e}")))?;
        } else {
            let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| crate::Error::Internal(format!("failed to init logging: {e}")))?;
        }
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| crate::Error::Internal(format!("failed to init logging: {e}")))?;
    }

    LOG_GUARDS
        .set(guards)
        .map_err(|_| crate::Error::Internal("telemetry already initialized".to_string()))?;

    tracing::info!(app = %config.app_name, filter = %config.log_filter, "telemetry initialized");

    Ok(())
}

/// Timing guard for measuring operation duration; logs at `warn` if the
/// operation exceeds its threshold, `debug` otherwise.
pub struct TimingGuard {
    name: &'static str,
    start: std::time::Instant,
    threshold_ms: Option<u64>,
}

impl TimingGuard {
    /// Create a new timing guard for `name`
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: std::time::Instant::now(),
            threshold_ms: None,
        }
    }

    /// Only emit a `warn` log above this many milliseconds
    pub fn with_threshold(mut self, ms: u64) -> Self {
        self.threshold_ms = Some(ms);
        self
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let threshold = self.threshold_ms.unwrap_or(1000);

        if elapsed_ms >= threshold {
            tracing::warn!(operation = %self.name, duration_ms = elapsed_ms, "slow operation");
        } else {
            tracing::debug!(operation = %self.name, duration_ms = elapsed_ms, "operation completed");
        }
    }
}

/// Process-wide operational counters and gauges.
///
/// The core only maintains these; it never pushes them anywhere. A host
/// process samples them (e.g. for a `/metrics` style endpoint) if it wants.
pub mod metrics {
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Monotonically increasing counter
    pub struct Counter {
        value: AtomicU64,
    }

    impl Counter {
        /// Create a new counter starting at zero
        pub const fn new() -> Self {
            Self {
                value: AtomicU64::new(0),
            }
        }

        /// Increment by one
        pub fn increment(&self) {
            self.value.fetch_add(1, Ordering::Relaxed);
        }

        /// Current value
        pub fn get(&self) -> u64 {
            self.value.load(Ordering::Relaxed)
        }
    }

    /// A value that can go up and down
    pub struct Gauge {
        value: AtomicU64,
    }

    impl Gauge {
        /// Create a new gauge starting at zero
        pub const fn new() -> Self {
            Self {
                value: AtomicU64::new(0),
            }
        }

        /// Set the gauge to an absolute value
        pub fn set(&self, value: u64) {
            self.value.store(value, Ordering::Relaxed);
        }

        /// Increment by one
        pub fn increment(&self) {
            self.value.fetch_add(1, Ordering::Relaxed);
        }

        /// Decrement by one, saturating at zero
        pub fn decrement(&self) {
            let _ = self
                .value
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                    Some(v.saturating_sub(1))
                });
        }

        /// Current value
        pub fn get(&self) -> u64 {
            self.value.load(Ordering::Relaxed)
        }
    }

    // Global, process-wide operational metrics.
    pub static ACTIVE_SESSIONS: Gauge = Gauge::new();
    pub static OPEN_DOCUMENTS: Gauge = Gauge::new();
    pub static PENDING_REQUESTS: Gauge = Gauge::new();
    pub static LOG_RING_OCCUPANCY: Gauge = Gauge::new();
    pub static TOOL_CALL_ERRORS: Counter = Counter::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = metrics::Counter::new();
        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_gauge_saturates_at_zero() {
        let gauge = metrics::Gauge::new();
        gauge.decrement();
        assert_eq!(gauge.get(), 0);
        gauge.set(3);
        gauge.decrement();
        gauge.decrement();
        gauge.decrement();
        gauge.decrement();
        assert_eq!(gauge.get(), 0);
    }
}
