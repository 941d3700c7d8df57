//! Logging
//!
//! Structured logging for login and send operations.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Context attached to a log entry.
#[derive(Debug, Clone, Default)]
pub struct O365LogContext {
    /// Operation name, e.g. `login` or `send_email`.
    pub operation: Option<String>,
    /// Application (client) id.
    pub client_id: Option<String>,
    /// `client-request-id` of the outgoing request.
    pub request_id: Option<String>,
    /// Rendered cause of a failure.
    pub error: Option<String>,
    /// Additional context.
    pub extra: BTreeMap<String, String>,
}

impl O365LogContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set operation.
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set request ID.
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Set the failure cause.
    pub fn error(mut self, error: impl std::fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    /// Add extra context.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn render_extra(&self) -> String {
        self.extra
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logger interface.
pub trait Logger: Send + Sync {
    /// Log at trace level.
    fn trace(&self, message: &str, context: &O365LogContext);

    /// Log at debug level.
    fn debug(&self, message: &str, context: &O365LogContext);

    /// Log at info level.
    fn info(&self, message: &str, context: &O365LogContext);

    /// Log at warn level.
    fn warn(&self, message: &str, context: &O365LogContext);

    /// Log at error level.
    fn error(&self, message: &str, context: &O365LogContext);

    /// Check if a log level is enabled.
    fn is_enabled(&self, level: LogLevel) -> bool;
}

/// Logger that discards everything.
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn trace(&self, _message: &str, _context: &O365LogContext) {}
    fn debug(&self, _message: &str, _context: &O365LogContext) {}
    fn info(&self, _message: &str, _context: &O365LogContext) {}
    fn warn(&self, _message: &str, _context: &O365LogContext) {}
    fn error(&self, _message: &str, _context: &O365LogContext) {}
    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// Logger that forwards entries to `tracing` events.
///
/// Filtering is left to the installed subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

macro_rules! forward {
    ($macro:ident, $message:expr, $context:expr) => {{
        let context = $context;
        tracing::$macro!(
            operation = context.operation.as_deref().unwrap_or(""),
            client_id = context.client_id.as_deref().unwrap_or(""),
            request_id = context.request_id.as_deref().unwrap_or(""),
            error = context.error.as_deref().unwrap_or(""),
            extra = %context.render_extra(),
            "{}",
            $message
        );
    }};
}

impl Logger for TracingLogger {
    fn trace(&self, message: &str, context: &O365LogContext) {
        forward!(trace, message, context);
    }

    fn debug(&self, message: &str, context: &O365LogContext) {
        forward!(debug, message, context);
    }

    fn info(&self, message: &str, context: &O365LogContext) {
        forward!(info, message, context);
    }

    fn warn(&self, message: &str, context: &O365LogContext) {
        forward!(warn, message, context);
    }

    fn error(&self, message: &str, context: &O365LogContext) {
        forward!(error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(tracing::Level::ERROR),
        }
    }
}

/// Log entry for in-memory storage.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Context passed with the message.
    pub context: O365LogContext,
    /// Time the entry was recorded.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// In-memory logger for testing.
pub struct InMemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
    min_level: LogLevel,
}

impl InMemoryLogger {
    /// Create an in-memory logger capturing every level.
    pub fn new() -> Self {
        Self::with_level(LogLevel::Trace)
    }

    /// Create in-memory logger with minimum level.
    pub fn with_level(min_level: LogLevel) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            min_level,
        }
    }

    /// Get all log entries.
    pub fn get_entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Get entries by level.
    pub fn get_entries_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn log(&self, level: LogLevel, message: &str, context: &O365LogContext) {
        if level >= self.min_level {
            self.entries.lock().unwrap().push(LogEntry {
                level,
                message: message.to_string(),
                context: context.clone(),
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Default for InMemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for InMemoryLogger {
    fn trace(&self, message: &str, context: &O365LogContext) {
        self.log(LogLevel::Trace, message, context);
    }

    fn debug(&self, message: &str, context: &O365LogContext) {
        self.log(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: &O365LogContext) {
        self.log(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: &O365LogContext) {
        self.log(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: &O365LogContext) {
        self.log(LogLevel::Error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}
