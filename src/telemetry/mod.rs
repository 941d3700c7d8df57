//! Telemetry
//!
//! Structured logging with per-operation context.

pub mod logging;

pub use logging::{
    InMemoryLogger, LogEntry, LogLevel, Logger, NoOpLogger, O365LogContext, TracingLogger,
};
