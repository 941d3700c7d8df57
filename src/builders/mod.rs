//! Builders
//!
//! Fluent builders for client options and messages.

pub mod config;
pub mod message;

pub use config::{o365_options, O365OptionsBuilder};
pub use message::MessageBuilder;
