//! Types
//!
//! Configuration, message and result types.

pub mod config;
pub mod message;
pub mod response;

pub use config::*;
pub use message::*;
pub use response::*;
