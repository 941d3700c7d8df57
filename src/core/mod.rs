//! Core Components
//!
//! HTTP transport and the base-address-bound backchannel.

pub mod backchannel;
pub mod transport;

pub use backchannel::*;
pub use transport::*;
