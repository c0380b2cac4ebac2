//! # Privateer Shared
//!
//! Configuration types used by the gateway, the bag store and the CLI.

pub mod config;
pub mod error;

// Re-exports
pub use config::*;
pub use error::*;
