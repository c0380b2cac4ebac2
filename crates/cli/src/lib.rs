//! Privateer host and command implementations

pub mod commands;
pub mod host;

pub use host::Host;
