//! Persistence Adapters - Repository implementations
//!
//! These implement the repository traits from privateer-domain.

pub mod in_memory;
pub mod json_file;
