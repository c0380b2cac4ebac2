//! # Privateer Adapter Layer
//!
//! Implementations of the domain ports.
//!
//! ## Structure
//!
//! - `repository/in_memory` - `RwLock`-backed registry and user directory
//! - `repository/json_file` - one JSON document per mapping on disk

pub mod repository;

pub use repository::in_memory::{InMemoryMappingRegistry, InMemoryUserDirectory};
pub use repository::json_file::JsonFileMappingRegistry;

/// Generate a fresh capability token (UUID v4, hyphenated)
pub fn generate_token() -> privateer_domain::Token {
    privateer_domain::Token::new(uuid::Uuid::new_v4().to_string())
}
