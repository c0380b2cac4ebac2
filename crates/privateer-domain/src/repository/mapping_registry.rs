//! Mapping Registry - Abstract persistence for capability mappings
//!
//! How the records are stored (memory, files, a database) is the
//! adapter's concern. Token generation also lives in the adapter,
//! since it needs a source of randomness.

use crate::model::mapping::{MappingRecord, Token};

/// Errors that can occur during repository operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Record not found
    NotFound { id: String },
    /// The backing store failed or is unavailable
    PersistenceError { message: String },
}

impl core::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RepositoryError::NotFound { id } => {
                write!(f, "Record not found: {}", id)
            }
            RepositoryError::PersistenceError { message } => {
                write!(f, "Persistence error: {}", message)
            }
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Mapping Registry Trait
///
/// This is a PORT in hexagonal architecture. The issuer and the
/// delegation engine receive it as an injected `Arc<dyn MappingRegistry>`.
///
/// Note: No async here. Store calls are short and synchronous.
pub trait MappingRegistry: Send + Sync {
    /// Persist a new mapping owned by `owner` and return its fresh token
    fn create(&self, target_uri: &str, owner: &str) -> Result<Token, RepositoryError>;

    /// Find a mapping by token
    fn get(&self, token: &Token) -> Result<Option<MappingRecord>, RepositoryError>;

    /// Remove a mapping; `NotFound` if it does not exist
    fn delete(&self, token: &Token) -> Result<(), RepositoryError>;

    /// All mappings whose delegated user is `owner`
    fn list_by_owner(&self, owner: &str) -> Result<Vec<MappingRecord>, RepositoryError>;
}
