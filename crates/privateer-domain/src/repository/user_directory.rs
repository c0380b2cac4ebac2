//! User Directory - Lookup of the users a mapping can delegate to
//!
//! User records and mapping records have independent lifecycles: a user
//! named by a mapping may have been removed since the mapping was made.
//! Callers must treat `Ok(None)` from `get` as a normal outcome.

use crate::model::usersign::Usersign;
use crate::repository::mapping_registry::RepositoryError;

/// User Directory Trait
///
/// This is a PORT in hexagonal architecture.
pub trait UserDirectory: Send + Sync {
    /// Resolve a user name to a full identity (name + roles)
    fn get(&self, name: &str) -> Result<Option<Usersign>, RepositoryError>;

    /// Check a password for the named user. Unknown users never verify.
    fn verify_password(&self, name: &str, password: &str) -> Result<bool, RepositoryError>;
}
