//! In-Memory Repository Implementations
//!
//! Thread-safe implementations backed by `RwLock<HashMap>`.
//! Used by the default server configuration and by tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

use privateer_domain::{MappingRecord, MappingRegistry, RepositoryError, Token, UserDirectory, Usersign};

use crate::generate_token;

fn read_lock_error() -> RepositoryError {
    RepositoryError::PersistenceError {
        message: "Failed to acquire read lock".to_string(),
    }
}

fn write_lock_error() -> RepositoryError {
    RepositoryError::PersistenceError {
        message: "Failed to acquire write lock".to_string(),
    }
}

/// In-memory Mapping Registry
#[derive(Debug, Clone, Default)]
pub struct InMemoryMappingRegistry {
    mappings: Arc<RwLock<HashMap<String, MappingRecord>>>,
}

impl InMemoryMappingRegistry {
    pub fn new() -> Self {
        Self {
            mappings: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl MappingRegistry for InMemoryMappingRegistry {
    fn create(&self, target_uri: &str, owner: &str) -> Result<Token, RepositoryError> {
        let mut mappings = self.mappings.write().map_err(|_| write_lock_error())?;
        let token = generate_token();
        mappings.insert(
            token.as_str().to_string(),
            MappingRecord::new(token.clone(), target_uri, owner),
        );
        tracing::debug!(token = %token, owner, "mapping created");
        Ok(token)
    }

    fn get(&self, token: &Token) -> Result<Option<MappingRecord>, RepositoryError> {
        let mappings = self.mappings.read().map_err(|_| read_lock_error())?;
        Ok(mappings.get(token.as_str()).cloned())
    }

    fn delete(&self, token: &Token) -> Result<(), RepositoryError> {
        let mut mappings = self.mappings.write().map_err(|_| write_lock_error())?;
        match mappings.remove(token.as_str()) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound {
                id: token.to_string(),
            }),
        }
    }

    fn list_by_owner(&self, owner: &str) -> Result<Vec<MappingRecord>, RepositoryError> {
        let mappings = self.mappings.read().map_err(|_| read_lock_error())?;
        Ok(mappings
            .values()
            .filter(|m| m.is_owned_by(owner))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone)]
struct UserEntry {
    roles: Vec<String>,
    password_digest: String,
}

/// In-memory User Directory
///
/// Passwords are kept as base64 SHA-256 digests salted with the user name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<String, UserEntry>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add or replace a user
    pub fn put_user(
        &self,
        name: &str,
        password: &str,
        roles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().map_err(|_| write_lock_error())?;
        users.insert(
            name.to_string(),
            UserEntry {
                roles: roles.into_iter().map(Into::into).collect(),
                password_digest: digest_password(name, password),
            },
        );
        Ok(())
    }

    /// Remove a user; mappings that delegate to them become invalid
    pub fn remove_user(&self, name: &str) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().map_err(|_| write_lock_error())?;
        Ok(users.remove(name).is_some())
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get(&self, name: &str) -> Result<Option<Usersign>, RepositoryError> {
        let users = self.users.read().map_err(|_| read_lock_error())?;
        Ok(users
            .get(name)
            .map(|entry| Usersign::new(name, entry.roles.clone())))
    }

    fn verify_password(&self, name: &str, password: &str) -> Result<bool, RepositoryError> {
        let users = self.users.read().map_err(|_| read_lock_error())?;
        Ok(match users.get(name) {
            Some(entry) => constant_time_eq(
                entry.password_digest.as_bytes(),
                digest_password(name, password).as_bytes(),
            ),
            None => false,
        })
    }
}

fn digest_password(name: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    general_purpose::STANDARD.encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
