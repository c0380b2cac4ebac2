//! File-backed Mapping Registry
//!
//! Each mapping is stored as `<store_dir>/PRIVATEER/<token>.json`:
//!
//! ```json
//! {"token": "…", "uri": "/bags/ho/tiddlers/junk", "user": "cdent"}
//! ```
//!
//! Only canonical UUID tokens ever reach the filesystem; anything else is
//! looked up as absent, so a token cannot name a path outside the store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use privateer_domain::{MappingRecord, MappingRegistry, RepositoryError, Token, MAPPING_COLLECTION};

use crate::generate_token;

/// On-disk form of a mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMapping {
    token: String,
    uri: String,
    user: String,
}

impl From<StoredMapping> for MappingRecord {
    fn from(stored: StoredMapping) -> Self {
        MappingRecord::new(Token::new(stored.token), stored.uri, stored.user)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::PersistenceError {
        message: format!("{}: {}", path.display(), err),
    }
}

/// Persistent registry, one JSON document per mapping
#[derive(Debug, Clone)]
pub struct JsonFileMappingRegistry {
    collection_dir: PathBuf,
}

impl JsonFileMappingRegistry {
    /// Open (creating if needed) the mapping collection under `store_dir`
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let collection_dir = store_dir.as_ref().join(MAPPING_COLLECTION);
        fs::create_dir_all(&collection_dir).map_err(|e| io_error(&collection_dir, e))?;
        Ok(Self { collection_dir })
    }

    pub fn collection_dir(&self) -> &Path {
        &self.collection_dir
    }

    fn mapping_file(&self, token: &Token) -> Option<PathBuf> {
        let parsed = Uuid::parse_str(token.as_str()).ok()?;
        if parsed.hyphenated().to_string() != token.as_str() {
            return None;
        }
        Some(self.collection_dir.join(format!("{}.json", token.as_str())))
    }

    fn read_mapping(path: &Path) -> Result<StoredMapping, RepositoryError> {
        let json = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        serde_json::from_str(&json).map_err(|e| RepositoryError::PersistenceError {
            message: format!("{}: {}", path.display(), e),
        })
    }
}

impl MappingRegistry for JsonFileMappingRegistry {
    fn create(&self, target_uri: &str, owner: &str) -> Result<Token, RepositoryError> {
        let token = generate_token();
        let path = self
            .mapping_file(&token)
            .ok_or_else(|| RepositoryError::PersistenceError {
                message: format!("generated token is not a canonical uuid: {}", token),
            })?;

        let stored = StoredMapping {
            token: token.as_str().to_string(),
            uri: target_uri.to_string(),
            user: owner.to_string(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| {
            RepositoryError::PersistenceError {
                message: e.to_string(),
            }
        })?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;

        tracing::debug!(token = %token, owner, "mapping written to {}", path.display());
        Ok(token)
    }

    fn get(&self, token: &Token) -> Result<Option<MappingRecord>, RepositoryError> {
        let path = match self.mapping_file(token) {
            Some(path) => path,
            None => return Ok(None),
        };
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_mapping(&path)?.into()))
    }

    fn delete(&self, token: &Token) -> Result<(), RepositoryError> {
        let not_found = || RepositoryError::NotFound {
            id: token.to_string(),
        };
        let path = self.mapping_file(token).ok_or_else(not_found)?;
        if !path.exists() {
            return Err(not_found());
        }
        fs::remove_file(&path).map_err(|e| io_error(&path, e))
    }

    fn list_by_owner(&self, owner: &str) -> Result<Vec<MappingRecord>, RepositoryError> {
        let entries =
            fs::read_dir(&self.collection_dir).map_err(|e| io_error(&self.collection_dir, e))?;

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error(&self.collection_dir, e))?.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            match Self::read_mapping(&path) {
                Ok(stored) if stored.user == owner => records.push(stored.into()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("skipping unreadable mapping document");
                    tracing::debug!("{}", e);
                }
            }
        }
        Ok(records)
    }
}
