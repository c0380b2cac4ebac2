//! MappingRecord - The association behind a capability URL
//!
//! MappingRecord is an Entity: its identity is the token.
//! The target URI and delegated user are fixed when the record is
//! created; the only later change a record sees is deletion.

/// Name of the reserved collection holding mapping records.
///
/// Ordinary callers are denied every operation on it. Records are only
/// reachable through the issuer and the delegation engine.
pub const MAPPING_COLLECTION: &str = "PRIVATEER";

/// Opaque, unguessable capability token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted capability mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    /// Capability token (Entity identity)
    token: Token,
    /// Absolute or host-relative URI, possibly with a query
    target_uri: String,
    /// Name of the user the request is re-issued as
    delegated_user: String,
}

impl MappingRecord {
    /// Create a new MappingRecord
    pub fn new(
        token: Token,
        target_uri: impl Into<String>,
        delegated_user: impl Into<String>,
    ) -> Self {
        Self {
            token,
            target_uri: target_uri.into(),
            delegated_user: delegated_user.into(),
        }
    }

    // ========== Getters ==========

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn target_uri(&self) -> &str {
        &self.target_uri
    }

    pub fn delegated_user(&self) -> &str {
        &self.delegated_user
    }

    /// Ownership is the only authorization key for deletion and listing
    pub fn is_owned_by(&self, user: &str) -> bool {
        self.delegated_user == user
    }
}
