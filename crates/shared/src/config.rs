//! Configuration types for Privateer

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::ConfigError;

/// Top-level server configuration (privateer.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Scheme used when building public capability URLs
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Public host[:port], used when a request has no Host header
    #[serde(default)]
    pub server_host: Option<String>,

    /// Path prefix the server is mounted under (e.g. "/wiki")
    #[serde(default)]
    pub server_prefix: String,

    /// Maximum number of capability URLs resolved for one request
    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_depth: usize,

    /// Directory for persistent mappings; in-memory when absent
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Users to seed at startup
    #[serde(default)]
    pub users: Vec<UserConfig>,

    /// Bags to seed at startup
    #[serde(default)]
    pub bags: Vec<BagConfig>,
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Access policy lists. An empty list admits everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub write: Vec<String>,
    #[serde(default)]
    pub create: Vec<String>,
    #[serde(default)]
    pub manage: Vec<String>,
    #[serde(default)]
    pub accept: Vec<String>,
}

/// A bag and its initial contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BagConfig {
    pub name: String,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub tiddlers: Vec<TiddlerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiddlerConfig {
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_max_delegation_depth() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            scheme: default_scheme(),
            server_host: None,
            server_prefix: String::new(),
            max_delegation_depth: default_max_delegation_depth(),
            store_dir: None,
            users: Vec::new(),
            bags: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(ConfigError::Invalid(format!(
                "scheme must be http or https, got '{}'",
                self.scheme
            )));
        }
        if !self.server_prefix.is_empty()
            && (!self.server_prefix.starts_with('/') || self.server_prefix.ends_with('/'))
        {
            return Err(ConfigError::Invalid(format!(
                "serverPrefix must start with '/' and not end with '/', got '{}'",
                self.server_prefix
            )));
        }
        if self.max_delegation_depth == 0 {
            return Err(ConfigError::Invalid(
                "maxDelegationDepth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Address string for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Host used in capability URLs when the request names none
    pub fn public_host(&self) -> String {
        self.server_host.clone().unwrap_or_else(|| self.listen_addr())
    }
}
