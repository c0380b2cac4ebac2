//! Shared handler state

use std::sync::Arc;

use axum::http::{header, HeaderMap};

use privateer_domain::{MappingRegistry, Token, UserDirectory};
use shared::ServerConfig;

use crate::delegation::RequestDelegationEngine;
use crate::dispatch::Dispatcher;

/// State handed to every gateway handler
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<dyn MappingRegistry>,
    pub config: Arc<ServerConfig>,
    pub engine: Arc<RequestDelegationEngine>,
}

impl GatewayState {
    pub fn new(
        registry: Arc<dyn MappingRegistry>,
        users: Arc<dyn UserDirectory>,
        dispatcher: Arc<dyn Dispatcher>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let engine = RequestDelegationEngine::new(registry.clone(), users, dispatcher)
            .with_max_depth(config.max_delegation_depth)
            .with_server_prefix(config.server_prefix.clone());

        Self {
            registry,
            config,
            engine: Arc::new(engine),
        }
    }

    /// `<scheme>://<host><prefix>`, host taken from the request when present
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.public_host());

        format!("{}://{}{}", self.config.scheme, host, self.config.server_prefix)
    }

    /// Public URL at which `token` resolves
    pub fn capability_url(&self, headers: &HeaderMap, token: &Token) -> String {
        format!("{}/_/{}", self.base_url(headers), token)
    }
}
