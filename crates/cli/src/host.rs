//! Host - Composes the gateway with the resources it delegates into
//!
//! The host owns every store. Its router serves both the capability URL
//! endpoints and the bag routes, and it is also the gateway's
//! `Dispatcher`: a rewritten request is fed straight back into the same
//! routes, minus the authentication layer, so the delegated identity set
//! by the gateway is the one the bag routes see.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::extract::Request;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use bags::{Bag, BagStore, Policy};
use gateway::{auth_middleware, facets_middleware, Dispatcher, GatewayState};
use privateer_adapter::{InMemoryMappingRegistry, InMemoryUserDirectory, JsonFileMappingRegistry};
use privateer_domain::{MappingRegistry, UserDirectory, MAPPING_COLLECTION};
use shared::ServerConfig;

#[derive(Clone)]
pub struct Host {
    registry: Arc<dyn MappingRegistry>,
    users: Arc<dyn UserDirectory>,
    bags: Arc<BagStore>,
    config: Arc<ServerConfig>,
}

impl Host {
    /// Assemble a host. The mapping collection is (re)created closed to
    /// every caller, whatever the bag store said about it before.
    pub fn new(
        registry: Arc<dyn MappingRegistry>,
        users: Arc<dyn UserDirectory>,
        bags: Arc<BagStore>,
        config: ServerConfig,
    ) -> anyhow::Result<Self> {
        bags.put_bag(Bag::new(MAPPING_COLLECTION, Policy::none()))
            .context("Failed to create mapping collection")?;

        Ok(Self {
            registry,
            users,
            bags,
            config: Arc::new(config),
        })
    }

    /// Build stores from configuration
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let registry: Arc<dyn MappingRegistry> = match &config.store_dir {
            Some(dir) => {
                tracing::info!("Storing mappings under {}", dir.display());
                Arc::new(
                    JsonFileMappingRegistry::new(dir)
                        .with_context(|| format!("Failed to open store {}", dir.display()))?,
                )
            }
            None => {
                tracing::info!("Storing mappings in memory");
                Arc::new(InMemoryMappingRegistry::new())
            }
        };

        let users = InMemoryUserDirectory::new();
        for user in &config.users {
            users
                .put_user(&user.name, &user.password, user.roles.iter().cloned())
                .with_context(|| format!("Failed to add user '{}'", user.name))?;
        }

        let bags = BagStore::from_config(&config.bags).context("Failed to load bags")?;
        tracing::info!(
            users = config.users.len(),
            bags = config.bags.len(),
            "Loaded configuration"
        );

        Self::new(registry, Arc::new(users), Arc::new(bags), config)
    }

    pub fn registry(&self) -> &Arc<dyn MappingRegistry> {
        &self.registry
    }

    pub fn bags(&self) -> &Arc<BagStore> {
        &self.bags
    }

    /// Every route, without the request layers
    pub fn routes(&self) -> Router {
        let state = GatewayState::new(
            self.registry.clone(),
            self.users.clone(),
            Arc::new(self.clone()),
            self.config.clone(),
        );
        bags::routes(self.bags.clone()).merge(gateway::routes(state))
    }

    /// The application served to clients
    pub fn app(&self) -> Router {
        self.routes()
            .layer(from_fn_with_state(self.users.clone(), auth_middleware))
            .layer(from_fn(facets_middleware))
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Dispatcher for Host {
    async fn dispatch(&self, request: Request) -> Response {
        match self.routes().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}
