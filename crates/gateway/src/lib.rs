//! # Privateer Gateway
//!
//! Capability URLs over an existing access-controlled router.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  facets_middleware ─► auth_middleware ─► Router                  │
//! │                                            │                     │
//! │          ┌─────────────────────────────────┼──────────────┐      │
//! │          ▼                                 ▼              ▼      │
//! │   issuer (POST/GET /_,           RequestDelegationEngine  other  │
//! │           DELETE /_/:token)         (GET /_/:token)      routes  │
//! │          │                                 │                     │
//! │          ▼                                 ▼                     │
//! │    MappingRegistry ◄─────────────── rewrite_request              │
//! │                                            │                     │
//! │                                            ▼                     │
//! │                                  Dispatcher (host router)        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The gateway owns no resources. Whatever serves the delegated request
//! is reached through the [`Dispatcher`] port.

pub mod auth;
pub mod delegation;
pub mod dispatch;
pub mod error;
pub mod facets;
pub mod guard;
pub mod issuer;
pub mod routes;
pub mod state;

pub use auth::auth_middleware;
pub use delegation::{rewrite_request, DelegationDepth, DelegationTarget, RequestDelegationEngine};
pub use dispatch::Dispatcher;
pub use error::{PrivateerError, Result};
pub use facets::{facets_middleware, FilterKind, FilterSpec, RequestFacets};
pub use guard::{CurrentUser, RequireUser};
pub use routes::routes;
pub use state::GatewayState;
