//! Dispatcher - The routing layer as seen from the delegation engine
//!
//! This is a PORT: the host that owns the full router implements it, so
//! the gateway can re-run a rewritten request without knowing which
//! resources exist.

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Route and handle `request`, returning the handler's response as-is
    async fn dispatch(&self, request: Request) -> Response;
}
