//! Gateway routes
//!
//! | Method | Path         | Handler                   |
//! |--------|--------------|---------------------------|
//! | GET    | `/_`         | `issuer::list_mappings`   |
//! | POST   | `/_`         | `issuer::create_mapping`  |
//! | GET    | `/_/:token`  | `resolve_mapping`         |
//! | DELETE | `/_/:token`  | `issuer::delete_mapping`  |
//!
//! Any other method on these paths is `405 Method Not Allowed`.

use axum::extract::{Path, Request, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use privateer_domain::Token;

use crate::error::{PrivateerError, Result};
use crate::issuer::{create_mapping, delete_mapping, list_mappings};
use crate::state::GatewayState;

/// GET /_/:token
pub async fn resolve_mapping(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
    request: Request,
) -> Result<Response> {
    state.engine.resolve(&Token::new(token), request).await
}

async fn method_not_allowed() -> PrivateerError {
    PrivateerError::MethodNotAllowed
}

/// Capability URL routes with their state applied
pub fn routes(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/_",
            get(list_mappings)
                .post(create_mapping)
                .fallback(method_not_allowed),
        )
        .route(
            "/_/:token",
            get(resolve_mapping)
                .delete(delete_mapping)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}
