//! Capability Issuer - create, list and revoke mappings
//!
//! All three handlers start with the `RequireUser` guard, so a guest is
//! turned away before the registry is touched. Deleting someone else's
//! mapping looks exactly like deleting one that never existed.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use privateer_domain::Token;

use crate::error::{PrivateerError, Result};
use crate::guard::RequireUser;
use crate::state::GatewayState;

const NO_URI: &str = "No uri for mapping provided";

/// Pull the target `uri` out of a create request
///
/// JSON bodies must be an object with a string `uri`. Anything else is
/// treated as a form body; a `uri` query parameter is the last resort.
pub fn mapping_uri(headers: &HeaderMap, uri: &Uri, body: &[u8]) -> Result<String> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let media_type = content_type.split(';').next().unwrap_or("").trim();

    let value = if media_type.eq_ignore_ascii_case("application/json") {
        let json: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| PrivateerError::bad_request(format!("unable to parse JSON body: {}", e)))?;
        json.get("uri").and_then(|v| v.as_str()).map(str::to_string)
    } else {
        form_value(body, "uri").or_else(|| {
            uri.query()
                .and_then(|query| form_value(query.as_bytes(), "uri"))
        })
    };

    match value {
        Some(uri) if !uri.is_empty() => Ok(uri),
        _ => Err(PrivateerError::bad_request(NO_URI)),
    }
}

fn form_value(encoded: &[u8], key: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// POST /_
pub async fn create_mapping(
    State(state): State<GatewayState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> Result<Response> {
    let target = mapping_uri(&headers, &uri, &body)?;

    let token = state.registry.create(&target, user.name()).map_err(|e| {
        tracing::error!("mapping registry create failed: {}", e);
        PrivateerError::bad_request("Unable to create mapping")
    })?;

    tracing::info!(user = %user, target = %target, "capability issued");
    tracing::debug!(token = %token, "issued token");

    let location = state.capability_url(&headers, &token);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

/// GET /_
pub async fn list_mappings(
    State(state): State<GatewayState>,
    RequireUser(user): RequireUser,
    headers: HeaderMap,
) -> Result<Json<BTreeMap<String, String>>> {
    let records = state.registry.list_by_owner(user.name()).map_err(|e| {
        tracing::error!("mapping registry list failed: {}", e);
        PrivateerError::not_found("Unable to list mappings")
    })?;

    Ok(Json(
        records
            .iter()
            .map(|record| {
                (
                    state.capability_url(&headers, record.token()),
                    record.target_uri().to_string(),
                )
            })
            .collect(),
    ))
}

/// DELETE /_/:token
pub async fn delete_mapping(
    State(state): State<GatewayState>,
    RequireUser(user): RequireUser,
    Path(token): Path<String>,
) -> Result<StatusCode> {
    let token = Token::new(token);
    let not_found = || PrivateerError::not_found("mapping not found");

    let record = state
        .registry
        .get(&token)
        .map_err(|e| {
            tracing::error!("mapping registry get failed: {}", e);
            not_found()
        })?
        .ok_or_else(not_found)?;

    if !record.is_owned_by(user.name()) {
        tracing::debug!(user = %user, token = %token, "delete refused for non-owner");
        return Err(not_found());
    }

    state.registry.delete(&token).map_err(|e| {
        tracing::warn!("mapping registry delete failed: {}", e);
        not_found()
    })?;

    tracing::info!(user = %user, "capability revoked");
    Ok(StatusCode::NO_CONTENT)
}
