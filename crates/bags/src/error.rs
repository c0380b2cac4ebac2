//! Bag errors and their HTTP mapping

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub const AUTH_CHALLENGE: &str = "Basic realm=\"privateer\"";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BagError {
    #[error("bag not found: {0}")]
    NoSuchBag(String),

    #[error("tiddler not found: {0}")]
    NoSuchTiddler(String),

    /// Denied, and the caller has not authenticated
    #[error("authentication required")]
    Unauthorized,

    /// Denied for an authenticated caller
    #[error("permission denied")]
    Forbidden,

    #[error("invalid filter: {0}")]
    BadFilter(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl BagError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoSuchBag(_) | Self::NoSuchTiddler(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadFilter(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BagError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=UTF-8")],
            self.to_string(),
        )
            .into_response();
        if self == Self::Unauthorized {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static(AUTH_CHALLENGE),
            );
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, BagError>;
