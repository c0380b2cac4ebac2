//! Request Facets - Values derived from the request URI and headers
//!
//! Handlers never parse the query string or `Accept` header themselves;
//! they read the `RequestFacets` extension. Anything that rewrites a
//! request's path or query must call [`RequestFacets::recompute`]
//! afterwards, or handlers will see the facets of the old request.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::Response;

/// Representations the server can produce: (extension, media type)
pub const REPRESENTATIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("json", "application/json"),
    ("html", "text/html"),
];

pub const DEFAULT_MEDIA_TYPE: &str = "text/html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Select,
    Sort,
    Limit,
}

impl FilterKind {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "select" => Some(Self::Select),
            "sort" => Some(Self::Sort),
            "limit" => Some(Self::Limit),
            _ => None,
        }
    }
}

/// One filter step, in the order it appeared in the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub argument: String,
}

/// Derived request context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFacets {
    /// Decoded query parameters, repeated keys kept in order
    pub query: Vec<(String, String)>,
    pub filters: Vec<FilterSpec>,
    /// Extension taken from the last path segment, if recognised
    pub extension: Option<String>,
    pub media_type: String,
}

impl RequestFacets {
    /// Derive facets from a URI and its headers
    pub fn derive(uri: &Uri, headers: &HeaderMap) -> Self {
        let query: Vec<(String, String)> = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let filters = query
            .iter()
            .filter_map(|(key, value)| {
                FilterKind::from_key(key).map(|kind| FilterSpec {
                    kind,
                    argument: value.clone(),
                })
            })
            .collect();

        let (extension, media_type) = match path_extension(uri.path()) {
            Some((ext, media_type)) => (Some(ext.to_string()), media_type.to_string()),
            None => (None, accepted_media_type(headers).to_string()),
        };

        Self {
            query,
            filters,
            extension,
            media_type,
        }
    }

    /// Re-derive the facets of `request` and replace its extension
    pub fn recompute(request: &mut Request) {
        let facets = Self::derive(request.uri(), request.headers());
        request.extensions_mut().insert(facets);
    }

    /// First value of a query parameter
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Strip the negotiated extension from a path segment
    pub fn strip_extension<'a>(&self, segment: &'a str) -> &'a str {
        match &self.extension {
            Some(ext) => segment
                .strip_suffix(ext.as_str())
                .and_then(|s| s.strip_suffix('.'))
                .unwrap_or(segment),
            None => segment,
        }
    }
}

fn path_extension(path: &str) -> Option<(&str, &'static str)> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    REPRESENTATIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(known, media_type)| (*known, *media_type))
}

fn accepted_media_type(headers: &HeaderMap) -> &'static str {
    let accept = match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
        Some(accept) => accept,
        None => return DEFAULT_MEDIA_TYPE,
    };

    accept
        .split(',')
        .filter_map(|entry| entry.split(';').next())
        .map(str::trim)
        .find_map(|wanted| {
            REPRESENTATIONS
                .iter()
                .find(|(_, media_type)| media_type.eq_ignore_ascii_case(wanted))
                .map(|(_, media_type)| *media_type)
        })
        .unwrap_or(DEFAULT_MEDIA_TYPE)
}

/// Axum middleware: derive facets once per inbound request
pub async fn facets_middleware(mut request: Request, next: Next) -> Response {
    RequestFacets::recompute(&mut request);
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestFacets
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(match parts.extensions.get::<RequestFacets>() {
            Some(facets) => facets.clone(),
            None => Self::derive(&parts.uri, &parts.headers),
        })
    }
}
