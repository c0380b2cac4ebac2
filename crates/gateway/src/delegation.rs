//! Request Delegation Engine
//!
//! Turns `GET /_/<token>` into the request the mapping's owner would
//! have made, then hands it back to the router.
//!
//! ```text
//!   inbound request ──► lookup token ──► parse target ──► resolve user
//!                                                            │
//!   response ◄── Dispatcher ◄── recompute facets ◄── rewrite_request
//! ```
//!
//! Rewriting happens in place on the request being served. Nothing about
//! the substitution outlives that request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request};
use axum::http::uri::{Authority, PathAndQuery};
use axum::http::{header, Extensions, HeaderValue, Uri};
use axum::response::Response;

use privateer_domain::{MappingRegistry, Token, UserDirectory, Usersign};

use crate::dispatch::Dispatcher;
use crate::error::{PrivateerError, Result};
use crate::facets::RequestFacets;

pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Number of capability URLs already resolved while serving this request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegationDepth(pub usize);

fn mapping_not_found() -> PrivateerError {
    PrivateerError::not_found("mapping not found")
}

fn invalid_mapping() -> PrivateerError {
    PrivateerError::bad_request("invalid mapping")
}

/// A mapping's target URI, split into the pieces a rewrite needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationTarget {
    /// Set only for absolute targets
    pub authority: Option<Authority>,
    pub path_and_query: PathAndQuery,
}

impl DelegationTarget {
    /// Parse a stored target. `server_prefix` is removed from the path so
    /// absolute public URLs route the same as host-relative ones.
    pub fn parse(target_uri: &str, server_prefix: &str) -> Option<Self> {
        let target_uri = target_uri.trim();
        let uri: Uri = if target_uri.starts_with('/') || target_uri.contains("://") {
            target_uri.parse().ok()?
        } else {
            format!("/{}", target_uri).parse().ok()?
        };

        let authority = match uri.scheme() {
            Some(_) => uri.authority().cloned(),
            None => None,
        };

        let path = match strip_server_prefix(uri.path(), server_prefix) {
            "" => "/",
            path => path,
        };
        let path_and_query = match uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };

        Some(Self {
            authority,
            path_and_query: path_and_query.parse().ok()?,
        })
    }

    pub fn path(&self) -> &str {
        self.path_and_query.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.path_and_query.query()
    }

    /// `host[:port]` for the Host header, without any userinfo
    pub fn host(&self) -> Option<String> {
        self.authority.as_ref().map(|authority| match authority.port_u16() {
            Some(port) => format!("{}:{}", authority.host(), port),
            None => authority.host().to_string(),
        })
    }
}

fn strip_server_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Make `request` look like the request `target` describes, issued as
/// `usersign`.
///
/// The identity is replaced, the query is replaced (or cleared), the Host
/// header follows an absolute target's authority, and the path is
/// replaced. Credentials from the original caller are dropped. Facets are
/// NOT recomputed here; call `RequestFacets::recompute` next.
///
/// Extensions start over: routing state from the `/_/:token` match (path
/// parameters, matched path) must not reach the router a second time.
pub fn rewrite_request(
    request: &mut Request,
    target: &DelegationTarget,
    usersign: Usersign,
) -> Result<()> {
    let mut extensions = carried_extensions(request.extensions());
    extensions.insert(usersign);
    *request.extensions_mut() = extensions;
    request.headers_mut().remove(header::AUTHORIZATION);

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(target.path_and_query.clone());

    if let Some(host) = target.host() {
        let value = HeaderValue::from_str(&host).map_err(|_| mapping_not_found())?;
        request.headers_mut().insert(header::HOST, value);
        if parts.authority.is_some() {
            parts.authority = target.authority.clone();
        }
    }

    *request.uri_mut() = Uri::from_parts(parts).map_err(|_| mapping_not_found())?;
    Ok(())
}

fn carried_extensions(previous: &Extensions) -> Extensions {
    let mut extensions = Extensions::new();
    if let Some(depth) = previous.get::<DelegationDepth>() {
        extensions.insert(*depth);
    }
    if let Some(facets) = previous.get::<RequestFacets>() {
        extensions.insert(facets.clone());
    }
    if let Some(connect_info) = previous.get::<ConnectInfo<SocketAddr>>() {
        extensions.insert(*connect_info);
    }
    extensions
}

/// Resolves capability tokens and redispatches the rewritten request
pub struct RequestDelegationEngine {
    registry: Arc<dyn MappingRegistry>,
    users: Arc<dyn UserDirectory>,
    dispatcher: Arc<dyn Dispatcher>,
    max_depth: usize,
    server_prefix: String,
}

impl RequestDelegationEngine {
    pub fn new(
        registry: Arc<dyn MappingRegistry>,
        users: Arc<dyn UserDirectory>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            registry,
            users,
            dispatcher,
            max_depth: DEFAULT_MAX_DEPTH,
            server_prefix: String::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_server_prefix(mut self, server_prefix: impl Into<String>) -> Self {
        self.server_prefix = server_prefix.into();
        self
    }

    /// Serve `request` as the mapping behind `token` says to
    pub async fn resolve(&self, token: &Token, mut request: Request) -> Result<Response> {
        let DelegationDepth(depth) = request
            .extensions()
            .get::<DelegationDepth>()
            .copied()
            .unwrap_or_default();
        if depth >= self.max_depth {
            tracing::warn!(depth, "capability chain too deep");
            return Err(PrivateerError::bad_request("mapping chain too deep"));
        }

        let record = match self.registry.get(token) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(token = %token, "unknown capability token");
                return Err(mapping_not_found());
            }
            Err(e) => {
                tracing::error!("mapping registry get failed: {}", e);
                return Err(mapping_not_found());
            }
        };

        let target = DelegationTarget::parse(record.target_uri(), &self.server_prefix)
            .ok_or_else(|| {
                tracing::warn!(user = record.delegated_user(), "mapping target is not a valid URI");
                mapping_not_found()
            })?;

        let usersign = match self.users.get(record.delegated_user()) {
            Ok(Some(usersign)) => usersign,
            Ok(None) => {
                tracing::warn!(user = record.delegated_user(), "mapping delegates to unknown user");
                return Err(invalid_mapping());
            }
            Err(e) => {
                tracing::error!("user directory get failed: {}", e);
                return Err(invalid_mapping());
            }
        };

        rewrite_request(&mut request, &target, usersign)?;
        request.extensions_mut().insert(DelegationDepth(depth + 1));
        RequestFacets::recompute(&mut request);

        tracing::debug!(token = %token, path = target.path(), depth = depth + 1, "redispatching");
        Ok(self.dispatcher.dispatch(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::Path;
    use axum::http::{self, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use privateer_adapter::{InMemoryMappingRegistry, InMemoryUserDirectory};
    use shared::ServerConfig;

    use crate::guard::CurrentUser;
    use crate::state::GatewayState;

    /// What the router would have seen
    #[derive(Debug, Clone)]
    struct Observed {
        user: String,
        uri: String,
        host: Option<String>,
        authorization: bool,
        facets: RequestFacets,
    }

    #[derive(Default)]
    struct RecordingDispatcher {
        seen: Mutex<Vec<Observed>>,
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn dispatch(&self, request: Request) -> Response {
            self.seen.lock().unwrap().push(Observed {
                user: request
                    .extensions()
                    .get::<Usersign>()
                    .map(|u| u.name().to_string())
                    .unwrap_or_default(),
                uri: request.uri().to_string(),
                host: request
                    .headers()
                    .get(header::HOST)
                    .map(|h| h.to_str().unwrap().to_string()),
                authorization: request.headers().contains_key(header::AUTHORIZATION),
                facets: request.extensions().get::<RequestFacets>().unwrap().clone(),
            });
            (StatusCode::IM_A_TEAPOT, [("x-routed", "yes")], "routed").into_response()
        }
    }

    struct Fixture {
        registry: InMemoryMappingRegistry,
        users: InMemoryUserDirectory,
        dispatcher: Arc<RecordingDispatcher>,
        engine: RequestDelegationEngine,
    }

    fn fixture() -> Fixture {
        let registry = InMemoryMappingRegistry::new();
        let users = InMemoryUserDirectory::new();
        users.put_user("cdent", "cowpoo", ["ADMIN"]).unwrap();
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let engine = RequestDelegationEngine::new(
            Arc::new(registry.clone()),
            Arc::new(users.clone()),
            dispatcher.clone(),
        );
        Fixture {
            registry,
            users,
            dispatcher,
            engine,
        }
    }

    fn inbound(token: &Token) -> Request {
        let mut request = http::Request::builder()
            .uri(format!("/_/{}?stale=1", token))
            .header(header::HOST, "a.0.0.0.0:8080")
            .header(header::AUTHORIZATION, "Basic Z3Vlc3Q6eA==")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(Usersign::guest());
        RequestFacets::recompute(&mut request);
        request
    }

    // ============== Target Parsing Tests ==============

    #[test]
    fn test_parse_relative_target() {
        let target = DelegationTarget::parse("/bags/ho/tiddlers?select=title:junk", "").unwrap();
        assert!(target.authority.is_none());
        assert_eq!(target.path(), "/bags/ho/tiddlers");
        assert_eq!(target.query(), Some("select=title:junk"));
    }

    #[test]
    fn test_parse_absolute_target() {
        let target =
            DelegationTarget::parse("http://b.0.0.0.0:8080/bags/ho/tiddlers/junk", "").unwrap();
        assert_eq!(target.host().as_deref(), Some("b.0.0.0.0:8080"));
        assert_eq!(target.path(), "/bags/ho/tiddlers/junk");
        assert_eq!(target.query(), None);
    }

    #[test]
    fn test_parse_drops_userinfo_from_host() {
        let target = DelegationTarget::parse("http://eve:pw@example.org/x", "").unwrap();
        assert_eq!(target.host().as_deref(), Some("example.org"));
    }

    #[test]
    fn test_parse_path_without_slash() {
        let target = DelegationTarget::parse("bags/ho/tiddlers", "").unwrap();
        assert_eq!(target.path(), "/bags/ho/tiddlers");
    }

    #[test]
    fn test_parse_strips_server_prefix() {
        let target =
            DelegationTarget::parse("https://example.org/wiki/bags/ho/tiddlers", "/wiki").unwrap();
        assert_eq!(target.path(), "/bags/ho/tiddlers");

        let target = DelegationTarget::parse("/wikipedia/x", "/wiki").unwrap();
        assert_eq!(target.path(), "/wikipedia/x");

        let target = DelegationTarget::parse("/wiki", "/wiki").unwrap();
        assert_eq!(target.path(), "/");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DelegationTarget::parse("http://exa mple.org/x", "").is_none());
        assert!(DelegationTarget::parse("/bags/ho\u{7f}", "").is_none());
    }

    // ============== Rewrite Tests ==============

    #[test]
    fn test_rewrite_relative_keeps_host_and_clears_query() {
        let mut request = inbound(&Token::new("t"));
        let target = DelegationTarget::parse("/bags/ho/tiddlers/junk", "").unwrap();

        rewrite_request(&mut request, &target, Usersign::new("cdent", ["ADMIN"])).unwrap();

        assert_eq!(request.uri(), "/bags/ho/tiddlers/junk");
        assert_eq!(request.headers()[header::HOST], "a.0.0.0.0:8080");
        assert!(!request.headers().contains_key(header::AUTHORIZATION));
        assert_eq!(request.extensions().get::<Usersign>().unwrap().name(), "cdent");
    }

    #[test]
    fn test_rewrite_absolute_overrides_host() {
        let mut request = inbound(&Token::new("t"));
        let target =
            DelegationTarget::parse("http://b.0.0.0.0:8080/bags/ho/tiddlers?select=title:junk", "")
                .unwrap();

        rewrite_request(&mut request, &target, Usersign::new("cdent", Vec::<String>::new()))
            .unwrap();

        assert_eq!(request.uri(), "/bags/ho/tiddlers?select=title:junk");
        assert_eq!(request.headers()[header::HOST], "b.0.0.0.0:8080");
    }

    #[test]
    fn test_rewrite_absolute_request_uri_gets_new_authority() {
        let mut request = http::Request::builder()
            .uri("http://a.0.0.0.0:8080/_/t")
            .body(Body::empty())
            .unwrap();
        let target = DelegationTarget::parse("http://b.0.0.0.0:8080/x", "").unwrap();

        rewrite_request(&mut request, &target, Usersign::guest()).unwrap();
        assert_eq!(request.uri(), "http://b.0.0.0.0:8080/x");
    }

    #[test]
    fn test_rewrite_leaves_facets_stale_until_recompute() {
        let mut request = inbound(&Token::new("t"));
        let target = DelegationTarget::parse("/bags/ho/tiddlers/junk.txt", "").unwrap();

        rewrite_request(&mut request, &target, Usersign::guest()).unwrap();
        let stale = request.extensions().get::<RequestFacets>().unwrap();
        assert_eq!(stale.query_param("stale"), Some("1"));

        RequestFacets::recompute(&mut request);
        let fresh = request.extensions().get::<RequestFacets>().unwrap();
        assert!(fresh.query.is_empty());
        assert_eq!(fresh.media_type, "text/plain");
    }

    // ============== Resolve Tests ==============

    #[tokio::test]
    async fn test_resolve_redispatches_as_owner() {
        let f = fixture();
        let token = f
            .registry
            .create("/bags/ho/tiddlers.json?select=title:junk", "cdent")
            .unwrap();

        let response = f.engine.resolve(&token, inbound(&token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()["x-routed"], "yes");

        let seen = f.dispatcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user, "cdent");
        assert_eq!(seen[0].uri, "/bags/ho/tiddlers.json?select=title:junk");
        assert_eq!(seen[0].host.as_deref(), Some("a.0.0.0.0:8080"));
        assert!(!seen[0].authorization);
        assert_eq!(seen[0].facets.query_param("select"), Some("title:junk"));
        assert_eq!(seen[0].facets.query_param("stale"), None);
        assert_eq!(seen[0].facets.media_type, "application/json");
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let f = fixture();
        let token = Token::new("00000000-0000-4000-8000-000000000000");

        let err = f.engine.resolve(&token, inbound(&token)).await.unwrap_err();
        assert_eq!(err, PrivateerError::not_found("mapping not found"));
        assert!(f.dispatcher.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_removed_user_is_invalid_mapping() {
        let f = fixture();
        let token = f.registry.create("/bags/ho/tiddlers", "cdent").unwrap();
        f.users.remove_user("cdent").unwrap();

        let err = f.engine.resolve(&token, inbound(&token)).await.unwrap_err();
        assert_eq!(err, PrivateerError::bad_request("invalid mapping"));
        assert!(f.dispatcher.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unparsable_target_is_not_found() {
        let f = fixture();
        let token = f.registry.create("http://exa mple.org/x", "cdent").unwrap();

        let err = f.engine.resolve(&token, inbound(&token)).await.unwrap_err();
        assert_eq!(err, PrivateerError::not_found("mapping not found"));
    }

    #[tokio::test]
    async fn test_resolve_increments_depth() {
        let f = fixture();
        let token = f.registry.create("/x", "cdent").unwrap();

        let mut request = inbound(&token);
        request.extensions_mut().insert(DelegationDepth(2));
        f.engine.resolve(&token, request).await.unwrap();

        let mut request = inbound(&token);
        request.extensions_mut().insert(DelegationDepth(DEFAULT_MAX_DEPTH));
        let err = f.engine.resolve(&token, request).await.unwrap_err();
        assert_eq!(err, PrivateerError::bad_request("mapping chain too deep"));
        assert_eq!(f.dispatcher.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rewrite_drops_routing_extensions() {
        #[derive(Clone)]
        struct MatchedByTokenRoute;

        let mut request = inbound(&Token::new("t"));
        request.extensions_mut().insert(MatchedByTokenRoute);
        request.extensions_mut().insert(DelegationDepth(1));
        let target = DelegationTarget::parse("/bags/ho/tiddlers", "").unwrap();

        rewrite_request(&mut request, &target, Usersign::new("cdent", ["ADMIN"])).unwrap();

        assert!(request.extensions().get::<MatchedByTokenRoute>().is_none());
        assert_eq!(request.extensions().get::<DelegationDepth>(), Some(&DelegationDepth(1)));
        assert!(request.extensions().get::<RequestFacets>().is_some());
        assert_eq!(request.extensions().get::<Usersign>().unwrap().name(), "cdent");
    }

    // ============== Loopback Routing Tests ==============

    /// A real router that feeds rewritten requests back into itself
    #[derive(Clone)]
    struct Loopback {
        registry: InMemoryMappingRegistry,
        users: InMemoryUserDirectory,
    }

    impl Loopback {
        fn new() -> Self {
            let users = InMemoryUserDirectory::new();
            users.put_user("cdent", "cowpoo", ["ADMIN"]).unwrap();
            Self {
                registry: InMemoryMappingRegistry::new(),
                users,
            }
        }

        fn router(&self) -> Router {
            let state = GatewayState::new(
                Arc::new(self.registry.clone()),
                Arc::new(self.users.clone()),
                Arc::new(self.clone()),
                Arc::new(ServerConfig::default()),
            );
            Router::new()
                .route("/bags/:bag/tiddlers", get(bag_params))
                .route("/bags/:bag/tiddlers/:title", get(tiddler_params))
                .route("/whoami", get(whoami))
                .merge(crate::routes::routes(state))
        }

        async fn fetch(&self, uri: &str) -> (StatusCode, String) {
            let request = http::Request::builder().uri(uri).body(Body::empty()).unwrap();
            let response = self.router().oneshot(request).await.unwrap();
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, String::from_utf8(body.to_vec()).unwrap())
        }
    }

    #[async_trait]
    impl Dispatcher for Loopback {
        async fn dispatch(&self, request: Request) -> Response {
            match self.router().oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            }
        }
    }

    async fn bag_params(CurrentUser(user): CurrentUser, Path(bag): Path<String>) -> String {
        format!("{} {}", user, bag)
    }

    async fn tiddler_params(
        CurrentUser(user): CurrentUser,
        Path((bag, title)): Path<(String, String)>,
    ) -> String {
        format!("{} {} {}", user, bag, title)
    }

    async fn whoami(CurrentUser(user): CurrentUser) -> String {
        user.to_string()
    }

    #[tokio::test]
    async fn test_redispatch_extracts_params_from_target_only() {
        let loopback = Loopback::new();
        let tiddler = loopback.registry.create("/bags/ho/tiddlers/junk", "cdent").unwrap();
        let bag = loopback
            .registry
            .create("/bags/ho/tiddlers?select=title:junk", "cdent")
            .unwrap();

        assert_eq!(
            loopback.fetch(&format!("/_/{}", tiddler)).await,
            (StatusCode::OK, "cdent ho junk".to_string())
        );
        assert_eq!(
            loopback.fetch(&format!("/_/{}", bag)).await,
            (StatusCode::OK, "cdent ho".to_string())
        );
    }

    #[tokio::test]
    async fn test_redispatch_through_second_capability() {
        let loopback = Loopback::new();
        let inner = loopback.registry.create("/bags/ho/tiddlers/junk", "cdent").unwrap();
        let outer = loopback
            .registry
            .create(&format!("/_/{}", inner), "cdent")
            .unwrap();

        assert_eq!(
            loopback.fetch(&format!("/_/{}", outer)).await,
            (StatusCode::OK, "cdent ho junk".to_string())
        );
    }

    // ============== Red Team Security Tests ==============

    mod red_team {
        use super::*;

        #[tokio::test]
        async fn red_team_identity_does_not_leak_between_requests() {
            let loopback = Loopback::new();
            let token = loopback.registry.create("/whoami", "cdent").unwrap();

            assert_eq!(
                loopback.fetch(&format!("/_/{}", token)).await,
                (StatusCode::OK, "cdent".to_string())
            );
            // Same router, same engine, no capability: back to GUEST
            assert_eq!(
                loopback.fetch("/whoami").await,
                (StatusCode::OK, "GUEST".to_string())
            );
        }

        #[tokio::test]
        async fn red_team_unknown_and_broken_look_alike() {
            let f = fixture();
            let unknown = Token::new("00000000-0000-4000-8000-000000000000");
            let broken = f.registry.create("http://exa mple.org/x", "cdent").unwrap();

            let unknown_err = f.engine.resolve(&unknown, inbound(&unknown)).await.unwrap_err();
            let broken_err = f.engine.resolve(&broken, inbound(&broken)).await.unwrap_err();
            assert_eq!(unknown_err, broken_err);

            let unknown_response = unknown_err.into_response();
            let broken_response = broken_err.into_response();
            assert_eq!(unknown_response.status(), broken_response.status());
            let unknown_body = axum::body::to_bytes(unknown_response.into_body(), usize::MAX)
                .await
                .unwrap();
            let broken_body = axum::body::to_bytes(broken_response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(unknown_body, broken_body);
        }
    }
}
