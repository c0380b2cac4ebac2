//! Authentication middleware
//!
//! Attaches a `Usersign` to every inbound request. Credentials come from
//! HTTP Basic auth and are checked against the `UserDirectory`; anything
//! else leaves the request as `GUEST`. Rejecting unauthenticated callers is
//! the handlers' job (see `guard::RequireUser`), not this layer's.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use base64::{engine::general_purpose, Engine as _};

use privateer_domain::{UserDirectory, Usersign};

/// Credentials carried by an `Authorization: Basic` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub name: String,
    pub password: String,
}

/// A Basic header that could not be decoded into name and password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedCredentials;

/// Parse `Authorization: Basic base64(name:password)`
///
/// Returns `None` when there is no Basic header at all.
pub fn basic_credentials(headers: &HeaderMap) -> Option<Result<BasicCredentials, MalformedCredentials>> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = match general_purpose::STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return Some(Err(MalformedCredentials)),
    };
    let decoded = match String::from_utf8(decoded) {
        Ok(text) => text,
        Err(_) => return Some(Err(MalformedCredentials)),
    };

    Some(match decoded.split_once(':') {
        Some((name, password)) if !name.is_empty() => Ok(BasicCredentials {
            name: name.to_string(),
            password: password.to_string(),
        }),
        _ => Err(MalformedCredentials),
    })
}

/// Resolve the headers to an identity. Never fails; the fallback is GUEST.
pub fn authenticate(users: &dyn UserDirectory, headers: &HeaderMap) -> Usersign {
    let credentials = match basic_credentials(headers) {
        None => return Usersign::guest(),
        Some(Ok(credentials)) => credentials,
        Some(Err(MalformedCredentials)) => {
            tracing::warn!("malformed Basic credentials, continuing as guest");
            return Usersign::guest();
        }
    };

    let verified = users
        .verify_password(&credentials.name, &credentials.password)
        .unwrap_or_else(|e| {
            tracing::error!("user directory unavailable: {}", e);
            false
        });
    if !verified {
        tracing::warn!(user = %credentials.name, "rejected credentials, continuing as guest");
        return Usersign::guest();
    }

    match users.get(&credentials.name) {
        Ok(Some(usersign)) => usersign,
        Ok(None) => Usersign::guest(),
        Err(e) => {
            tracing::error!("user directory unavailable: {}", e);
            Usersign::guest()
        }
    }
}

/// Axum middleware: attach the caller's `Usersign` extension
pub async fn auth_middleware(
    State(users): State<Arc<dyn UserDirectory>>,
    mut request: Request,
    next: Next,
) -> Response {
    let usersign = authenticate(users.as_ref(), request.headers());
    tracing::debug!(user = %usersign, "request identity");
    request.extensions_mut().insert(usersign);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use privateer_adapter::InMemoryUserDirectory;

    fn basic(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", general_purpose::STANDARD.encode(value)))
                .unwrap(),
        );
        headers
    }

    fn directory() -> InMemoryUserDirectory {
        let users = InMemoryUserDirectory::new();
        users.put_user("cdent", "cowpoo", ["ADMIN"]).unwrap();
        users
    }

    #[test]
    fn test_no_header_is_none() {
        assert!(basic_credentials(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_parse_basic() {
        let parsed = basic_credentials(&basic("cdent:cow:poo")).unwrap().unwrap();
        assert_eq!(parsed.name, "cdent");
        assert_eq!(parsed.password, "cow:poo");
    }

    #[test]
    fn test_bearer_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(basic_credentials(&headers).is_none());
    }

    #[test]
    fn test_authenticate_valid_user() {
        let usersign = authenticate(&directory(), &basic("cdent:cowpoo"));
        assert_eq!(usersign.name(), "cdent");
        assert!(usersign.has_role("ADMIN"));
    }

    #[test]
    fn test_authenticate_falls_back_to_guest() {
        let users = directory();
        assert!(authenticate(&users, &HeaderMap::new()).is_guest());
        assert!(authenticate(&users, &basic("cdent:wrong")).is_guest());
        assert!(authenticate(&users, &basic("nobody:cowpoo")).is_guest());
    }

    // ============== Red Team Security Tests ==============

    mod red_team {
        use super::*;

        #[test]
        fn red_team_malformed_headers_are_guest() {
            let users = directory();
            let attacks = vec![
                "Basic",
                "Basic !!!notbase64!!!",
                "Basic Y2RlbnQ=", // "cdent" with no colon
                "Basic OmNvd3Bvbw==", // ":cowpoo", empty name
            ];

            for attack in attacks {
                let mut headers = HeaderMap::new();
                headers.insert(header::AUTHORIZATION, HeaderValue::from_static(attack));
                assert!(authenticate(&users, &headers).is_guest(), "{}", attack);
            }
        }

        #[test]
        fn red_team_guest_name_cannot_log_in() {
            let usersign = authenticate(&directory(), &basic("GUEST:"));
            assert!(usersign.is_guest());
        }
    }
}
