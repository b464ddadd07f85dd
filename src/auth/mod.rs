//! Session authentication.
//!
//! A session is an opaque token stored as the user's remember token. Clients
//! present it either in the session cookie or as a bearer token; the
//! [`RequestContext`] extractor resolves it to the acting user.

pub mod password;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::errors::AppError;
use crate::service::users;
use crate::store::RequestContext;
use crate::AppState;

/// Find the value of cookie `name` in the request's `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The session token of a request; the cookie wins over the header.
pub fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

/// `Set-Cookie` value opening a session.
pub fn session_cookie(name: &str, token: &str, ttl_secs: u64) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        name, token, ttl_secs
    )
}

/// `Set-Cookie` value that makes the client drop the session cookie.
pub fn expired_cookie(name: &str) -> String {
    format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", name)
}

/// Resolves the acting user of every request.
///
/// Never rejects for a missing or unknown token: such requests run as the
/// anonymous actor, and operations that need a user fail with
/// `Unauthenticated` through [`RequestContext::require_actor`].
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let stores = state.stores.clone();
        let Some(token) = session_token(&parts.headers, &state.config.session_cookie) else {
            return Ok(RequestContext::anonymous(stores));
        };

        let actor = users::session_actor(&stores, token).await?;
        if actor.is_none() {
            tracing::warn!("Request with unknown session token");
        }
        Ok(RequestContext::new(actor, stores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_value() {
        let map = headers(&[(header::COOKIE, "theme=dark; dash_session=abc123; lang=en")]);
        assert_eq!(cookie_value(&map, "dash_session"), Some("abc123"));
        assert_eq!(cookie_value(&map, "missing"), None);

        let empty = headers(&[(header::COOKIE, "dash_session=")]);
        assert_eq!(cookie_value(&empty, "dash_session"), None);
    }

    #[test]
    fn test_cookie_across_headers() {
        let map = headers(&[
            (header::COOKIE, "theme=dark"),
            (header::COOKIE, "dash_session=xyz"),
        ]);
        assert_eq!(cookie_value(&map, "dash_session"), Some("xyz"));
    }

    #[test]
    fn test_cookie_preferred_over_bearer() {
        let both = headers(&[
            (header::COOKIE, "dash_session=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(session_token(&both, "dash_session"), Some("from-cookie"));

        let bearer = headers(&[(header::AUTHORIZATION, "Bearer from-header")]);
        assert_eq!(session_token(&bearer, "dash_session"), Some("from-header"));

        let basic = headers(&[(header::AUTHORIZATION, "Basic dXNlcg==")]);
        assert_eq!(session_token(&basic, "dash_session"), None);
    }

    #[test]
    fn test_set_cookie_values() {
        assert_eq!(
            session_cookie("dash_session", "tok", 60),
            "dash_session=tok; Max-Age=60; Path=/; HttpOnly; SameSite=Lax"
        );
        assert!(expired_cookie("dash_session").starts_with("dash_session=; Max-Age=0;"));
    }
}
