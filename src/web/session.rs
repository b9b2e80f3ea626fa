//! Browser sessions: an HttpOnly cookie carrying a signed access token.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, error};

use super::found;
use crate::{
    auth::{jwt::JwtKeys, repo_types::User},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_URL: &str = "/login/";

pub fn session_cookie(token: String, keys: &JwtKeys) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(keys.access_ttl().as_secs() as i64))
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

/// Login URL with `next` pointing back at the full requested path, as seen
/// before any router nesting stripped its prefix.
fn login_redirect(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
    format!("{LOGIN_URL}?next={}", urlencoding::encode(target))
}

async fn session_user(parts: &Parts, state: &AppState) -> anyhow::Result<Option<User>> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let keys = JwtKeys::from_ref(state);
    let claims = match keys.verify_access(cookie.value()) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "stale session cookie");
            return Ok(None);
        }
    };
    Ok(state
        .store
        .find_user(claims.sub)
        .await?
        .filter(|u| u.is_active))
}

/// Signed-in user. Visitors are sent to the login page with a `next` back
/// to the requested path.
pub struct SessionUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Ok(Some(user)) => Ok(SessionUser(user)),
            Ok(None) => Err(found(&login_redirect(parts))),
            Err(e) => Err(super::PageError::from(e).into_response()),
        }
    }
}

/// Signed-in user if any, for pages open to visitors.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn viewer(&self) -> String {
        self.0.as_ref().map(|u| u.email.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Ok(user) => Ok(MaybeUser(user)),
            Err(e) => {
                error!(error = ?e, "session lookup failed");
                Ok(MaybeUser(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_be_local_path() {
        assert_eq!(safe_next("/recipe/tags/"), "/recipe/tags/");
        assert_eq!(safe_next("//evil.example.com/"), "/");
        assert_eq!(safe_next("https://evil.example.com/"), "/");
        assert_eq!(safe_next(""), "/");
    }

    #[test]
    fn login_redirect_keeps_full_original_path() {
        let mut parts = axum::http::Request::builder()
            .uri("/tags/?page=2")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts
            .extensions
            .insert(OriginalUri("/recipe/tags/?page=2".parse().unwrap()));
        assert_eq!(
            login_redirect(&parts),
            "/login/?next=%2Frecipe%2Ftags%2F%3Fpage%3D2"
        );
    }
}
