use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::cookies::ACCESS_TOKEN_COOKIE;
use crate::auth::session::SessionError;
use crate::controllers::AppState;
use crate::error::VidtubeError;

/// Extractor that verifies the access credential and provides the caller's ID.
///
/// The credential is read from an `Authorization: Bearer <token>` header,
/// falling back to the `accessToken` cookie.
///
/// ```rust,ignore
/// async fn my_handler(AuthUser(user_id): AuthUser) -> impl IntoResponse {
///     // user_id is the authenticated user's ID
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = VidtubeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(parts).ok_or(SessionError::Unauthenticated)?;
        let user_id = state.sessions.verify(&token)?;
        Ok(AuthUser(user_id))
    }
}

/// Like [`AuthUser`] but `None` for anonymous callers.
///
/// A credential that is present but invalid is still rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<Uuid>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = VidtubeError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match access_token(parts) {
            Some(token) => Ok(MaybeAuthUser(Some(state.sessions.verify(&token)?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

fn access_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}
