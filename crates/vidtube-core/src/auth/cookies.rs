use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::session::CredentialPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Add both credential cookies (HttpOnly, Secure) to the jar.
pub fn set_session_cookies(jar: CookieJar, pair: &CredentialPair) -> CookieJar {
    jar.add(session_cookie(ACCESS_TOKEN_COOKIE, pair.access_token.clone()))
        .add(session_cookie(REFRESH_TOKEN_COOKIE, pair.refresh_token.clone()))
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

/// Expire both credential cookies.
///
/// Removal cookies are always emitted, even when the request authenticated
/// with a bearer header and sent no cookies.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(ACCESS_TOKEN_COOKIE))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE))
}
