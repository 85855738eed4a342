//! HttpOnly cookies carrying the access and refresh tokens.
//!
//! Outside production the cookies are `SameSite=Lax` and not `Secure`, so a
//! browser on plain-HTTP localhost still sends them back.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::auth::jwt::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Browser lifetime of the access cookie (the JWT inside may expire sooner).
pub const ACCESS_COOKIE_MAX_AGE: Duration = Duration::hours(1);
pub const REFRESH_COOKIE_MAX_AGE: Duration = Duration::days(10);

fn auth_cookie(name: &str, value: String, max_age: Duration, production: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .secure(production)
        .same_site(if production { SameSite::Strict } else { SameSite::Lax })
        .path("/")
        .max_age(max_age)
        .build()
}

/// Add both token cookies to `jar`.
pub fn set_auth_cookies(jar: CookieJar, tokens: &TokenPair, production: bool) -> CookieJar {
    jar.add(auth_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        ACCESS_COOKIE_MAX_AGE,
        production,
    ))
    .add(auth_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        REFRESH_COOKIE_MAX_AGE,
        production,
    ))
}

/// Overwrite both token cookies with empty, already-expired ones.
///
/// Expired cookies are always emitted, even when the request carried none.
pub fn clear_auth_cookies(jar: CookieJar, production: bool) -> CookieJar {
    jar.add(auth_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO, production))
        .add(auth_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO, production))
}
