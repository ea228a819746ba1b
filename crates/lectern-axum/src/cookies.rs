//! Session cookie builders.
//!
//! The access cookie is scoped to `/` and lives as long as the access token.
//! The rotation cookie is scoped to the auth routes so it is only sent where
//! it can be exchanged. Both are `HttpOnly` and `SameSite=Strict`.

use lectern_auth_core::CookieSettings;
use lectern_types::TokenPair;

fn cookie(name: &str, value: &str, path: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}={value}; HttpOnly{secure}; SameSite=Strict; Path={path}; Max-Age={max_age}")
}

/// Access token cookie
pub fn access_cookie(settings: &CookieSettings, token: &str, max_age_secs: u64) -> String {
    cookie(&settings.access_name, token, "/", max_age_secs, settings.secure)
}

/// Rotation secret cookie
pub fn rotation_cookie(settings: &CookieSettings, secret: &str, max_age_secs: u64) -> String {
    cookie(
        &settings.rotation_name,
        secret,
        &settings.rotation_path,
        max_age_secs,
        settings.secure,
    )
}

/// Both cookies for a freshly issued pair
pub fn session_cookies(settings: &CookieSettings, tokens: &TokenPair) -> [String; 2] {
    [
        access_cookie(settings, &tokens.access_token, tokens.access_expires_in),
        rotation_cookie(settings, &tokens.rotation_token, tokens.rotation_expires_in),
    ]
}

/// Expire both cookies
pub fn clearing_cookies(settings: &CookieSettings) -> [String; 2] {
    [access_cookie(settings, "", 0), rotation_cookie(settings, "", 0)]
}
