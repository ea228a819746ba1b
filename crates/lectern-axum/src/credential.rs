//! Credential extraction from request headers.
//!
//! The bearer header wins over the access cookie when both are present.

use axum::http::{header, HeaderMap};
use lectern_auth_core::CookieSettings;

/// Where the access token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `Authorization: Bearer <token>`
    BearerHeader,
    /// The access cookie
    Cookie,
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Value of the named cookie, searching every `Cookie` header
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}

/// The access token presented with a request, if any
pub fn access_credential<'a>(
    headers: &'a HeaderMap,
    cookies: &CookieSettings,
) -> Option<(&'a str, CredentialSource)> {
    if let Some(token) = bearer_token(headers) {
        return Some((token, CredentialSource::BearerHeader));
    }
    cookie_value(headers, &cookies.access_name).map(|token| (token, CredentialSource::Cookie))
}

/// The rotation secret presented with a request, if any
pub fn rotation_credential<'a>(headers: &'a HeaderMap, cookies: &CookieSettings) -> Option<&'a str> {
    cookie_value(headers, &cookies.rotation_name)
}
