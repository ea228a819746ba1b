//! Lectern Axum Integration
//!
//! Request-time half of the guard layer for Axum services.
//!
//! # Overview
//!
//! - **Extractors**: [`RequireAuth`] and [`MaybeAuth`] decode the short-lived
//!   access token from the `Authorization: Bearer` header or the access cookie.
//! - **Rejections**: [`GuardRejection`] renders an [`AuthError`] as a JSON body
//!   with its status code, clearing both session cookies on authentication
//!   failures.
//! - **Cookies**: builders for the two separately scoped session cookies.
//!
//! # Quick Start
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use lectern_axum::{AuthState, RequireAuth};
//!
//! async fn me(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.email)
//! }
//!
//! let app = Router::new().route("/me", get(me)).with_state(state);
//! ```
//!
//! The router state must implement [`AuthState`].

pub mod cookies;
pub mod credential;
pub mod error;
pub mod extractors;

pub use cookies::{clearing_cookies, session_cookies};
pub use credential::{access_credential, CredentialSource};
pub use error::GuardRejection;
pub use extractors::{AuthState, MaybeAuth, RequireAuth};

pub use lectern_auth_core::AuthError;
