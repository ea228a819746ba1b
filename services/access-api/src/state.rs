//! Application state

use std::sync::Arc;

use lectern_auth_core::{
    ClaimWorkflow, CookieSettings, EnrollmentFanout, EntitlementResolver, SessionManager,
    TokenCodec,
};
use lectern_axum::AuthState;
use lectern_db::{DbPool, Repositories};

use crate::config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Token issuance, rotation and revocation
    pub sessions: Arc<SessionManager<Repositories>>,
    /// Course and lesson access checks
    pub entitlements: Arc<EntitlementResolver<Repositories>>,
    /// Grant administration and subscription fan-out
    pub fanout: Arc<EnrollmentFanout<Repositories>>,
    /// Roster claims and ingestion
    pub claims: Arc<ClaimWorkflow<Repositories>>,
    /// Database pool (readiness checks)
    pub pool: DbPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the core components over one repository bundle
    pub fn new(pool: DbPool, config: Config) -> Self {
        let store = Arc::new(Repositories::new(pool.clone()));
        Self {
            sessions: Arc::new(SessionManager::new(&config.auth, Arc::clone(&store))),
            entitlements: Arc::new(EntitlementResolver::new(Arc::clone(&store))),
            fanout: Arc::new(EnrollmentFanout::new(Arc::clone(&store))),
            claims: Arc::new(ClaimWorkflow::new(store, config.auth.roster_link_policy)),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }

    /// Cookie names, paths and flags
    pub fn cookies(&self) -> &CookieSettings {
        &self.config.auth.cookies
    }
}

impl AuthState for AppState {
    fn token_codec(&self) -> &TokenCodec {
        self.sessions.codec()
    }

    fn cookie_settings(&self) -> &CookieSettings {
        &self.config.auth.cookies
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
