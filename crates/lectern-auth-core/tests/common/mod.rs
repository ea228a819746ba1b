//! Common test utilities for lectern-auth-core integration tests

pub mod mock_repos;

use lectern_auth_core::AuthConfig;

#[allow(unused_imports)]
pub use mock_repos::MockStore;

/// Config with a fixed test secret
#[allow(dead_code)]
pub fn test_config() -> AuthConfig {
    AuthConfig::try_new("test-signing-secret-0123456789abcdef", "lectern-test").unwrap()
}
