//! Parse errors for string-encoded domain values

use thiserror::Error;

/// Error parsing a stored or transmitted enum value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown global role
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// Unknown organization role
    #[error("invalid organization role: {0}")]
    InvalidOrgRole(String),

    /// Unknown enrollment access source
    #[error("invalid access source: {0}")]
    InvalidAccessSource(String),
}
