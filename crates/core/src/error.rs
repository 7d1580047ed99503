//! Domain error type shared by the database and HTTP layers.

use crate::types::DbId;

/// Errors raised by domain logic. The API layer maps each variant onto an
/// HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced row (user, job, save) does not exist.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Client input was rejected (malformed interval, negative totals, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to see the requested operator.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A configuration value could not be parsed.
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
