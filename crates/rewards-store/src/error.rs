//! Error types for rewards storage.

use rewards_core::RewardsError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// Record already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of record.
        entity: &'static str,
        /// Key that collided.
        id: String,
    },

    /// A transaction kept conflicting with concurrent writers.
    #[error("write conflict after {attempts} attempts")]
    Conflict {
        /// Number of attempts made.
        attempts: u32,
    },

    /// A domain rule refused the change.
    #[error(transparent)]
    Rewards(#[from] RewardsError),
}

impl StoreError {
    pub(crate) fn account_not_found(id: &rewards_core::UserId) -> Self {
        Self::NotFound {
            entity: "account",
            id: id.to_string(),
        }
    }
}
