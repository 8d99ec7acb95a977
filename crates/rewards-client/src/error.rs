//! Client error types.

/// Errors that can occur when using the rewards client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The caller has no account yet.
    #[error("account not found: {message}")]
    AccountNotFound {
        /// Server message.
        message: String,
    },

    /// The requested plan is already active.
    #[error("plan already active: {plan_id}")]
    PlanAlreadyActive {
        /// The plan id.
        plan_id: String,
    },

    /// Referral progress is below the bonus target.
    #[error("bonus {bonus_id} not earned: {progress}/{target}")]
    BonusNotEarned {
        /// The bonus id.
        bonus_id: String,
        /// Current referral count.
        progress: u64,
        /// Referrals required.
        target: u64,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
