//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use rewards_core::{IdError, RewardsError};
use rewards_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller has no account yet.
    #[error("Account not found")]
    AccountNotFound,

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested plan is already the active one.
    #[error("plan already active: {0}")]
    PlanAlreadyActive(String),

    /// Referral progress is below the bonus target.
    #[error("bonus {bonus_id} not earned: {progress}/{target} referrals")]
    BonusNotEarned {
        /// Bonus requested.
        bonus_id: String,
        /// Current referral count.
        progress: u64,
        /// Referrals required.
        target: u64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::AccountNotFound => (
                StatusCode::NOT_FOUND,
                "account_not_found",
                self.to_string(),
                None,
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::PlanAlreadyActive(plan_id) => (
                StatusCode::CONFLICT,
                "plan_already_active",
                self.to_string(),
                Some(serde_json::json!({ "plan_id": plan_id })),
            ),
            Self::BonusNotEarned {
                bonus_id,
                progress,
                target,
            } => (
                StatusCode::CONFLICT,
                "bonus_not_earned",
                self.to_string(),
                Some(serde_json::json!({
                    "bonus_id": bonus_id,
                    "progress": progress,
                    "target": target
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RewardsError> for ApiError {
    fn from(err: RewardsError) -> Self {
        match err {
            RewardsError::InvalidId(IdError::Exhausted) => {
                Self::Internal(IdError::Exhausted.to_string())
            }
            RewardsError::InvalidId(e) => Self::BadRequest(e.to_string()),
            RewardsError::UnknownPlan(id) => Self::NotFound(format!("plan not found: {id}")),
            RewardsError::UnknownBonus(id) => Self::NotFound(format!("bonus not found: {id}")),
            RewardsError::PlanAlreadyActive(id) => Self::PlanAlreadyActive(id),
            RewardsError::BonusNotEarned {
                bonus_id,
                progress,
                target,
            } => Self::BonusNotEarned {
                bonus_id,
                progress,
                target,
            },
            err @ (RewardsError::BonusAlreadyClaimed(_)
            | RewardsError::ReferrerAlreadySet { .. }
            | RewardsError::SelfReferral) => Self::Conflict(err.to_string()),
            err @ (RewardsError::InvalidAmount(_) | RewardsError::BalanceOverflow) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound {
                entity: "account", ..
            } => Self::AccountNotFound,
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::AlreadyExists { entity, .. } => {
                Self::Conflict(format!("{entity} already exists"))
            }
            StoreError::Rewards(e) => e.into(),
            err @ StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_api_errors() {
        let not_found: ApiError = StoreError::NotFound {
            entity: "account",
            id: "abc".into(),
        }
        .into();
        assert!(matches!(not_found, ApiError::AccountNotFound));

        let entry: ApiError = StoreError::NotFound {
            entity: "ledger entry",
            id: "abc".into(),
        }
        .into();
        assert!(matches!(entry, ApiError::NotFound(_)));

        let active: ApiError =
            StoreError::Rewards(RewardsError::PlanAlreadyActive("pro".into())).into();
        assert!(matches!(active, ApiError::PlanAlreadyActive(ref id) if id == "pro"));

        let db: ApiError = StoreError::Database("disk full".into()).into();
        assert!(matches!(db, ApiError::Internal(_)));
    }

    #[test]
    fn exhausted_retries_are_a_conflict() {
        let api: ApiError = StoreError::Conflict { attempts: 8 }.into();
        assert!(matches!(api, ApiError::Conflict(_)));
        assert_eq!(api.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn exhausted_entry_ids_are_internal() {
        let api: ApiError = StoreError::Rewards(RewardsError::InvalidId(IdError::Exhausted)).into();
        assert!(matches!(api, ApiError::Internal(_)));

        let bad_id: ApiError = RewardsError::InvalidId(IdError::Empty).into();
        assert!(matches!(bad_id, ApiError::BadRequest(_)));
    }

    #[test]
    fn internal_errors_are_masked() {
        let response = ApiError::Internal("disk full".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
