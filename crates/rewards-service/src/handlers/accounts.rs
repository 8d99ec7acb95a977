//! Account management handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use rewards_core::{ClaimedBonus, ProfileUpdate, UserAccount, Wallet};

use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// User ID.
    pub user_id: String,
    /// Display name.
    pub display_name: String,
    /// Email, if known.
    pub email: Option<String>,
    /// Phone number.
    pub phone: String,
    /// Avatar URL.
    pub photo_url: String,
    /// Short referral code.
    pub referral_code: String,
    /// Who referred this user.
    pub referrer_id: Option<String>,
    /// Referrals made by this user.
    pub referral_count: u64,
    /// Claimed bonuses.
    pub bonuses: Vec<ClaimedBonus>,
    /// Wallet.
    pub wallet: Wallet,
    /// Created timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl From<&UserAccount> for AccountResponse {
    fn from(account: &UserAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            display_name: account.display_name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            photo_url: account.photo_url.clone(),
            referral_code: account.referral_code.as_str().to_string(),
            referrer_id: account.referrer_id.as_ref().map(ToString::to_string),
            referral_count: account.referral_count,
            bonuses: account.bonuses.clone(),
            wallet: account.wallet.clone(),
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// Create account request (optional fields from the identity provider).
#[derive(Debug, Default, Deserialize)]
pub struct CreateAccountRequest {
    /// Display name; defaults to "User".
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Create the caller's account on first sign-in.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let mut account = UserAccount::new(session.user_id.clone(), body.display_name, body.email);
    account.apply_profile(&ProfileUpdate {
        display_name: None,
        phone: body.phone,
        photo_url: body.photo_url,
    });

    state.store.create_account(&account).map_err(|e| match e {
        rewards_store::StoreError::AlreadyExists { .. } => {
            ApiError::Conflict("Account already exists".into())
        }
        other => other.into(),
    })?;

    tracing::info!(
        user_id = %session.user_id,
        referral_code = %account.referral_code.as_str(),
        "Account created"
    );

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// Get the current user's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&session.user_id)?
        .ok_or(ApiError::AccountNotFound)?;

    Ok(Json(AccountResponse::from(&account)))
}

/// Edit the current user's profile.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.store.update_profile(&session.user_id, &update)?;

    tracing::info!(user_id = %session.user_id, "Profile updated");

    Ok(Json(AccountResponse::from(&account)))
}
