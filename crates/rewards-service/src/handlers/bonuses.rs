//! Referral bonus handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use rewards_core::{bonus, BonusProgress, ClaimedBonus};

use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// Bonus progress response.
#[derive(Debug, Serialize)]
pub struct BonusesResponse {
    /// Referrals made so far.
    pub referral_count: u64,
    /// Every bonus with the caller's progress.
    pub bonuses: Vec<BonusProgress>,
}

/// Show progress towards each bonus.
pub async fn list_bonuses(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<BonusesResponse>, ApiError> {
    let account = state
        .store
        .get_account(&session.user_id)?
        .ok_or(ApiError::AccountNotFound)?;

    Ok(Json(BonusesResponse {
        referral_count: account.referral_count,
        bonuses: bonus::progress_for(&account),
    }))
}

/// Claim a bonus whose referral target has been reached.
pub async fn claim_bonus(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(bonus_id): Path<String>,
) -> Result<Json<ClaimedBonus>, ApiError> {
    let claimed = state.store.claim_bonus(&session.user_id, &bonus_id)?;

    tracing::info!(user_id = %session.user_id, bonus_id = %bonus_id, "Bonus claimed");

    Ok(Json(claimed))
}
