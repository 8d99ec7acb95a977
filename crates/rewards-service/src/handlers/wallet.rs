//! Wallet, plan, and ledger handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rewards_core::{plan, LedgerEntry, Plan, Wallet};

use super::{split_page, ListQuery};
use crate::auth::Session;
use crate::error::ApiError;
use crate::state::AppState;

/// Plan catalogue response.
#[derive(Debug, Serialize)]
pub struct PlansResponse {
    /// Plans on offer, cheapest first.
    pub plans: Vec<Plan>,
}

/// List the plan catalogue. No authentication required.
pub async fn list_plans() -> Json<PlansResponse> {
    Json(PlansResponse {
        plans: plan::catalogue(),
    })
}

/// Wallet response.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    /// Active plan, coins, and XP.
    #[serde(flatten)]
    pub wallet: Wallet,
    /// XP progress as a whole percentage.
    pub xp_percent: u8,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            xp_percent: wallet.xp_percent(),
            wallet,
        }
    }
}

/// Get the caller's wallet.
pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<WalletResponse>, ApiError> {
    let account = state
        .store
        .get_account(&session.user_id)?
        .ok_or(ApiError::AccountNotFound)?;

    Ok(Json(account.wallet.into()))
}

/// Select plan request.
#[derive(Debug, Deserialize)]
pub struct SelectPlanRequest {
    /// Plan to activate.
    pub plan_id: String,
}

/// Select plan response.
#[derive(Debug, Serialize)]
pub struct SelectPlanResponse {
    /// Wallet after the change.
    pub wallet: WalletResponse,
    /// Ledger entry for the plan reward.
    pub entry: LedgerEntry,
}

/// Activate a plan and credit its coin reward.
pub async fn select_plan(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<SelectPlanRequest>,
) -> Result<Json<SelectPlanResponse>, ApiError> {
    let (wallet, entry) = state.store.select_plan(&session.user_id, &body.plan_id)?;

    tracing::info!(
        user_id = %session.user_id,
        plan_id = %body.plan_id,
        coins = entry.amount,
        balance = wallet.coins,
        "Plan selected"
    );

    Ok(Json(SelectPlanResponse {
        wallet: wallet.into(),
        entry,
    }))
}

/// Ledger listing response.
#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    /// Entries (newest first).
    pub entries: Vec<LedgerEntry>,
    /// Whether there are more entries.
    pub has_more: bool,
}

/// List the caller's ledger entries.
pub async fn list_ledger(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Json<LedgerResponse>, ApiError> {
    // Verify account exists
    state
        .store
        .get_account(&session.user_id)?
        .ok_or(ApiError::AccountNotFound)?;

    let limit = query.capped_limit();
    let entries = state
        .store
        .list_entries_by_user(&session.user_id, limit + 1, query.offset)?;
    let (entries, has_more) = split_page(entries, limit);

    Ok(Json(LedgerResponse { entries, has_more }))
}
