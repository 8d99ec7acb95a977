//! Request and response types for the rewards API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use rewards_core::{
    BonusProgress, ClaimedBonus, LedgerEntry, Plan, ProfileUpdate, ReferralEvent,
    ReferralOutcome, Wallet,
};

// ============================================================================
// Accounts
// ============================================================================

/// Create account request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateAccountRequest {
    /// Display name; the server defaults it to "User".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// An account as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
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
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Referrals
// ============================================================================

/// Referral claim request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClaimReferralRequest {
    /// Referrer code.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Page URL carrying `?ref=<code>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Referral figures for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferralStats {
    /// Link to share.
    pub referral_link: String,
    /// Who referred the caller.
    pub referrer_id: Option<String>,
    /// Successful referrals.
    pub referral_count: u64,
    /// Coins earned from referrals.
    pub coins_earned: i64,
}

/// One page of referral events.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferralPage {
    /// Events, newest first.
    pub referrals: Vec<ReferralEvent>,
    /// Whether more pages follow.
    pub has_more: bool,
}

// ============================================================================
// Plans and wallet
// ============================================================================

/// Plan catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct PlansResponse {
    /// Plans, cheapest first.
    pub plans: Vec<Plan>,
}

/// Wallet with display extras.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletInfo {
    /// Plan, coins, and XP.
    #[serde(flatten)]
    pub wallet: Wallet,
    /// XP progress as a whole percentage.
    pub xp_percent: u8,
}

/// Select plan request.
#[derive(Debug, Clone, Serialize)]
pub struct SelectPlanRequest {
    /// Plan to activate.
    pub plan_id: String,
}

/// Result of selecting a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectPlanResponse {
    /// Wallet after the change.
    pub wallet: WalletInfo,
    /// The reward entry.
    pub entry: LedgerEntry,
}

/// One page of ledger entries.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerPage {
    /// Entries, newest first.
    pub entries: Vec<LedgerEntry>,
    /// Whether more pages follow.
    pub has_more: bool,
}

// ============================================================================
// Bonuses
// ============================================================================

/// Bonus progress.
#[derive(Debug, Clone, Deserialize)]
pub struct BonusesResponse {
    /// Referrals made so far.
    pub referral_count: u64,
    /// Every bonus with progress.
    pub bonuses: Vec<BonusProgress>,
}

// ============================================================================
// Misc
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
