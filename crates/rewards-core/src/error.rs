//! Error types for the rewards ledger.

use crate::ids::IdError;
use crate::UserId;

/// Result type for rewards operations.
pub type Result<T> = std::result::Result<T, RewardsError>;

/// Errors raised by domain rules on accounts and wallets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewardsError {
    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Coin amounts credited to a wallet must be positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// A credit would overflow the balance.
    #[error("balance overflow")]
    BalanceOverflow,

    /// The write-once referrer field is already set.
    #[error("referrer already set to {referrer_id}")]
    ReferrerAlreadySet {
        /// The referrer recorded on the account.
        referrer_id: UserId,
    },

    /// An account cannot refer itself.
    #[error("self referral is not allowed")]
    SelfReferral,

    /// Plan id is not in the catalogue.
    #[error("unknown plan: {0}")]
    UnknownPlan(String),

    /// The requested plan is already active.
    #[error("plan already active: {0}")]
    PlanAlreadyActive(String),

    /// Bonus id is not in the catalogue.
    #[error("unknown bonus: {0}")]
    UnknownBonus(String),

    /// Referral progress has not reached the bonus target.
    #[error("bonus {bonus_id} not earned: progress={progress}, target={target}")]
    BonusNotEarned {
        /// The bonus requested.
        bonus_id: String,
        /// Current referral count.
        progress: u64,
        /// Referrals required.
        target: u64,
    },

    /// Bonus has already been claimed.
    #[error("bonus already claimed: {0}")]
    BonusAlreadyClaimed(String),
}
