//! Ledger entry types.
//!
//! Every change to a wallet's coin balance creates a ledger entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::{EntryId, UserId};

/// A ledger entry representing one coin movement.
///
/// Entries use ULIDs so that per-user listings come back in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Coins credited.
    pub amount: i64,

    /// What caused the movement.
    pub kind: EntryKind,

    /// Balance after this entry.
    pub balance_after: i64,

    /// Human-readable description.
    pub description: String,

    /// Additional metadata (referred user, plan id).
    pub metadata: serde_json::Value,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Starting balance granted when the wallet is created.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::InvalidId` if no entry id can be generated.
    pub fn signup_grant(user_id: UserId, amount: i64) -> Result<Self> {
        Ok(Self {
            id: EntryId::generate()?,
            user_id,
            amount,
            kind: EntryKind::SignupGrant,
            balance_after: amount,
            description: "Welcome coins".to_string(),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        })
    }

    /// Reward credited to a referrer for bringing in `referred_id`.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::InvalidId` if no entry id can be generated.
    pub fn referral_reward(
        referrer_id: UserId,
        referred_id: &UserId,
        amount: i64,
        balance_after: i64,
    ) -> Result<Self> {
        Ok(Self {
            id: EntryId::generate()?,
            user_id: referrer_id,
            amount,
            kind: EntryKind::ReferralReward,
            balance_after,
            description: format!("Referral reward for {referred_id}"),
            metadata: serde_json::json!({ "referred_id": referred_id }),
            created_at: Utc::now(),
        })
    }

    /// Coins credited on plan selection.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::InvalidId` if no entry id can be generated.
    pub fn plan_reward(
        user_id: UserId,
        plan_id: &str,
        amount: i64,
        balance_after: i64,
    ) -> Result<Self> {
        Ok(Self {
            id: EntryId::generate()?,
            user_id,
            amount,
            kind: EntryKind::PlanReward,
            balance_after,
            description: format!("Coins for selecting the {plan_id} plan"),
            metadata: serde_json::json!({ "plan_id": plan_id }),
            created_at: Utc::now(),
        })
    }
}

/// Kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Starting balance of a new wallet.
    SignupGrant,

    /// Credit to a referrer.
    ReferralReward,

    /// Credit for selecting a plan.
    PlanReward,
}

impl EntryKind {
    /// Stable lowercase name, matching the serialized form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SignupGrant => "signup_grant",
            Self::ReferralReward => "referral_reward",
            Self::PlanReward => "plan_reward",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_reward_entry() {
        let referrer = UserId::generate();
        let referred = UserId::generate();
        let entry = LedgerEntry::referral_reward(referrer.clone(), &referred, 50, 150).unwrap();

        assert_eq!(entry.user_id, referrer);
        assert_eq!(entry.amount, 50);
        assert_eq!(entry.kind, EntryKind::ReferralReward);
        assert_eq!(entry.balance_after, 150);
        assert_eq!(entry.metadata["referred_id"], referred.as_str());
    }

    #[test]
    fn kind_names_match_serde() {
        for kind in [
            EntryKind::SignupGrant,
            EntryKind::ReferralReward,
            EntryKind::PlanReward,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
