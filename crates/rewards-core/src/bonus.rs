//! Referral bonus catalogue and progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserAccount;

/// A bonus unlocked by referring enough friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusDefinition {
    /// Stable bonus id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// What the bonus gives.
    pub description: &'static str,
    /// Human-readable unlock condition.
    pub condition: &'static str,
    /// Referrals required.
    pub target: u64,
}

const BONUSES: [BonusDefinition; 2] = [
    BonusDefinition {
        id: "free_month",
        name: "Free Month",
        description: "Get one month free subscription",
        condition: "Refer 3 friends",
        target: 3,
    },
    BonusDefinition {
        id: "premium_features",
        name: "Premium Features",
        description: "Unlock exclusive AI capabilities",
        condition: "Refer 5 friends",
        target: 5,
    },
];

/// All bonuses on offer.
#[must_use]
pub fn catalogue() -> &'static [BonusDefinition] {
    &BONUSES
}

/// Look up a bonus by id.
#[must_use]
pub fn find_bonus(bonus_id: &str) -> Option<&'static BonusDefinition> {
    BONUSES.iter().find(|b| b.id == bonus_id)
}

/// A bonus recorded on an account once claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedBonus {
    /// The bonus id.
    pub bonus_id: String,
    /// Display name at claim time.
    pub name: String,
    /// When it was claimed.
    pub claimed_at: DateTime<Utc>,
}

/// Progress of one account towards one bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusProgress {
    /// The bonus id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the bonus gives.
    pub description: String,
    /// Unlock condition.
    pub condition: String,
    /// Referrals made so far.
    pub progress: u64,
    /// Referrals required.
    pub target: u64,
    /// Whether it can be claimed now.
    pub claimable: bool,
    /// Whether it was already claimed.
    pub claimed: bool,
}

/// Progress of `account` towards every bonus in the catalogue.
#[must_use]
pub fn progress_for(account: &UserAccount) -> Vec<BonusProgress> {
    BONUSES
        .iter()
        .map(|b| {
            let claimed = account.has_claimed(b.id);
            BonusProgress {
                id: b.id.to_string(),
                name: b.name.to_string(),
                description: b.description.to_string(),
                condition: b.condition.to_string(),
                progress: account.referral_count,
                target: b.target,
                claimable: !claimed && account.referral_count >= b.target,
                claimed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    #[test]
    fn progress_tracks_referral_count() {
        let mut account = UserAccount::new(UserId::generate(), None, None);
        account.referral_count = 4;

        let progress = progress_for(&account);
        assert_eq!(progress.len(), 2);
        assert!(progress[0].claimable);
        assert!(!progress[1].claimable);
        assert_eq!(progress[1].progress, 4);
        assert_eq!(progress[1].target, 5);
    }

    #[test]
    fn claimed_bonus_is_not_claimable() {
        let mut account = UserAccount::new(UserId::generate(), None, None);
        account.referral_count = 3;
        account.claim_bonus("free_month").unwrap();

        let progress = progress_for(&account);
        assert!(progress[0].claimed);
        assert!(!progress[0].claimable);
    }
}
