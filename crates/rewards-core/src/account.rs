//! Account types for the rewards ledger.
//!
//! This module defines the user account record, its embedded wallet, and the
//! profile fields a user may edit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bonus::{self, ClaimedBonus};
use crate::error::{Result, RewardsError};
use crate::plan::{self, DEFAULT_PLAN_ID};
use crate::{LedgerEntry, ReferralCode, UserId};

// ============================================================================
// Constants
// ============================================================================

/// Coins granted to every new wallet.
pub const STARTING_COINS: i64 = 100;

/// Experience points at which the progress bar is full.
pub const MAX_XP: i64 = 1000;

/// Display name used when the identity provider supplies none.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// A user account.
///
/// Created on first successful sign-in. The `referrer_id` field is
/// write-once: see [`UserAccount::set_referrer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// The user ID (from the identity provider).
    pub user_id: UserId,

    /// Name shown on the dashboard.
    pub display_name: String,

    /// Email address, if the provider shared one.
    pub email: Option<String>,

    /// Phone number (empty when unknown).
    #[serde(default)]
    pub phone: String,

    /// Avatar URL (empty when unknown).
    #[serde(default)]
    pub photo_url: String,

    /// Short code generated at creation.
    pub referral_code: ReferralCode,

    /// The account that referred this one. Set at most once.
    pub referrer_id: Option<UserId>,

    /// Number of accounts this user has referred.
    ///
    /// Maintained in the same write as each referral reward.
    pub referral_count: u64,

    /// Referral bonuses this user has claimed.
    #[serde(default)]
    pub bonuses: Vec<ClaimedBonus>,

    /// Plan and coin balance.
    pub wallet: Wallet,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Create a new account with a fresh wallet and referral code.
    #[must_use]
    pub fn new(user_id: UserId, display_name: Option<String>, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            display_name: display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            email,
            phone: String::new(),
            photo_url: String::new(),
            referral_code: ReferralCode::generate(),
            referrer_id: None,
            referral_count: 0,
            bonuses: Vec::new(),
            wallet: Wallet::initial(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the referrer of this account.
    ///
    /// # Errors
    ///
    /// - `RewardsError::SelfReferral` if `referrer_id` is this account.
    /// - `RewardsError::ReferrerAlreadySet` if a referrer is already recorded.
    pub fn set_referrer(&mut self, referrer_id: &UserId) -> Result<()> {
        if *referrer_id == self.user_id {
            return Err(RewardsError::SelfReferral);
        }
        if let Some(existing) = &self.referrer_id {
            return Err(RewardsError::ReferrerAlreadySet {
                referrer_id: existing.clone(),
            });
        }
        self.referrer_id = Some(referrer_id.clone());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Merge a profile edit into the account.
    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        if let Some(name) = update.display_name.as_ref().filter(|n| !n.trim().is_empty()) {
            self.display_name.clone_from(name);
        }
        if let Some(phone) = &update.phone {
            self.phone.clone_from(phone);
        }
        if let Some(photo_url) = &update.photo_url {
            self.photo_url.clone_from(photo_url);
        }
        self.updated_at = Utc::now();
    }

    /// Switch to another plan and credit its coin reward.
    ///
    /// # Errors
    ///
    /// - `RewardsError::UnknownPlan` if the id is not in the catalogue.
    /// - `RewardsError::PlanAlreadyActive` if it is the current plan.
    /// - `RewardsError::BalanceOverflow` from the wallet credit.
    pub fn select_plan(&mut self, plan_id: &str) -> Result<LedgerEntry> {
        let plan =
            plan::find_plan(plan_id).ok_or_else(|| RewardsError::UnknownPlan(plan_id.into()))?;
        if self.wallet.plan_id == plan.id {
            return Err(RewardsError::PlanAlreadyActive(plan.id));
        }

        let now = Utc::now();
        let mut wallet = self.wallet.clone();
        let balance = wallet.credit(plan.coins_reward)?;
        let entry =
            LedgerEntry::plan_reward(self.user_id.clone(), &plan.id, plan.coins_reward, balance)?;
        wallet.plan_id.clone_from(&plan.id);
        wallet.started_at = now;
        self.wallet = wallet;
        self.updated_at = now;

        Ok(entry)
    }

    /// Ledger entry recording the starting balance of this account's wallet.
    ///
    /// # Errors
    ///
    /// Returns `RewardsError::InvalidId` if no entry id can be generated.
    pub fn signup_entry(&self) -> Result<LedgerEntry> {
        LedgerEntry::signup_grant(self.user_id.clone(), self.wallet.coins)
    }

    /// Check whether a bonus has been claimed.
    #[must_use]
    pub fn has_claimed(&self, bonus_id: &str) -> bool {
        self.bonuses.iter().any(|b| b.bonus_id == bonus_id)
    }

    /// Claim a referral bonus.
    ///
    /// # Errors
    ///
    /// - `RewardsError::UnknownBonus` if the id is not in the catalogue.
    /// - `RewardsError::BonusAlreadyClaimed` if it was claimed before.
    /// - `RewardsError::BonusNotEarned` if the referral count is below target.
    pub fn claim_bonus(&mut self, bonus_id: &str) -> Result<ClaimedBonus> {
        let definition = bonus::find_bonus(bonus_id)
            .ok_or_else(|| RewardsError::UnknownBonus(bonus_id.to_string()))?;

        if self.has_claimed(bonus_id) {
            return Err(RewardsError::BonusAlreadyClaimed(bonus_id.to_string()));
        }
        if self.referral_count < definition.target {
            return Err(RewardsError::BonusNotEarned {
                bonus_id: bonus_id.to_string(),
                progress: self.referral_count,
                target: definition.target,
            });
        }

        let now = Utc::now();
        let claimed = ClaimedBonus {
            bonus_id: definition.id.to_string(),
            name: definition.name.to_string(),
            claimed_at: now,
        };
        self.bonuses.push(claimed.clone());
        self.updated_at = now;
        Ok(claimed)
    }
}

/// Fields a user may change on their profile. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New display name (blank values are ignored).
    pub display_name: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New avatar URL.
    pub photo_url: Option<String>,
}

/// Active plan and coin balance for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Active plan id (see [`crate::plan::catalogue`]).
    pub plan_id: String,

    /// Coin balance. Never negative.
    pub coins: i64,

    /// Experience points.
    pub xp: i64,

    /// When the current plan was started.
    pub started_at: DateTime<Utc>,
}

impl Wallet {
    /// Wallet given to every new account: default plan and starting coins.
    #[must_use]
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            plan_id: DEFAULT_PLAN_ID.to_string(),
            coins: STARTING_COINS,
            xp: 0,
            started_at: now,
        }
    }

    /// Add coins to the balance. Returns the new balance.
    ///
    /// # Errors
    ///
    /// - `RewardsError::InvalidAmount` if `amount` is not positive.
    /// - `RewardsError::BalanceOverflow` if the balance would overflow.
    pub fn credit(&mut self, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(RewardsError::InvalidAmount(amount));
        }
        self.coins = self
            .coins
            .checked_add(amount)
            .ok_or(RewardsError::BalanceOverflow)?;
        Ok(self.coins)
    }

    /// XP progress towards [`MAX_XP`] as a whole percentage (0-100).
    #[must_use]
    pub fn xp_percent(&self) -> u8 {
        let clamped = self.xp.clamp(0, MAX_XP);
        // clamped * 100 / MAX_XP is within 0..=100
        u8::try_from(clamped * 100 / MAX_XP).unwrap_or(100)
    }
}
