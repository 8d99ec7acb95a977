//! Storage layer for the rewards ledger.
//!
//! This crate provides persistent storage for accounts, referral events, and
//! ledger entries. Two backends implement the [`Store`] trait:
//!
//! - [`MemoryStore`]: process-local, used by tests and single-node demos.
//! - `RocksStore` (feature `rocksdb-backend`): `RocksDB` optimistic
//!   transactions over column families.
//!
//! # Atomicity
//!
//! Every compound operation (account creation, referral linkage, plan
//! selection, bonus claim) reads and writes its records in one transaction.
//! Checks such as "the referrer field is still empty" are made inside that
//! transaction, so concurrent callers cannot both pass them.
//!
//! # Example
//!
//! ```
//! use rewards_store::{MemoryStore, Store};
//! use rewards_core::{ReferralOutcome, UserAccount, UserId, REFERRAL_REWARD_COINS};
//!
//! let store = MemoryStore::new();
//! let referrer = UserAccount::new(UserId::generate(), None, None);
//! let newcomer = UserAccount::new(UserId::generate(), None, None);
//! store.create_account(&referrer).unwrap();
//! store.create_account(&newcomer).unwrap();
//!
//! let outcome = store
//!     .link_referral(&newcomer.user_id, &referrer.user_id, REFERRAL_REWARD_COINS)
//!     .unwrap();
//! assert!(outcome.is_linked());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use rewards_core::{
    ClaimedBonus, EntryId, LedgerEntry, ProfileUpdate, ReferralEvent, ReferralOutcome,
    UserAccount, UserId, Wallet,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a new account and its signup ledger entry.
    ///
    /// Returns the signup entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the account exists.
    fn create_account(&self, account: &UserAccount) -> Result<LedgerEntry>;

    /// Overwrite an account record as is.
    ///
    /// Test seam for seeding fixtures: writes no ledger entry and skips the
    /// write-once referrer and balance checks. Not compiled outside tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    #[cfg(test)]
    fn put_account(&self, account: &UserAccount) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<UserAccount>>;

    /// Merge a profile edit into an account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<UserAccount>;

    // =========================================================================
    // Referral Operations
    // =========================================================================

    /// Link `referred_id` to `referrer_id` and reward the referrer, atomically.
    ///
    /// Writes the referred account's `referrer_id`, the referrer's wallet and
    /// `referral_count`, the referral event, and the ledger entry, or nothing.
    /// Rejections are returned as outcomes, not errors:
    ///
    /// - `InvalidReferrer` when the referrer account does not exist.
    /// - `UnknownAccount` when the referred account does not exist.
    /// - `SelfReferral` when both ids are equal.
    /// - `AlreadyLinked` when the referred account already has a referrer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn link_referral(
        &self,
        referred_id: &UserId,
        referrer_id: &UserId,
        reward_coins: i64,
    ) -> Result<ReferralOutcome>;

    /// Get the referral event recorded for a referred account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_referral(&self, referred_id: &UserId) -> Result<Option<ReferralEvent>>;

    /// List referral events credited to a referrer (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_referrals_by_referrer(
        &self,
        referrer_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferralEvent>>;

    /// Count referral events credited to a referrer using the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_referrals_by_referrer(&self, referrer_id: &UserId) -> Result<u64>;

    // =========================================================================
    // Wallet Operations
    // =========================================================================

    /// Select a plan, crediting its coin reward.
    ///
    /// Returns the updated wallet and the ledger entry.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::Rewards` for unknown or already active plans.
    fn select_plan(&self, user_id: &UserId, plan_id: &str) -> Result<(Wallet, LedgerEntry)>;

    /// Claim a referral bonus.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::Rewards` for unknown, unearned, or claimed bonuses.
    fn claim_bonus(&self, user_id: &UserId, bonus_id: &str) -> Result<ClaimedBonus>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>>;

    /// List ledger entries for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;
}

/// Map a domain rejection from `apply_referral` onto an outcome.
///
/// Errors that are not rejections are passed back to the caller.
pub(crate) fn referral_rejection(err: rewards_core::RewardsError) -> Result<ReferralOutcome> {
    match err {
        rewards_core::RewardsError::SelfReferral => Ok(ReferralOutcome::SelfReferral),
        rewards_core::RewardsError::ReferrerAlreadySet { referrer_id } => {
            Ok(ReferralOutcome::AlreadyLinked { referrer_id })
        }
        other => Err(StoreError::Rewards(other)),
    }
}
