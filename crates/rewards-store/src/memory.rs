//! In-memory storage implementation.
//!
//! All state sits behind one mutex, so every compound operation is a single
//! critical section. Index keys use the same encoding as the `RocksDB`
//! backend, which keeps listing order identical across backends.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use rewards_core::referral::apply_referral;
use rewards_core::{
    ClaimedBonus, EntryId, LedgerEntry, ProfileUpdate, ReferralEvent,
    ReferralOutcome, UserAccount, UserId, Wallet,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::{referral_rejection, Store};

/// Process-local storage backend.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<UserId, UserAccount>,
    ledger: HashMap<EntryId, LedgerEntry>,
    ledger_by_user: BTreeSet<Vec<u8>>,
    referrals: HashMap<UserId, ReferralEvent>,
    referrals_by_referrer: BTreeMap<Vec<u8>, UserId>,
}

impl MemoryState {
    fn insert_entry(&mut self, entry: LedgerEntry) {
        self.ledger_by_user
            .insert(keys::user_entry_key(&entry.user_id, &entry.id));
        self.ledger.insert(entry.id, entry);
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

/// Keys under `prefix`, newest first, after skipping `offset`, at most `limit`.
fn page_newest_first<'a, I>(keys: I, prefix: &[u8], limit: usize, offset: usize) -> Vec<Vec<u8>>
where
    I: Iterator<Item = &'a Vec<u8>>,
{
    let mut matching: Vec<Vec<u8>> = keys
        .skip_while(|k| k.as_slice() < prefix)
        .take_while(|k| k.starts_with(prefix))
        .cloned()
        .collect();
    matching.reverse();
    matching.into_iter().skip(offset).take(limit).collect()
}

impl Store for MemoryStore {
    fn create_account(&self, account: &UserAccount) -> Result<LedgerEntry> {
        let mut state = self.lock()?;
        if state.accounts.contains_key(&account.user_id) {
            return Err(StoreError::AlreadyExists {
                entity: "account",
                id: account.user_id.to_string(),
            });
        }

        let entry = account.signup_entry()?;
        state
            .accounts
            .insert(account.user_id.clone(), account.clone());
        state.insert_entry(entry.clone());
        Ok(entry)
    }

    #[cfg(test)]
    fn put_account(&self, account: &UserAccount) -> Result<()> {
        let mut state = self.lock()?;
        state
            .accounts
            .insert(account.user_id.clone(), account.clone());
        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<UserAccount>> {
        Ok(self.lock()?.accounts.get(user_id).cloned())
    }

    fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<UserAccount> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| StoreError::account_not_found(user_id))?;
        account.apply_profile(update);
        Ok(account.clone())
    }

    fn link_referral(
        &self,
        referred_id: &UserId,
        referrer_id: &UserId,
        reward_coins: i64,
    ) -> Result<ReferralOutcome> {
        if referred_id == referrer_id {
            return Ok(ReferralOutcome::SelfReferral);
        }

        let mut state = self.lock()?;
        let Some(mut referrer) = state.accounts.get(referrer_id).cloned() else {
            return Ok(ReferralOutcome::InvalidReferrer);
        };
        let Some(mut referred) = state.accounts.get(referred_id).cloned() else {
            return Ok(ReferralOutcome::UnknownAccount);
        };

        let (event, entry) = match apply_referral(&mut referred, &mut referrer, reward_coins) {
            Ok(applied) => applied,
            Err(err) => return referral_rejection(err),
        };

        let outcome = ReferralOutcome::Linked {
            referrer_id: referrer_id.clone(),
            reward_coins,
            referrer_balance: referrer.wallet.coins,
            entry_id: entry.id,
        };

        state.referrals_by_referrer.insert(
            keys::user_entry_key(referrer_id, &entry.id),
            referred_id.clone(),
        );
        state.referrals.insert(referred_id.clone(), event);
        state.insert_entry(entry);
        state.accounts.insert(referred_id.clone(), referred);
        state.accounts.insert(referrer_id.clone(), referrer);

        Ok(outcome)
    }

    fn get_referral(&self, referred_id: &UserId) -> Result<Option<ReferralEvent>> {
        Ok(self.lock()?.referrals.get(referred_id).cloned())
    }

    fn list_referrals_by_referrer(
        &self,
        referrer_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferralEvent>> {
        let state = self.lock()?;
        let prefix = keys::user_prefix(referrer_id);
        let page = page_newest_first(
            state.referrals_by_referrer.keys(),
            &prefix,
            limit,
            offset,
        );

        Ok(page
            .iter()
            .filter_map(|key| state.referrals_by_referrer.get(key))
            .filter_map(|referred| state.referrals.get(referred).cloned())
            .collect())
    }

    fn count_referrals_by_referrer(&self, referrer_id: &UserId) -> Result<u64> {
        let state = self.lock()?;
        let prefix = keys::user_prefix(referrer_id);
        let count = state
            .referrals_by_referrer
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .count();
        Ok(count as u64)
    }

    fn select_plan(&self, user_id: &UserId, plan_id: &str) -> Result<(Wallet, LedgerEntry)> {
        let mut state = self.lock()?;
        let mut account = state
            .accounts
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::account_not_found(user_id))?;

        let entry = account.select_plan(plan_id)?;
        let wallet = account.wallet.clone();

        state.insert_entry(entry.clone());
        state.accounts.insert(user_id.clone(), account);
        Ok((wallet, entry))
    }

    fn claim_bonus(&self, user_id: &UserId, bonus_id: &str) -> Result<ClaimedBonus> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .get_mut(user_id)
            .ok_or_else(|| StoreError::account_not_found(user_id))?;
        Ok(account.claim_bonus(bonus_id)?)
    }

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        Ok(self.lock()?.ledger.get(entry_id).cloned())
    }

    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let state = self.lock()?;
        let prefix = keys::user_prefix(user_id);
        let page = page_newest_first(state.ledger_by_user.iter(), &prefix, limit, offset);

        Ok(page
            .iter()
            .filter_map(|key| keys::extract_entry_id(key))
            .filter_map(|id| state.ledger.get(&id).cloned())
            .collect())
    }
}
