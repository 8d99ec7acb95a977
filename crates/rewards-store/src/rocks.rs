//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Compound operations run inside optimistic transactions: every record a
//! decision depends on is read with `get_for_update`, so a concurrent writer
//! touching the same keys makes the commit fail with `Busy` and the whole
//! operation is retried against fresh state.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, ErrorKind, IteratorMode,
    MultiThreaded, OptimisticTransactionDB, Options, Transaction,
};

use rewards_core::referral::apply_referral;
use rewards_core::{
    ClaimedBonus, EntryId, LedgerEntry, ProfileUpdate, ReferralEvent, ReferralOutcome,
    UserAccount, UserId, Wallet,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{referral_rejection, Store};

/// Attempts made before a conflicting transaction gives up.
pub const MAX_TXN_RETRIES: u32 = 8;

type Db = OptimisticTransactionDB<MultiThreaded>;
type Txn<'a> = Transaction<'a, Db>;
type Cf<'a> = Arc<BoundColumnFamily<'a>>;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<Db>,
}

fn db_err(e: &rocksdb::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = Db::open_cf_descriptors(&opts, path, cf_descriptors).map_err(|e| db_err(&e))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Cf<'_>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Run `body` in an optimistic transaction, retrying on write conflicts.
    ///
    /// `body` may run several times and must derive everything it writes from
    /// what it reads through the transaction. Returning an error from `body`
    /// rolls the transaction back.
    fn transact<T>(&self, mut body: impl FnMut(&Txn<'_>) -> Result<T>) -> Result<T> {
        for attempt in 1..=MAX_TXN_RETRIES {
            let txn = self.db.transaction();
            let value = body(&txn)?;

            match txn.commit() {
                Ok(()) => return Ok(value),
                Err(e) if is_conflict(&e) => {
                    tracing::debug!(attempt, error = %e, "transaction conflicted, retrying");
                }
                Err(e) => return Err(db_err(&e)),
            }
        }

        tracing::warn!(attempts = MAX_TXN_RETRIES, "transaction gave up after conflicts");
        Err(StoreError::Conflict {
            attempts: MAX_TXN_RETRIES,
        })
    }

    /// Read and lock a record inside a transaction.
    fn read_for_update<T: serde::de::DeserializeOwned>(
        txn: &Txn<'_>,
        cf: &Cf<'_>,
        key: &[u8],
    ) -> Result<Option<T>> {
        txn.get_for_update_cf(cf, key, true)
            .map_err(|e| db_err(&e))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn write<T: serde::Serialize>(txn: &Txn<'_>, cf: &Cf<'_>, key: &[u8], value: &T) -> Result<()> {
        let value = Self::serialize(value)?;
        txn.put_cf(cf, key, value).map_err(|e| db_err(&e))
    }

    /// Stage a ledger entry and its user index key.
    fn write_entry(&self, txn: &Txn<'_>, entry: &LedgerEntry) -> Result<()> {
        let cf_ledger = self.cf(cf::LEDGER)?;
        let cf_by_user = self.cf(cf::LEDGER_BY_USER)?;

        Self::write(txn, &cf_ledger, &keys::entry_key(&entry.id), entry)?;
        txn.put_cf(
            &cf_by_user,
            keys::user_entry_key(&entry.user_id, &entry.id),
            [],
        )
        .map_err(|e| db_err(&e))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| db_err(&e))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Collect every index entry under `prefix`, newest first.
    fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut items = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| db_err(&e))?;
            if !key.starts_with(prefix) {
                break;
            }
            items.push((key.to_vec(), value.to_vec()));
        }

        // ULID suffixes sort by time, so reversing gives newest first
        items.reverse();
        Ok(items)
    }

    /// Load an account for update or fail with `NotFound`.
    fn account_for_update(&self, txn: &Txn<'_>, user_id: &UserId) -> Result<UserAccount> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        Self::read_for_update(txn, &cf_accounts, &keys::account_key(user_id))?
            .ok_or_else(|| StoreError::account_not_found(user_id))
    }
}

fn is_conflict(e: &rocksdb::Error) -> bool {
    matches!(e.kind(), ErrorKind::Busy | ErrorKind::TryAgain)
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(&self, account: &UserAccount) -> Result<LedgerEntry> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);

        self.transact(|txn| {
            if Self::read_for_update::<UserAccount>(txn, &cf_accounts, &key)?.is_some() {
                return Err(StoreError::AlreadyExists {
                    entity: "account",
                    id: account.user_id.to_string(),
                });
            }

            let entry = account.signup_entry()?;
            Self::write(txn, &cf_accounts, &key, account)?;
            self.write_entry(txn, &entry)?;
            Ok(entry)
        })
    }

    #[cfg(test)]
    fn put_account(&self, account: &UserAccount) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, keys::account_key(&account.user_id), value)
            .map_err(|e| db_err(&e))
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<UserAccount>> {
        self.get(cf::ACCOUNTS, &keys::account_key(user_id))
    }

    fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<UserAccount> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;

        self.transact(|txn| {
            let mut account = self.account_for_update(txn, user_id)?;
            account.apply_profile(update);
            Self::write(txn, &cf_accounts, &keys::account_key(user_id), &account)?;
            Ok(account)
        })
    }

    // =========================================================================
    // Referral Operations
    // =========================================================================

    fn link_referral(
        &self,
        referred_id: &UserId,
        referrer_id: &UserId,
        reward_coins: i64,
    ) -> Result<ReferralOutcome> {
        if referred_id == referrer_id {
            return Ok(ReferralOutcome::SelfReferral);
        }

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_referrals = self.cf(cf::REFERRALS)?;
        let cf_by_referrer = self.cf(cf::REFERRALS_BY_REFERRER)?;
        let referrer_key = keys::account_key(referrer_id);
        let referred_key = keys::account_key(referred_id);

        self.transact(|txn| {
            let Some(mut referrer) =
                Self::read_for_update::<UserAccount>(txn, &cf_accounts, &referrer_key)?
            else {
                return Ok(ReferralOutcome::InvalidReferrer);
            };
            let Some(mut referred) =
                Self::read_for_update::<UserAccount>(txn, &cf_accounts, &referred_key)?
            else {
                return Ok(ReferralOutcome::UnknownAccount);
            };

            let (event, entry) = match apply_referral(&mut referred, &mut referrer, reward_coins) {
                Ok(applied) => applied,
                Err(err) => return referral_rejection(err),
            };

            Self::write(txn, &cf_accounts, &referred_key, &referred)?;
            Self::write(txn, &cf_accounts, &referrer_key, &referrer)?;
            Self::write(txn, &cf_referrals, &keys::referral_key(referred_id), &event)?;
            txn.put_cf(
                &cf_by_referrer,
                keys::user_entry_key(referrer_id, &entry.id),
                referred_id.as_bytes(),
            )
            .map_err(|e| db_err(&e))?;
            self.write_entry(txn, &entry)?;

            Ok(ReferralOutcome::Linked {
                referrer_id: referrer_id.clone(),
                reward_coins,
                referrer_balance: referrer.wallet.coins,
                entry_id: entry.id,
            })
        })
    }

    fn get_referral(&self, referred_id: &UserId) -> Result<Option<ReferralEvent>> {
        self.get(cf::REFERRALS, &keys::referral_key(referred_id))
    }

    fn list_referrals_by_referrer(
        &self,
        referrer_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReferralEvent>> {
        let index = self.scan_prefix(cf::REFERRALS_BY_REFERRER, &keys::user_prefix(referrer_id))?;

        let mut events = Vec::new();
        for (_, referred) in index.into_iter().skip(offset).take(limit) {
            if let Some(event) = self.get(cf::REFERRALS, &referred)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    fn count_referrals_by_referrer(&self, referrer_id: &UserId) -> Result<u64> {
        let index = self.scan_prefix(cf::REFERRALS_BY_REFERRER, &keys::user_prefix(referrer_id))?;
        Ok(index.len() as u64)
    }

    // =========================================================================
    // Wallet Operations
    // =========================================================================

    fn select_plan(&self, user_id: &UserId, plan_id: &str) -> Result<(Wallet, LedgerEntry)> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;

        self.transact(|txn| {
            let mut account = self.account_for_update(txn, user_id)?;
            let entry = account.select_plan(plan_id)?;

            Self::write(txn, &cf_accounts, &keys::account_key(user_id), &account)?;
            self.write_entry(txn, &entry)?;
            Ok((account.wallet, entry))
        })
    }

    fn claim_bonus(&self, user_id: &UserId, bonus_id: &str) -> Result<ClaimedBonus> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;

        self.transact(|txn| {
            let mut account = self.account_for_update(txn, user_id)?;
            let claimed = account.claim_bonus(bonus_id)?;
            Self::write(txn, &cf_accounts, &keys::account_key(user_id), &account)?;
            Ok(claimed)
        })
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>> {
        self.get(cf::LEDGER, &keys::entry_key(entry_id))
    }

    fn list_entries_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>> {
        let index = self.scan_prefix(cf::LEDGER_BY_USER, &keys::user_prefix(user_id))?;

        let mut entries = Vec::new();
        for (key, _) in index.into_iter().skip(offset).take(limit) {
            let Some(entry_id) = keys::extract_entry_id(&key) else {
                continue;
            };
            if let Some(entry) = self.get_entry(&entry_id)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewards_core::{EntryKind, RewardsError, REFERRAL_REWARD_COINS, STARTING_COINS};
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn new_account(store: &RocksStore) -> UserAccount {
        let account = UserAccount::new(UserId::generate(), None, None);
        store.create_account(&account).unwrap();
        account
    }

    #[test]
    fn account_lifecycle() {
        let (store, _dir) = create_test_store();
        let account = new_account(&store);

        let err = store.create_account(&account).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let update = ProfileUpdate {
            display_name: Some("Dilnoza".into()),
            ..ProfileUpdate::default()
        };
        let updated = store.update_profile(&account.user_id, &update).unwrap();
        assert_eq!(updated.display_name, "Dilnoza");

        let stored = store.get_account(&account.user_id).unwrap().unwrap();
        assert_eq!(stored.display_name, "Dilnoza");
        assert_eq!(stored.wallet.coins, STARTING_COINS);
    }

    #[test]
    fn link_referral_is_atomic_and_idempotent() {
        let (store, _dir) = create_test_store();
        let referrer = new_account(&store);
        let newcomer = new_account(&store);

        let first = store
            .link_referral(&newcomer.user_id, &referrer.user_id, REFERRAL_REWARD_COINS)
            .unwrap();
        assert!(first.is_linked());

        let second = store
            .link_referral(&newcomer.user_id, &referrer.user_id, REFERRAL_REWARD_COINS)
            .unwrap();
        assert_eq!(
            second,
            ReferralOutcome::AlreadyLinked {
                referrer_id: referrer.user_id.clone()
            }
        );

        let referrer_after = store.get_account(&referrer.user_id).unwrap().unwrap();
        assert_eq!(referrer_after.wallet.coins, STARTING_COINS + REFERRAL_REWARD_COINS);
        assert_eq!(referrer_after.referral_count, 1);
        assert_eq!(store.count_referrals_by_referrer(&referrer.user_id).unwrap(), 1);

        let events = store
            .list_referrals_by_referrer(&referrer.user_id, 10, 0)
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].referred_id, newcomer.user_id);
    }

    #[test]
    fn link_referral_rejections_write_nothing() {
        let (store, _dir) = create_test_store();
        let referrer = new_account(&store);
        let ghost = UserId::generate();

        assert_eq!(
            store.link_referral(&ghost, &referrer.user_id, 50).unwrap(),
            ReferralOutcome::UnknownAccount
        );
        assert_eq!(
            store.link_referral(&referrer.user_id, &ghost, 50).unwrap(),
            ReferralOutcome::InvalidReferrer
        );
        assert_eq!(
            store
                .link_referral(&referrer.user_id, &referrer.user_id, 50)
                .unwrap(),
            ReferralOutcome::SelfReferral
        );
        assert_eq!(store.count_referrals_by_referrer(&referrer.user_id).unwrap(), 0);
        assert!(store.get_referral(&ghost).unwrap().is_none());
    }

    #[test]
    fn concurrent_links_reward_once() {
        let (store, _dir) = create_test_store();
        let referrer = new_account(&store);
        let newcomer = new_account(&store);

        let linked = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        store.link_referral(&newcomer.user_id, &referrer.user_id, 50)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|r| matches!(r, Ok(outcome) if outcome.is_linked()))
                .count()
        });

        assert_eq!(linked, 1);
        let referrer_after = store.get_account(&referrer.user_id).unwrap().unwrap();
        assert_eq!(referrer_after.wallet.coins, STARTING_COINS + 50);
        assert_eq!(referrer_after.referral_count, 1);
    }

    #[test]
    fn plan_and_ledger() {
        let (store, _dir) = create_test_store();
        let account = new_account(&store);

        let (wallet, entry) = store.select_plan(&account.user_id, "pro").unwrap();
        assert_eq!(wallet.plan_id, "pro");
        assert_eq!(entry.kind, EntryKind::PlanReward);

        let err = store.select_plan(&account.user_id, "gold").unwrap_err();
        assert!(matches!(err, StoreError::Rewards(RewardsError::UnknownPlan(_))));

        let entries = store.list_entries_by_user(&account.user_id, 10, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, entry.id);

        let page = store.list_entries_by_user(&account.user_id, 10, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].kind, EntryKind::SignupGrant);
    }

    #[test]
    fn claim_bonus_persists() {
        let (store, _dir) = create_test_store();
        let mut account = new_account(&store);
        account.referral_count = 5;
        store.put_account(&account).unwrap();

        store.claim_bonus(&account.user_id, "premium_features").unwrap();
        let err = store
            .claim_bonus(&account.user_id, "premium_features")
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rewards(RewardsError::BonusAlreadyClaimed(_))
        ));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let account = UserAccount::new(UserId::generate(), None, None);
        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.create_account(&account).unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        assert!(store.get_account(&account.user_id).unwrap().is_some());
        assert_eq!(
            store
                .list_entries_by_user(&account.user_id, 10, 0)
                .unwrap()
                .len(),
            1
        );
    }
    #[test]
    fn listings_newest_first_within_one_millisecond() {
        let (store, _dir) = create_test_store();
        let referrer = new_account(&store);

        let mut referred_ids = Vec::new();
        for _ in 0..50 {
            let newcomer = new_account(&store);
            let (_, plan) = store.select_plan(&newcomer.user_id, "pro").unwrap();
            let entries = store.list_entries_by_user(&newcomer.user_id, 10, 0).unwrap();
            assert_eq!(entries[0].id, plan.id);

            store
                .link_referral(&newcomer.user_id, &referrer.user_id, REFERRAL_REWARD_COINS)
                .unwrap();
            referred_ids.push(newcomer.user_id);
        }

        let listed: Vec<UserId> = store
            .list_referrals_by_referrer(&referrer.user_id, 100, 0)
            .unwrap()
            .into_iter()
            .map(|event| event.referred_id)
            .collect();
        referred_ids.reverse();
        assert_eq!(listed, referred_ids);
    }
}
