//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Ledger entries, keyed by `entry_id` (ULID).
    pub const LEDGER: &str = "ledger";

    /// Index: ledger entries by user, keyed by `user_id || entry_id`.
    /// Value is empty (index only).
    pub const LEDGER_BY_USER: &str = "ledger_by_user";

    /// Referral events, keyed by the referred `user_id`.
    pub const REFERRALS: &str = "referrals";

    /// Index: referral events by referrer, keyed by
    /// `referrer_id || entry_id`. Value is the referred `user_id`.
    pub const REFERRALS_BY_REFERRER: &str = "referrals_by_referrer";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::LEDGER,
        cf::LEDGER_BY_USER,
        cf::REFERRALS,
        cf::REFERRALS_BY_REFERRER,
    ]
}
