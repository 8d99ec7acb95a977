//! Core types for the referral and rewards ledger.
//!
//! This crate provides the foundational types used throughout the rewards service:
//!
//! - **Identifiers**: `UserId`, `EntryId`, `ReferralCode`
//! - **Accounts**: `UserAccount`, `Wallet`, `ProfileUpdate`
//! - **Referrals**: `referral_link`, `parse_referral_code`, `ReferralEvent`, `ReferralOutcome`
//! - **Ledger**: `LedgerEntry`, `EntryKind`
//! - **Catalogues**: subscription `Plan`s and referral bonuses
//!
//! # Coins
//!
//! Coins are an in-app reward currency stored as `i64` per wallet. Balances
//! only grow: referral rewards and plan selections credit them, and every
//! credit is recorded as a [`LedgerEntry`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod bonus;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod plan;
pub mod referral;

pub use account::{
    ProfileUpdate, UserAccount, Wallet, DEFAULT_DISPLAY_NAME, MAX_XP, STARTING_COINS,
};
pub use bonus::{BonusDefinition, BonusProgress, ClaimedBonus};
pub use error::{Result, RewardsError};
pub use ids::{EntryId, IdError, ReferralCode, UserId};
pub use ledger::{EntryKind, LedgerEntry};
pub use plan::{Plan, DEFAULT_PLAN_ID};
pub use referral::{
    parse_referral_code, referral_link, strip_referral_param, ReferralEvent, ReferralOutcome,
    REFERRAL_REWARD_COINS,
};
