//! Referral links, referral events, and referral outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{Result, RewardsError};
use crate::{EntryId, LedgerEntry, UserAccount, UserId};

/// Coins credited to a referrer per successful referral.
pub const REFERRAL_REWARD_COINS: i64 = 50;

/// Query parameter carrying the referrer id.
pub const REFERRAL_PARAM: &str = "ref";

/// Build the shareable referral link for `user_id` under `origin`.
///
/// An empty origin yields a site-relative link. A trailing `/` on the origin
/// is ignored.
#[must_use]
pub fn referral_link(origin: &str, user_id: &UserId) -> String {
    format!("{}/?{REFERRAL_PARAM}={user_id}", origin.trim_end_matches('/'))
}

/// Extract the referral code from a URL, a `?query`, or a bare query string.
///
/// Returns the first non-empty `ref` value, percent-decoded. The value is
/// not validated.
#[must_use]
pub fn parse_referral_code(url: &str) -> Option<String> {
    form_urlencoded::parse(query_of(url).as_bytes())
        .find(|(key, value)| key == REFERRAL_PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Remove every `ref` parameter from a URL, dropping the `?` if the query
/// becomes empty. A `#fragment` is preserved.
#[must_use]
pub fn strip_referral_param(url: &str) -> String {
    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (url, None),
    };
    let Some((base, query)) = without_fragment.split_once('?') else {
        return url.to_string();
    };

    // Other parameters are kept byte for byte.
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_referral_pair(pair))
        .collect();

    let mut out = base.to_string();
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    if let Some(frag) = fragment {
        out.push('#');
        out.push_str(frag);
    }
    out
}

/// Link `referred` to `referrer` and credit the referrer's wallet.
///
/// Both records are mutated in place; the caller persists them together with
/// the returned event and ledger entry in one write. On error neither record
/// is changed.
///
/// # Errors
///
/// - `RewardsError::SelfReferral` if both records are the same account.
/// - `RewardsError::ReferrerAlreadySet` if `referred` already has a referrer.
/// - `RewardsError::InvalidAmount` / `BalanceOverflow` from the wallet credit.
pub fn apply_referral(
    referred: &mut UserAccount,
    referrer: &mut UserAccount,
    reward_coins: i64,
) -> Result<(ReferralEvent, LedgerEntry)> {
    if referred.user_id == referrer.user_id {
        return Err(RewardsError::SelfReferral);
    }
    if let Some(existing) = &referred.referrer_id {
        return Err(RewardsError::ReferrerAlreadySet {
            referrer_id: existing.clone(),
        });
    }

    let mut wallet = referrer.wallet.clone();
    let balance = wallet.credit(reward_coins)?;
    let entry = LedgerEntry::referral_reward(
        referrer.user_id.clone(),
        &referred.user_id,
        reward_coins,
        balance,
    )?;

    referred.set_referrer(&referrer.user_id)?;
    referrer.wallet = wallet;
    referrer.referral_count += 1;
    referrer.updated_at = Utc::now();
    let event = ReferralEvent {
        referred_id: referred.user_id.clone(),
        referrer_id: referrer.user_id.clone(),
        reward_coins,
        ledger_entry_id: entry.id,
        created_at: entry.created_at,
    };
    Ok((event, entry))
}

fn is_referral_pair(pair: &str) -> bool {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .is_some_and(|(key, _)| key == REFERRAL_PARAM)
}

fn query_of(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None if without_fragment.contains('=') && !without_fragment.contains('/') => {
            without_fragment
        }
        None => "",
    }
}

/// The fact that one account was referred by another.
///
/// Stored once per referred account; its key is the idempotency key for the
/// reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralEvent {
    /// The new account.
    pub referred_id: UserId,
    /// The account credited with the referral.
    pub referrer_id: UserId,
    /// Coins credited to the referrer.
    pub reward_coins: i64,
    /// The ledger entry that credited the reward.
    pub ledger_entry_id: EntryId,
    /// When the referral was recorded.
    pub created_at: DateTime<Utc>,
}

/// Result of processing a referral for a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReferralOutcome {
    /// Linkage written and referrer rewarded.
    Linked {
        /// The referrer now recorded on the account.
        referrer_id: UserId,
        /// Coins credited to the referrer.
        reward_coins: i64,
        /// Referrer balance after the reward.
        referrer_balance: i64,
        /// Ledger entry of the reward.
        entry_id: EntryId,
    },

    /// The account already has a referrer; nothing changed.
    AlreadyLinked {
        /// The referrer recorded earlier.
        referrer_id: UserId,
    },

    /// The code names the caller.
    SelfReferral,

    /// The code is malformed or names no existing account.
    InvalidReferrer,

    /// No code was supplied.
    MissingReferrer,

    /// The caller has no account yet.
    UnknownAccount,
}

impl ReferralOutcome {
    /// Whether a reward was issued.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        matches!(self, Self::Linked { .. })
    }

    /// Stable `snake_case` name, matching the serialized tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Linked { .. } => "linked",
            Self::AlreadyLinked { .. } => "already_linked",
            Self::SelfReferral => "self_referral",
            Self::InvalidReferrer => "invalid_referrer",
            Self::MissingReferrer => "missing_referrer",
            Self::UnknownAccount => "unknown_account",
        }
    }
}
