//! Referral processing and referral stats.
//!
//! These functions hold the service-level referral rules. Handlers decode
//! HTTP input and call them with the caller's [`Session`]; the store performs
//! the link-and-reward write as one conditional transaction.

use serde::{Deserialize, Serialize};

use rewards_core::{referral_link, ReferralOutcome, UserId, REFERRAL_REWARD_COINS};
use rewards_store::{Result, Store, StoreError};

use crate::auth::Session;

/// Referral figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralStats {
    /// Link the user shares with friends.
    pub referral_link: String,
    /// Who referred this user, if anyone.
    pub referrer_id: Option<UserId>,
    /// Successful referrals made by this user.
    pub referral_count: u64,
    /// Coins earned from those referrals.
    pub coins_earned: i64,
}

/// Link the session user to the referrer named by `code` and reward the
/// referrer.
///
/// Rejections come back as [`ReferralOutcome`] variants; only storage
/// failures are errors.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn process_referral(
    store: &dyn Store,
    session: &Session,
    code: Option<&str>,
) -> Result<ReferralOutcome> {
    let outcome = match code.map(str::trim).filter(|c| !c.is_empty()) {
        None => ReferralOutcome::MissingReferrer,
        Some(code) => match code.parse::<UserId>() {
            Err(_) => ReferralOutcome::InvalidReferrer,
            Ok(referrer_id) if referrer_id == session.user_id => ReferralOutcome::SelfReferral,
            Ok(referrer_id) => {
                store.link_referral(&session.user_id, &referrer_id, REFERRAL_REWARD_COINS)?
            }
        },
    };

    match &outcome {
        ReferralOutcome::Linked {
            referrer_id,
            reward_coins,
            referrer_balance,
            entry_id,
        } => tracing::info!(
            user_id = %session.user_id,
            referrer_id = %referrer_id,
            reward_coins,
            referrer_balance,
            entry_id = %entry_id,
            "Referral linked"
        ),
        ReferralOutcome::AlreadyLinked { referrer_id } => tracing::info!(
            user_id = %session.user_id,
            referrer_id = %referrer_id,
            "Referral ignored: referrer already set"
        ),
        other => tracing::info!(
            user_id = %session.user_id,
            outcome = other.as_str(),
            "Referral rejected"
        ),
    }

    Ok(outcome)
}

/// Read the referral figures for `user_id`.
///
/// # Errors
///
/// Returns `StoreError::NotFound` if the account doesn't exist.
pub fn referral_stats(store: &dyn Store, origin: &str, user_id: &UserId) -> Result<ReferralStats> {
    let account = store.get_account(user_id)?.ok_or_else(|| StoreError::NotFound {
        entity: "account",
        id: user_id.to_string(),
    })?;

    let coins_earned = i64::try_from(account.referral_count)
        .ok()
        .and_then(|count| count.checked_mul(REFERRAL_REWARD_COINS))
        .unwrap_or(i64::MAX);

    Ok(ReferralStats {
        referral_link: referral_link(origin, user_id),
        referrer_id: account.referrer_id,
        referral_count: account.referral_count,
        coins_earned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewards_core::{UserAccount, STARTING_COINS};
    use rewards_store::MemoryStore;

    fn store_with(ids: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for id in ids {
            let account = UserAccount::new(id.parse().unwrap(), None, None);
            store.create_account(&account).unwrap();
        }
        store
    }

    fn session(id: &str) -> Session {
        Session::new(id.parse().unwrap())
    }

    #[test]
    fn missing_and_malformed_codes() {
        let store = store_with(&["newcomer"]);
        let me = session("newcomer");

        assert_eq!(
            process_referral(&store, &me, None).unwrap(),
            ReferralOutcome::MissingReferrer
        );
        assert_eq!(
            process_referral(&store, &me, Some("  ")).unwrap(),
            ReferralOutcome::MissingReferrer
        );
        assert_eq!(
            process_referral(&store, &me, Some("not a user!")).unwrap(),
            ReferralOutcome::InvalidReferrer
        );
    }

    #[test]
    fn self_referral_is_a_no_op() {
        let store = store_with(&["abc123"]);

        let outcome = process_referral(&store, &session("abc123"), Some("abc123")).unwrap();

        assert_eq!(outcome, ReferralOutcome::SelfReferral);
        let account = store.get_account(&"abc123".parse().unwrap()).unwrap().unwrap();
        assert!(account.referrer_id.is_none());
        assert_eq!(account.wallet.coins, STARTING_COINS);
    }

    #[test]
    fn unknown_referrer_is_a_no_op() {
        let store = store_with(&["newcomer"]);

        let outcome = process_referral(&store, &session("newcomer"), Some("ghost")).unwrap();

        assert_eq!(outcome, ReferralOutcome::InvalidReferrer);
        assert!(store.get_referral(&"newcomer".parse().unwrap()).unwrap().is_none());
    }

    #[test]
    fn first_referral_updates_stats() {
        let store = store_with(&["abc123", "newcomer"]);
        let before = referral_stats(&store, "https://example.com", &"abc123".parse().unwrap())
            .unwrap();
        assert_eq!(before.referral_count, 0);

        let outcome = process_referral(&store, &session("newcomer"), Some("abc123")).unwrap();
        assert!(outcome.is_linked());

        let referrer_id: UserId = "abc123".parse().unwrap();
        let stats = referral_stats(&store, "https://example.com", &referrer_id).unwrap();
        assert_eq!(stats.referral_link, "https://example.com/?ref=abc123");
        assert_eq!(stats.referral_count, 1);
        assert_eq!(stats.coins_earned, REFERRAL_REWARD_COINS);
        let account = store.get_account(&referrer_id).unwrap().unwrap();
        assert_eq!(account.wallet.coins, STARTING_COINS + REFERRAL_REWARD_COINS);

        let newcomer = referral_stats(&store, "", &"newcomer".parse().unwrap()).unwrap();
        assert_eq!(newcomer.referrer_id, Some(referrer_id));
        assert_eq!(newcomer.referral_link, "/?ref=newcomer");
    }

    #[test]
    fn stats_for_missing_account() {
        let store = MemoryStore::new();
        let err = referral_stats(&store, "", &"ghost".parse().unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
