//! Referral handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rewards_core::{parse_referral_code, ReferralEvent, ReferralOutcome};

use super::{split_page, ListQuery};
use crate::auth::Session;
use crate::error::ApiError;
use crate::referrals::{self, ReferralStats};
use crate::state::AppState;

/// Referral claim request.
///
/// Callers send either the referrer code itself or the page URL that
/// carried `?ref=<code>`. When both are present `ref` wins.
#[derive(Debug, Default, Deserialize)]
pub struct ClaimReferralRequest {
    /// Referrer code.
    #[serde(default, rename = "ref")]
    pub referrer: Option<String>,
    /// Page URL containing a `ref` query parameter.
    #[serde(default)]
    pub url: Option<String>,
}

impl ClaimReferralRequest {
    fn code(&self) -> Option<String> {
        self.referrer
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.url.as_deref().and_then(parse_referral_code))
    }
}

/// Link the caller to a referrer.
///
/// Always answers 200 with the typed outcome; only storage failures are
/// errors.
pub async fn claim_referral(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<ClaimReferralRequest>,
) -> Result<Json<ReferralOutcome>, ApiError> {
    let code = body.code();
    let outcome = referrals::process_referral(state.store.as_ref(), &session, code.as_deref())?;
    Ok(Json(outcome))
}

/// Referral stats for the caller.
pub async fn referral_stats(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ReferralStats>, ApiError> {
    let stats = referrals::referral_stats(
        state.store.as_ref(),
        &state.config.public_origin,
        &session.user_id,
    )?;
    Ok(Json(stats))
}

/// List referrals response.
#[derive(Debug, Serialize)]
pub struct ListReferralsResponse {
    /// Referral events credited to the caller (newest first).
    pub referrals: Vec<ReferralEvent>,
    /// Whether there are more referrals.
    pub has_more: bool,
}

/// List the referrals made by the caller.
pub async fn list_referrals(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListReferralsResponse>, ApiError> {
    let limit = query.capped_limit();
    let events =
        state
            .store
            .list_referrals_by_referrer(&session.user_id, limit + 1, query.offset)?;
    let (referrals, has_more) = split_page(events, limit);

    Ok(Json(ListReferralsResponse {
        referrals,
        has_more,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_prefers_ref_over_url() {
        let body = ClaimReferralRequest {
            referrer: Some("abc".into()),
            url: Some("https://example.com/?ref=xyz".into()),
        };
        assert_eq!(body.code().as_deref(), Some("abc"));
    }

    #[test]
    fn code_falls_back_to_url() {
        let body = ClaimReferralRequest {
            referrer: Some(String::new()),
            url: Some("https://example.com/?ref=xyz".into()),
        };
        assert_eq!(body.code().as_deref(), Some("xyz"));
        assert_eq!(ClaimReferralRequest::default().code(), None);
    }
}
