//! Rewards HTTP client implementation.

use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    Account, ApiErrorResponse, BonusesResponse, ClaimReferralRequest, ClaimedBonus,
    CreateAccountRequest, HealthResponse, LedgerPage, PlansResponse, ProfileUpdate,
    ReferralOutcome, ReferralPage, ReferralStats, SelectPlanRequest, SelectPlanResponse,
    WalletInfo,
};

/// Rewards API client.
///
/// Acts on behalf of one signed-in user: every call carries that user's
/// access token.
#[derive(Debug, Clone)]
pub struct RewardsClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl RewardsClient {
    /// Create a new rewards client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the rewards service (e.g., `"http://rewards:8080"`)
    /// * `access_token` - The user's JWT from the identity provider
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_options(base_url, access_token, ClientOptions::default())
    }

    /// Create a new rewards client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create the user's account on first sign-in.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 409 if the account exists.
    pub async fn create_account(
        &self,
        request: &CreateAccountRequest,
    ) -> Result<Account, ClientError> {
        let response = self
            .request(Method::POST, "/v1/accounts")
            .json(request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get the user's account.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccountNotFound` if the account doesn't exist.
    pub async fn account(&self) -> Result<Account, ClientError> {
        let response = self.request(Method::GET, "/v1/accounts/me").send().await?;
        self.handle_response(response).await
    }

    /// Edit the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccountNotFound` if the account doesn't exist.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Account, ClientError> {
        let response = self
            .request(Method::PATCH, "/v1/accounts/me")
            .json(update)
            .send()
            .await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Referrals
    // =========================================================================

    /// Claim a referral by referrer code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    /// Rejections (self referral, unknown referrer, ...) are outcomes.
    pub async fn claim_referral(&self, code: &str) -> Result<ReferralOutcome, ClientError> {
        self.send_claim(&ClaimReferralRequest {
            referrer: Some(code.to_string()),
            url: None,
        })
        .await
    }

    /// Claim a referral from the page URL that carried `?ref=<code>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn claim_referral_from_url(&self, url: &str) -> Result<ReferralOutcome, ClientError> {
        self.send_claim(&ClaimReferralRequest {
            referrer: None,
            url: Some(url.to_string()),
        })
        .await
    }

    async fn send_claim(&self, body: &ClaimReferralRequest) -> Result<ReferralOutcome, ClientError> {
        let response = self
            .request(Method::POST, "/v1/referrals/claim")
            .json(body)
            .send()
            .await?;
        let outcome: ReferralOutcome = self.handle_response(response).await?;
        tracing::debug!(outcome = outcome.as_str(), "Referral claim processed");
        Ok(outcome)
    }

    /// Referral link, referrer, count, and coins earned.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccountNotFound` if the account doesn't exist.
    pub async fn referral_stats(&self) -> Result<ReferralStats, ClientError> {
        let response = self
            .request(Method::GET, "/v1/referrals/stats")
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Referrals made by the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn referrals(&self, limit: usize, offset: usize) -> Result<ReferralPage, ClientError> {
        let response = self
            .request(Method::GET, "/v1/referrals")
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Plans and wallet
    // =========================================================================

    /// The plan catalogue.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn plans(&self) -> Result<PlansResponse, ClientError> {
        let response = self
            .client
            .get(format!("{}/v1/plans", self.base_url))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// The user's wallet.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AccountNotFound` if the account doesn't exist.
    pub async fn wallet(&self) -> Result<WalletInfo, ClientError> {
        let response = self.request(Method::GET, "/v1/wallet").send().await?;
        self.handle_response(response).await
    }

    /// Activate a plan.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::PlanAlreadyActive` if the plan is already active.
    pub async fn select_plan(&self, plan_id: &str) -> Result<SelectPlanResponse, ClientError> {
        let response = self
            .request(Method::POST, "/v1/wallet/plan")
            .json(&SelectPlanRequest {
                plan_id: plan_id.to_string(),
            })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Ledger entries, newest first. The server caps `limit` at 100.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn ledger(&self, limit: usize, offset: usize) -> Result<LedgerPage, ClientError> {
        let response = self
            .request(Method::GET, "/v1/wallet/ledger")
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        self.handle_response(response).await
    }

    // =========================================================================
    // Bonuses
    // =========================================================================

    /// Progress towards each bonus.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn bonuses(&self) -> Result<BonusesResponse, ClientError> {
        let response = self.request(Method::GET, "/v1/bonuses").send().await?;
        self.handle_response(response).await
    }

    /// Claim a bonus.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::BonusNotEarned` if the referral target is not met.
    pub async fn claim_bonus(&self, bonus_id: &str) -> Result<ClaimedBonus, ClientError> {
        let url = self.url_with_segments(&["v1", "bonuses", bonus_id, "claim"])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Build a URL under the base URL, percent-encoding each segment.
    fn url_with_segments(&self, segments: &[&str]) -> Result<reqwest::Url, ClientError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::Configuration("base URL cannot have a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.access_token)
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        let Ok(api_error) = error_body else {
            return Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            });
        };

        let body = api_error.error;
        let detail = |key: &str| body.details.as_ref().and_then(|d| d.get(key)).cloned();

        // Map specific error codes to typed errors
        match body.code.as_str() {
            "account_not_found" => Err(ClientError::AccountNotFound {
                message: body.message,
            }),
            "plan_already_active" => Err(ClientError::PlanAlreadyActive {
                plan_id: detail("plan_id")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
            }),
            "bonus_not_earned" => Err(ClientError::BonusNotEarned {
                bonus_id: detail("bonus_id")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
                progress: detail("progress")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0),
                target: detail("target").and_then(|v| v.as_u64()).unwrap_or(0),
            }),
            _ => Err(ClientError::Api {
                code: body.code,
                message: body.message,
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = RewardsClient::new("http://localhost:8080", "token").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.access_token, "token");
    }

    #[test]
    fn path_segments_are_escaped() {
        let client = RewardsClient::new("http://localhost:8080/api/", "token").unwrap();
        let url = client
            .url_with_segments(&["v1", "bonuses", "../wallet?x=1", "claim"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v1/bonuses/..%2Fwallet%3Fx=1/claim"
        );
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = RewardsClient::new("http://localhost:8080/", "token").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
