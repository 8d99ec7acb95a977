//! Rewards Client SDK.
//!
//! This crate provides a client library for front ends and services acting on
//! behalf of a signed-in user against the rewards API.
//!
//! # Example
//!
//! ```no_run
//! use rewards_client::{CreateAccountRequest, RewardsClient};
//!
//! # async fn example() -> Result<(), rewards_client::ClientError> {
//! let client = RewardsClient::new("http://rewards.rewards-system.svc:8080", "user-jwt")?;
//!
//! client.create_account(&CreateAccountRequest::default()).await?;
//!
//! // Claim the referral carried by the landing page
//! let outcome = client
//!     .claim_referral_from_url("https://example.com/?ref=01HZX3Q7")
//!     .await?;
//! println!("Referral outcome: {}", outcome.as_str());
//!
//! let stats = client.referral_stats().await?;
//! println!("Share {} ({} referrals)", stats.referral_link, stats.referral_count);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, RewardsClient};
pub use error::ClientError;
pub use types::*;
