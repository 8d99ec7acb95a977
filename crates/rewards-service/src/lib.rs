//! Rewards HTTP API Service.
//!
//! This crate provides the HTTP API for the referral rewards ledger:
//!
//! - Account creation and profile edits
//! - Referral claims and referral stats
//! - Plan selection, wallet, and ledger
//! - Referral bonuses
//!
//! # Authentication
//!
//! User endpoints take an RS256 JWT from the identity provider. The token's
//! `sub` claim becomes the [`auth::Session`] passed to business logic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod referrals;
pub mod routes;
pub mod state;

pub use auth::Session;
pub use config::{ServiceConfig, StorageBackend};
pub use error::ApiError;
pub use referrals::{process_referral, referral_stats, ReferralStats};
pub use routes::create_router;
pub use state::AppState;
