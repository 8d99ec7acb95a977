//! Subscription plan catalogue.

use serde::{Deserialize, Serialize};

/// Plan every new wallet starts on.
pub const DEFAULT_PLAN_ID: &str = "basic";

/// Basic plan coin reward on selection.
pub const BASIC_PLAN_COINS_REWARD: i64 = 100;

/// Pro plan monthly price in cents ($19.99).
pub const PRO_PLAN_PRICE_CENTS: i64 = 1999;

/// Pro plan coin reward on selection.
pub const PRO_PLAN_COINS_REWARD: i64 = 500;

/// A subscription plan a user can select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Stable plan id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Monthly price in cents (0 = free).
    pub price_cents: i64,
    /// Feature bullet points.
    pub features: Vec<String>,
    /// Coins credited when the plan is selected.
    pub coins_reward: i64,
}

impl Plan {
    /// Whether the plan costs nothing.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.price_cents == 0
    }
}

/// All plans on offer, cheapest first.
#[must_use]
pub fn catalogue() -> Vec<Plan> {
    vec![
        Plan {
            id: DEFAULT_PLAN_ID.to_string(),
            name: "Basic".to_string(),
            price_cents: 0,
            features: vec!["Free AI agents".to_string()],
            coins_reward: BASIC_PLAN_COINS_REWARD,
        },
        Plan {
            id: "pro".to_string(),
            name: "Pro".to_string(),
            price_cents: PRO_PLAN_PRICE_CENTS,
            features: vec!["Extended services".to_string()],
            coins_reward: PRO_PLAN_COINS_REWARD,
        },
    ]
}

/// Look up a plan by id.
#[must_use]
pub fn find_plan(plan_id: &str) -> Option<Plan> {
    catalogue().into_iter().find(|p| p.id == plan_id)
}
