//! API handlers.

use serde::Deserialize;

pub mod accounts;
pub mod bonuses;
pub mod health;
pub mod referrals;
pub mod wallet;

/// Upper bound on `limit` for paged listings.
pub const MAX_PAGE_SIZE: usize = 100;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Maximum number of items to return (default: 50, capped at 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

impl ListQuery {
    /// The requested limit, capped at [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn capped_limit(&self) -> usize {
        self.limit.min(MAX_PAGE_SIZE)
    }
}

fn default_limit() -> usize {
    50
}

/// Split a page fetched with `limit + 1` into the page and a `has_more` flag.
pub(crate) fn split_page<T>(mut items: Vec<T>, limit: usize) -> (Vec<T>, bool) {
    let has_more = items.len() > limit;
    items.truncate(limit);
    (items, has_more)
}
