//! Shared request and response primitives used across handlers and services.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query-string pagination parameters. Raw values are clamped through
/// [`PaginationParams::clamp`] before they reach a query.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// One-based page index
    pub page: Option<u64>,
    /// Page size, capped by the configured maximum
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Returns `(page, limit)` with the page floored at 1 and the limit
    /// clamped into `1..=max_limit`.
    pub fn clamp(&self, default_limit: u32, max_limit: u32) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(default_limit as u64)
            .clamp(1, max_limit as u64);
        (page, limit)
    }
}

/// One page of results plus the counts clients need to page further.
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            items,
            page,
            limit,
            total,
            pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            pages: self.pages,
        }
    }
}
