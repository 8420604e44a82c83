//! Request options for list queries
//!
//! The options double as the cache key parameters of a list, so every field
//! takes part in key equality, including the ones never sent to the backend.

use super::ordering::SortOrder;
use super::pagination::Pagination;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestOptions {
    pub pagination: Option<Pagination>,
    pub order_by: Option<String>,
    pub order_direction: Option<SortOrder>,
    pub search_query: Option<String>,
    /// Stale time override in milliseconds
    pub stale_time: Option<u64>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32, limit: u32) -> Self {
        self.pagination = Some(Pagination::new(page, limit));
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortOrder) -> Self {
        self.order_by = Some(field.into());
        self.order_direction = Some(direction);
        self
    }

    /// Sort by `field` without an explicit direction (sorted descending)
    pub fn order_by_field(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self.order_direction = None;
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = Some(u64::try_from(stale_time.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn stale_time(&self) -> Option<Duration> {
        self.stale_time.map(Duration::from_millis)
    }

    /// List parameters sent to the backend.
    ///
    /// Nothing is sent without pagination. The search query and stale time only
    /// affect the cache key.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let Some(pagination) = &self.pagination else {
            return Vec::new();
        };

        let mut params = pagination.to_params();
        if let Some(field) = &self.order_by {
            let direction = self.order_direction.unwrap_or(SortOrder::Desc);
            params.push(("_sort".to_string(), direction.sort_param(field)));
        }
        params
    }

    /// Options for the page after this one, keeping the limit (10 when unset)
    pub fn next_page(&self) -> Self {
        let pagination = self.pagination.unwrap_or_default();
        let mut next = self.clone();
        next.pagination = Some(pagination.next());
        next
    }
}
