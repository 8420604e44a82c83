//! Pagination settings
//!
//! Pages are zero-indexed.

use serde::{Deserialize, Serialize};

/// Pagination configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Same limit, following page
    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.limit)
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        vec![
            ("_limit".to_string(), self.limit.to_string()),
            ("_page".to_string(), self.page.to_string()),
        ]
    }
}
