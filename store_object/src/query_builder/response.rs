use super::pagination::Pagination;
use serde::{Deserialize, Serialize};

/// One page of entities plus the backend's total count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pagination: Option<Pagination>,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Option<Pagination>) -> Self {
        Self {
            items,
            total,
            pagination,
        }
    }

    /// Whether pages exist after this one; always false without pagination
    pub fn has_more(&self) -> bool {
        match &self.pagination {
            Some(pagination) => {
                self.total > u64::from(pagination.limit) * (u64::from(pagination.page) + 1)
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
