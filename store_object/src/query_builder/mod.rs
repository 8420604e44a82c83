//! Query builder utilities
//!
//! This module provides list request options, their wire parameters and the
//! paginated response shape.

pub mod builder;
pub mod ordering;
pub mod pagination;
pub mod response;


pub use builder::RequestOptions;
pub use ordering::SortOrder;
pub use pagination::Pagination;
pub use response::ListResponse;
