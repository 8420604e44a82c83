//! Sort direction

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `_sort` value: the bare field for ascending, `-field` for descending
    pub fn sort_param(&self, field: &str) -> String {
        match self {
            SortOrder::Asc => field.to_string(),
            SortOrder::Desc => format!("-{}", field),
        }
    }
}
