//! Cache key derivation
//!
//! Keys are `(entity, kind, params)` triples. List parameters are stored as
//! canonical JSON (object keys sorted), so two option values that are deeply
//! equal always produce equal keys regardless of where they were built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Entity-wide scope, used only for invalidation
    All,
    List,
    Detail,
}

/// Structured, comparable cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    entity: String,
    kind: KeyKind,
    params: Option<String>,
}

impl CacheKey {
    pub fn all(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            kind: KeyKind::All,
            params: None,
        }
    }

    pub fn list<P>(entity: impl Into<String>, options: Option<&P>) -> Self
    where
        P: Serialize + ?Sized,
    {
        Self {
            entity: entity.into(),
            kind: KeyKind::List,
            params: options.map(canonical_json),
        }
    }

    pub fn details(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            kind: KeyKind::Detail,
            params: Some(id.into()),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Canonical list options or the detail identifier
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    /// Whether this key falls under `scope`: the `all` key of the same entity
    /// covers every key of that entity, any other scope only covers itself.
    pub fn is_within(&self, scope: &CacheKey) -> bool {
        match scope.kind {
            KeyKind::All => self.entity == scope.entity,
            _ => self == scope,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            KeyKind::All => write!(f, "{}", self.entity),
            KeyKind::List => write!(
                f,
                "{}:list:{}",
                self.entity,
                self.params.as_deref().unwrap_or("null")
            ),
            KeyKind::Detail => write!(
                f,
                "{}:detail:{}",
                self.entity,
                self.params.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Render a value as JSON with object keys in sorted order
fn canonical_json<P: Serialize + ?Sized>(value: &P) -> String {
    // serde_json's Map is ordered by key, so Value::to_string is canonical
    serde_json::to_value(value).unwrap_or_default().to_string()
}

/// Key builder bound to one entity namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKeys {
    entity: String,
}

impl QueryKeys {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn all(&self) -> CacheKey {
        CacheKey::all(self.entity.as_str())
    }

    pub fn list<P>(&self, options: Option<&P>) -> CacheKey
    where
        P: Serialize + ?Sized,
    {
        CacheKey::list(self.entity.as_str(), options)
    }

    pub fn details(&self, id: impl Into<String>) -> CacheKey {
        CacheKey::details(self.entity.as_str(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Serialize)]
    struct Options {
        page: u32,
        limit: u32,
        order_by: Option<String>,
    }

    #[test]
    fn test_key_shapes() {
        let keys = QueryKeys::new("test-entities");

        assert_eq!(keys.all().to_string(), "test-entities");
        assert_eq!(keys.list::<Options>(None).to_string(), "test-entities:list:null");
        assert_eq!(keys.details("123").to_string(), "test-entities:detail:123");
        assert_eq!(keys.details("123").kind(), KeyKind::Detail);
        assert_eq!(keys.details("123").params(), Some("123"));
    }

    #[test]
    fn test_deeply_equal_options_produce_equal_keys() {
        let first = Options {
            page: 0,
            limit: 10,
            order_by: Some("name".into()),
        };
        let second = Options {
            page: 0,
            limit: 10,
            order_by: Some("name".into()),
        };

        let a = CacheKey::list("users", Some(&first));
        let b = CacheKey::list("users", Some(&second));
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_object_key_order_does_not_matter() {
        let a = CacheKey::list("users", Some(&json!({"page": 1, "limit": 10})));
        let b = CacheKey::list("users", Some(&json!({"limit": 10, "page": 1})));
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_options_produce_different_keys() {
        let page0 = Options {
            page: 0,
            limit: 10,
            order_by: None,
        };
        let page1 = Options {
            page: 1,
            limit: 10,
            order_by: None,
        };

        assert_ne!(
            CacheKey::list("users", Some(&page0)),
            CacheKey::list("users", Some(&page1))
        );
        assert_ne!(
            CacheKey::list("users", Some(&page0)),
            CacheKey::list("posts", Some(&page0))
        );
        assert_ne!(CacheKey::list::<Options>("users", None), CacheKey::list("users", Some(&page0)));
    }

    #[test]
    fn test_all_key_scopes_its_entity_only() {
        let keys = QueryKeys::new("users");
        let scope = keys.all();

        assert!(keys.list(Some(&json!({"page": 0}))).is_within(&scope));
        assert!(keys.details("7").is_within(&scope));
        assert!(scope.is_within(&scope));
        assert!(!CacheKey::details("posts", "7").is_within(&scope));

        // A non-`all` scope matches exactly
        assert!(keys.details("7").is_within(&keys.details("7")));
        assert!(!keys.details("8").is_within(&keys.details("7")));
    }
}
