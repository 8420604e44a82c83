//! Transport contract
//!
//! The repository talks to the backend only through [`Transport`]. Paths are
//! relative to the backend root (`/users`, `/users/7`); list parameters travel
//! separately so implementations can encode them as they see fit.

use crate::errors::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    /// Query parameters in the order they are sent
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Path with encoded query string, e.g. `/users?_limit=10&_page=0`
    pub fn uri(&self) -> String {
        if self.params.is_empty() {
            return self.path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

impl fmt::Display for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
    pub headers: Vec<(String, String)>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            headers: Vec::new(),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header lookup, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Total item count advertised in `header`; missing or unparsable counts as 0
    pub fn total_count(&self, header: &str) -> u64 {
        self.header(header)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Turn non-2xx responses into [`TransportError::Status`]
    pub fn error_for_status(self, method: Method, url: &str) -> Result<Self, TransportError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(TransportError::Status {
            status: self.status,
            method,
            url: url.to_string(),
            body: (!self.body.is_null()).then_some(self.body),
        })
    }
}

/// Request/response function the repositories call
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uri_keeps_parameter_order() {
        let request = TransportRequest::get("/users").with_params(vec![
            ("_limit".into(), "10".into()),
            ("_page".into(), "0".into()),
            ("_sort".into(), "-name".into()),
        ]);

        assert_eq!(request.uri(), "/users?_limit=10&_page=0&_sort=-name");
        assert_eq!(request.param("_sort"), Some("-name"));
        assert_eq!(request.to_string(), "GET /users?_limit=10&_page=0&_sort=-name");
        assert_eq!(TransportRequest::delete("/users/3").uri(), "/users/3");
    }

    #[test]
    fn test_total_count_header() {
        let response = TransportResponse::ok(json!([])).with_header("x-total-count", "42");
        assert_eq!(response.total_count("X-Total-Count"), 42);

        let garbage = TransportResponse::ok(json!([])).with_header("X-Total-Count", "many");
        assert_eq!(garbage.total_count("X-Total-Count"), 0);
        assert_eq!(TransportResponse::ok(json!([])).total_count("X-Total-Count"), 0);
    }

    #[test]
    fn test_error_for_status() {
        let error = TransportResponse::new(404, json!({"message": "missing"}))
            .error_for_status(Method::Get, "/users/9")
            .unwrap_err();

        assert_eq!(error.status(), Some(404));
        assert!(error.is_not_found());
        assert!(TransportResponse::new(201, Value::Null)
            .error_for_status(Method::Post, "/users")
            .is_ok());
    }
}
