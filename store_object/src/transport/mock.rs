//! In-memory transport for tests and demos
//!
//! Requests are answered from canned routes first, then from in-memory
//! collections that behave like a small REST backend: `_page`/`_limit`
//! pagination, `_sort` ordering, a total count header and CRUD on
//! `/{entity}` and `/{entity}/{id}`. Every request is logged.

use crate::errors::TransportError;
use crate::traits::transport::{Method, Transport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Canned response for a route
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
    pub headers: Vec<(String, String)>,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn ok(body: Value) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            headers: Vec::new(),
            delay: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn into_response(self) -> TransportResponse {
        TransportResponse {
            status: self.status,
            body: self.body,
            headers: self.headers,
        }
    }
}

#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    response: MockResponse,
    once: bool,
}

#[derive(Debug)]
struct MockState {
    routes: Vec<Route>,
    collections: HashMap<String, Vec<Value>>,
    requests: Vec<TransportRequest>,
    total_count_header: String,
    latency: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                routes: Vec::new(),
                collections: HashMap::new(),
                requests: Vec::new(),
                total_count_header: "X-Total-Count".to_string(),
                latency: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Header carrying the collection total
    pub fn with_total_count_header(self, header: impl Into<String>) -> Self {
        self.lock().total_count_header = header.into();
        self
    }

    /// Delay applied to every collection response
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    pub fn with_collection(self, entity: impl Into<String>, items: Vec<Value>) -> Self {
        self.seed(entity, items);
        self
    }

    /// Replace the items of a collection
    pub fn seed(&self, entity: impl Into<String>, items: Vec<Value>) {
        self.lock().collections.insert(entity.into(), items);
    }

    /// Answer `method path` with `response` until removed
    pub fn on(&self, method: Method, path: impl Into<String>, response: MockResponse) -> &Self {
        self.add_route(method, path.into(), response, false);
        self
    }

    /// Answer `method path` with `response` for the next matching request only
    pub fn once(&self, method: Method, path: impl Into<String>, response: MockResponse) -> &Self {
        self.add_route(method, path.into(), response, true);
        self
    }

    fn add_route(&self, method: Method, path: String, response: MockResponse, once: bool) {
        self.lock().routes.push(Route {
            method,
            path,
            response,
            once,
        });
    }

    pub fn collection(&self, entity: &str) -> Vec<Value> {
        self.lock()
            .collections
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.lock().requests.clone()
    }

    /// Number of logged requests for `method path`, ignoring query parameters
    pub fn request_count(&self, method: Method, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    /// Resolve a request against routes and collections without waiting
    fn respond(&self, request: &TransportRequest) -> (MockResponse, Option<Duration>) {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let route = state
            .routes
            .iter()
            .position(|route| route.method == request.method && route.path == request.path);
        if let Some(index) = route {
            let response = if state.routes[index].once {
                state.routes.remove(index).response
            } else {
                state.routes[index].response.clone()
            };
            let delay = response.delay;
            return (response, delay);
        }

        let latency = state.latency;
        let header = state.total_count_header.clone();
        let response = handle_collection(&mut state.collections, request, &header);
        (response, latency)
    }
}

fn not_found(path: &str) -> MockResponse {
    MockResponse::status(404, json!({ "message": format!("{} not found", path) }))
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn next_id(items: &[Value]) -> Value {
    let max = items
        .iter()
        .filter_map(|item| item.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0);
    json!(max + 1)
}

fn handle_collection(
    collections: &mut HashMap<String, Vec<Value>>,
    request: &TransportRequest,
    total_count_header: &str,
) -> MockResponse {
    let mut segments = request.path.trim_start_matches('/').splitn(2, '/');
    let entity = segments.next().unwrap_or_default();
    let id = segments.next();

    let Some(items) = collections.get_mut(entity) else {
        return not_found(&request.path);
    };

    match (request.method, id) {
        (Method::Get, None) => {
            let mut listed = items.clone();
            if let Some(sort) = request.param("_sort") {
                let (field, descending) = match sort.strip_prefix('-') {
                    Some(field) => (field, true),
                    None => (sort, false),
                };
                listed.sort_by(|a, b| {
                    let ordering = compare_field(a, b, field);
                    if descending { ordering.reverse() } else { ordering }
                });
            }

            let total = listed.len();
            let limit = request.param("_limit").and_then(|v| v.parse::<usize>().ok());
            if let Some(limit) = limit {
                let page = request
                    .param("_page")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                listed = listed
                    .into_iter()
                    .skip(page.saturating_mul(limit))
                    .take(limit)
                    .collect();
            }

            MockResponse::ok(Value::Array(listed)).with_header(total_count_header, total.to_string())
        }
        (Method::Get, Some(id)) => items
            .iter()
            .find(|item| item.get("id").map(id_string).as_deref() == Some(id))
            .map(|item| MockResponse::ok(item.clone()))
            .unwrap_or_else(|| not_found(&request.path)),
        (Method::Post, None) => {
            let mut created = match &request.body {
                Some(Value::Object(fields)) => fields.clone(),
                _ => Map::new(),
            };
            if !created.contains_key("id") {
                created.insert("id".to_string(), next_id(items));
            }
            let created = Value::Object(created);
            items.push(created.clone());
            MockResponse::status(201, created)
        }
        (Method::Put, Some(id)) => {
            let Some(item) = items
                .iter_mut()
                .find(|item| item.get("id").map(id_string).as_deref() == Some(id))
            else {
                return not_found(&request.path);
            };
            if let (Value::Object(existing), Some(Value::Object(changes))) = (&mut *item, &request.body) {
                for (field, value) in changes {
                    if field != "id" {
                        existing.insert(field.clone(), value.clone());
                    }
                }
            }
            MockResponse::ok(item.clone())
        }
        (Method::Delete, Some(id)) => {
            let before = items.len();
            items.retain(|item| item.get("id").map(id_string).as_deref() != Some(id));
            if items.len() == before {
                not_found(&request.path)
            } else {
                MockResponse::ok(json!({}))
            }
        }
        _ => MockResponse::status(405, json!({ "message": "method not allowed" })),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        tracing::trace!(request = %request, "mock request");
        let (response, delay) = self.respond(&request);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        response
            .into_response()
            .error_for_status(request.method, &request.uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> MockTransport {
        MockTransport::new().with_collection(
            "users",
            vec![
                json!({"id": 1, "name": "Ada"}),
                json!({"id": 2, "name": "Grace"}),
                json!({"id": 3, "name": "Barbara"}),
            ],
        )
    }

    fn list(page: u32, limit: u32, sort: &str) -> TransportRequest {
        TransportRequest::get("/users").with_params(vec![
            ("_limit".into(), limit.to_string()),
            ("_page".into(), page.to_string()),
            ("_sort".into(), sort.to_string()),
        ])
    }

    #[tokio::test]
    async fn test_list_pagination_and_sorting() {
        let transport = users();

        let response = transport.request(list(0, 2, "-name")).await.expect("listed");
        assert_eq!(response.total_count("X-Total-Count"), 3);
        assert_eq!(
            response.body,
            json!([{"id": 2, "name": "Grace"}, {"id": 3, "name": "Barbara"}])
        );

        let second = transport.request(list(1, 2, "name")).await.expect("listed");
        assert_eq!(second.body, json!([{"id": 2, "name": "Grace"}]));
        assert_eq!(transport.request_count(Method::Get, "/users"), 2);
    }

    #[tokio::test]
    async fn test_crud_round() {
        let transport = users();

        let created = transport
            .request(TransportRequest::post("/users", json!({"name": "Margaret"})))
            .await
            .expect("created");
        assert_eq!(created.status, 201);
        assert_eq!(created.body, json!({"id": 4, "name": "Margaret"}));

        let updated = transport
            .request(TransportRequest::put("/users/4", json!({"name": "Maggie"})))
            .await
            .expect("updated");
        assert_eq!(updated.body, json!({"id": 4, "name": "Maggie"}));

        transport
            .request(TransportRequest::delete("/users/4"))
            .await
            .expect("deleted");
        let missing = transport
            .request(TransportRequest::get("/users/4"))
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
        assert_eq!(transport.collection("users").len(), 3);
    }

    #[tokio::test]
    async fn test_routes_take_precedence_and_once_is_consumed() {
        let transport = users();
        transport.once(
            Method::Get,
            "/users/1",
            MockResponse::status(500, json!({"message": "boom"})),
        );

        let failed = transport
            .request(TransportRequest::get("/users/1"))
            .await
            .unwrap_err();
        assert_eq!(failed.status(), Some(500));

        let ok = transport
            .request(TransportRequest::get("/users/1"))
            .await
            .expect("falls through to the collection");
        assert_eq!(ok.body["name"], "Ada");
    }

    #[tokio::test]
    async fn test_unknown_entity_is_not_found() {
        let transport = MockTransport::new();
        let error = transport
            .request(TransportRequest::get("/ghosts"))
            .await
            .unwrap_err();
        assert!(error.is_not_found());
        assert_eq!(transport.requests().len(), 1);
    }
}
