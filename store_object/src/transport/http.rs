//! HTTP transport over reqwest

use crate::errors::TransportError;
use crate::traits::transport::{Method, Transport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use config::TransportConfig;
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path below the base URL, keeping any base path prefix
    pub fn url_for(&self, request: &TransportRequest) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        url.set_path(&path);
        url.set_query(None);
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(request.params.iter());
        }
        url
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request);
        tracing::debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self.client.request(to_reqwest(request.method), url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let success = (200..300).contains(&status);
        let body = if bytes.is_empty() {
            Value::Null
        } else if success {
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))?
        } else {
            // Error bodies are informational only
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        tracing::trace!(status, url = %url, "response received");
        TransportResponse {
            status,
            body,
            headers,
        }
        .error_for_status(request.method, url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(&TransportConfig::new(
            base_url.to_string(),
            1_000,
            "X-Total-Count".to_string(),
        ))
        .expect("valid base url")
    }

    #[test]
    fn test_url_for_list_request() {
        let transport = transport("http://localhost:3000");
        let request = TransportRequest::get("/users").with_params(vec![
            ("_limit".into(), "10".into()),
            ("_page".into(), "0".into()),
            ("_sort".into(), "-name".into()),
        ]);

        assert_eq!(
            transport.url_for(&request).as_str(),
            "http://localhost:3000/users?_limit=10&_page=0&_sort=-name"
        );
    }

    #[test]
    fn test_url_for_keeps_base_path() {
        let transport = transport("https://api.example.com/v1/");
        let request = TransportRequest::delete("/users/7");
        assert_eq!(
            transport.url_for(&request).as_str(),
            "https://api.example.com/v1/users/7"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpTransport::new(&TransportConfig::new(
            "not a url".to_string(),
            1_000,
            "X-Total-Count".to_string(),
        ));
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }
}
