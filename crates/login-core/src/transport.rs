//! ============================================================================
//! HTTP Transport - the outbound network capability
//! ============================================================================
//! The orchestrator never talks to the network directly; it is handed an
//! `HttpClient` at construction. `ReqwestClient` is the production
//! implementation; tests substitute a recording fake.
//! ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::types::{LoginError, Result};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// First header value matching `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network capability injected into the orchestrator
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform the request. Network-level failures map to `LoginError::Transport`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `HttpClient` backed by a shared reqwest client
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Wrap a preconfigured client (timeouts, proxies, ...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| LoginError::Transport(format!("Invalid HTTP method {}: {}", request.method, e)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body)
            .send()
            .await
            .map_err(|e| LoginError::Transport(format!("Request to {} failed: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| LoginError::Transport(format!("Failed to read response body: {}", e)))?;

        debug!("{} answered {} ({} bytes)", request.url, status, body.len());

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Records every request and replays one canned outcome
    pub struct FakeTransport {
        outcome: Result<HttpResponse>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        pub fn replying(status: u16, body: &str) -> Self {
            Self {
                outcome: Ok(HttpResponse::new(status, body)),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                outcome: Err(LoginError::Transport(message.to_string())),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for FakeTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest {
            method: "POST".to_string(),
            url: "https://example.com".to_string(),
            headers: vec![("Authorization".to_string(), "OAuth x".to_string())],
            body: String::new(),
        };
        assert_eq!(request.header("authorization"), Some("OAuth x"));
        assert_eq!(request.header("Content-Type"), None);
    }

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[tokio::test]
    async fn test_reqwest_client_reports_transport_error() {
        let client = ReqwestClient::new();
        let result = client
            .send(HttpRequest {
                method: "POST".to_string(),
                url: "http://127.0.0.1:1/oauth/request_token".to_string(),
                headers: vec![],
                body: String::new(),
            })
            .await;
        assert!(matches!(result, Err(LoginError::Transport(_))));
    }

    #[tokio::test]
    async fn test_invalid_method_is_transport_error() {
        let client = ReqwestClient::new();
        let result = client
            .send(HttpRequest {
                method: "BAD METHOD".to_string(),
                url: "http://127.0.0.1:1/".to_string(),
                headers: vec![],
                body: String::new(),
            })
            .await;
        assert!(matches!(result, Err(LoginError::Transport(_))));
    }
}
