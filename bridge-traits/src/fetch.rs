//! HTTP Fetch Abstraction
//!
//! Provides async HTTP operations for the engine's cache-fill and download
//! paths.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl HttpMethod {
    /// The interception worker only ever serves GET requests from cache.
    pub fn is_get(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Shorthand for the common GET case.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl FetchResponse {
    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get response body as UTF-8 string, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Async HTTP fetch trait
///
/// Abstracts outbound HTTP so the engine never talks to a concrete client.
/// Implementations should handle TLS, connection pooling, and the platform's
/// own network timeout; the engine adds no timeout of its own to fetches.
///
/// # Errors
///
/// `execute` must return [`BridgeError::NetworkUnavailable`] when the network
/// itself is unreachable (DNS failure, no route, airplane mode). Reachable
/// servers answering with an error status are reported through the response,
/// not as an `Err`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::fetch::{FetchClient, FetchRequest};
///
/// async fn fetch_shell_asset(client: &dyn FetchClient, url: &str) -> Result<Bytes> {
///     let response = client.execute(FetchRequest::get(url)).await?;
///     Ok(response.body)
/// }
/// ```
///
/// [`BridgeError::NetworkUnavailable`]: crate::error::BridgeError::NetworkUnavailable
#[async_trait]
pub trait FetchClient: Send + Sync {
    /// Execute an HTTP request.
    async fn execute(&self, request: FetchRequest) -> Result<FetchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_builder() {
        let request = FetchRequest::get("https://example.com/audio/ch-1.mp3")
            .header("Range", "bytes=0-")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.method, HttpMethod::Get);
        assert!(request.method.is_get());
        assert_eq!(request.headers.get("Range"), Some(&"bytes=0-".to_string()));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_fetch_response_status_checks() {
        let response = FetchResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from("test"),
        };

        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }
}
