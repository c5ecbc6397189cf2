//! Reqwest-backed fetch client.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::fetch::{FetchClient, FetchRequest, FetchResponse, HttpMethod};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Desktop HTTP client over reqwest with rustls.
pub struct ReqwestFetchClient {
    client: reqwest::Client,
}

impl ReqwestFetchClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|error| BridgeError::OperationFailed(format!("building client: {error}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

#[async_trait]
impl FetchClient for ReqwestFetchClient {
    async fn execute(&self, request: FetchRequest) -> Result<FetchResponse> {
        let mut builder = self.client.request(Self::method(request.method), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|error| {
            // An unreachable network is distinct from a reachable server
            // answering badly; the engine branches on it.
            if error.is_connect() || error.is_timeout() {
                BridgeError::NetworkUnavailable(error.to_string())
            } else {
                BridgeError::OperationFailed(error.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.to_string(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| BridgeError::OperationFailed(format!("reading body: {error}")))?;

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        assert_eq!(ReqwestFetchClient::method(HttpMethod::Get), reqwest::Method::GET);
        assert_eq!(ReqwestFetchClient::method(HttpMethod::Head), reqwest::Method::HEAD);
    }

    #[test]
    fn test_client_builds() {
        ReqwestFetchClient::new().unwrap();
    }
}
