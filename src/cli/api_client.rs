use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::env;

use crate::cli::error::{CliError, CliResult};

/// Default API URL when neither `--api-url` nor `CRMHUB_API_URL` is set
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// API client for communicating with the crmhub REST API
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// Priority for base URL:
    /// 1. Explicit `api_url` parameter
    /// 2. CRMHUB_API_URL environment variable
    /// 3. Default: http://localhost:3000
    pub fn new(api_url: Option<String>) -> Self {
        let base_url = api_url
            .or_else(|| env::var("CRMHUB_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL being used
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a GET request builder
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    /// Create a POST request builder
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Create a PUT request builder
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path))
    }

    /// Create a DELETE request builder
    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Handle API response with standardized error handling
    ///
    /// Returns the deserialized response body on success,
    /// or a CliError::ApiError on non-success status codes.
    pub async fn handle_response<T: DeserializeOwned>(response: Response) -> CliResult<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| CliError::InvalidResponse {
                    message: e.to_string(),
                })
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Like [`handle_response`](Self::handle_response) for responses without a body.
    pub async fn handle_empty(response: Response) -> CliResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: Response) -> CliError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        // Prefer the `error` field of the server's JSON error body.
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_string))
            .unwrap_or(text);
        CliError::api(status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Initialize crypto provider once for all tests
    fn init_crypto() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }

    #[test]
    fn test_new_with_explicit_url() {
        init_crypto();
        let client = ApiClient::new(Some("http://custom:8080".to_string()));
        assert_eq!(client.base_url(), "http://custom:8080");
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        init_crypto();
        let client = ApiClient::new(Some("http://crm.internal:3000/".to_string()));
        assert_eq!(client.base_url(), "http://crm.internal:3000");
        assert_eq!(client.url("/health"), "http://crm.internal:3000/health");
    }

    #[test]
    fn test_new_with_default() {
        init_crypto();
        let client = ApiClient::new(None);
        // Depends on CRMHUB_API_URL if set
        assert!(!client.base_url().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_refused_maps_to_connection_failed() {
        init_crypto();
        let client = ApiClient::new(Some("http://127.0.0.1:9".to_string()));

        let err: CliError = client.get("/health").send().await.unwrap_err().into();

        assert!(matches!(err, CliError::ConnectionFailed { .. }));
    }
}
