//! # snaplink-client
//!
//! A Rust client library for the snaplink URL shortener.
//!
//! The request and response types in this crate are the ones the server
//! itself speaks, so they double as the wire contract of the `/shorten`
//! endpoint.
//!
//! ## Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), snaplink_client::SnaplinkApiError> {
//! use snaplink_client::SnaplinkApi;
//!
//! let api = SnaplinkApi::new("http://localhost:8080");
//! let created = api.shorten("https://example.com/very/long/url").await?;
//! println!("Shortened URL: {}", created.short_url);
//! # Ok(())
//! # }
//! ```
//!

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request payload for creating a shortened URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortenRequest {
    /// The original URL to be shortened. A missing field decodes as empty.
    #[serde(default)]
    pub url: String,
}

/// Response returned after a short link was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenResponse {
    /// The generated short code.
    pub code: String,
    /// The complete shortened URL.
    pub short_url: String,
    /// The original URL that was shortened.
    pub original_url: String,
}

impl ShortenResponse {
    /// Creates a new `ShortenResponse`, joining `base_url` and `code` with a `/`.
    ///
    /// # Arguments
    ///
    /// * `code` - The short code of the link
    /// * `base_url` - The public URL prefix (e.g., `http://localhost:8080`)
    /// * `original_url` - The original URL that was shortened
    pub fn new(code: String, base_url: &str, original_url: String) -> Self {
        let short_url = format!("{}/{}", base_url.trim_end_matches('/'), code);
        Self {
            code,
            short_url,
            original_url,
        }
    }
}

/// Error body returned by the server for any non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Errors that can occur when talking to a snaplink server.
#[derive(Debug, Error)]
pub enum SnaplinkApiError {
    /// The configured base URL could not be joined with an endpoint path.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// An error occurred while sending the HTTP request or receiving the response.
    #[error("Request error: {0}")]
    RequestError(String),
    /// An error occurred while deserializing the response.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    /// The server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

/// A client for a snaplink server.
///
/// # Example
///
/// ```rust
/// use snaplink_client::SnaplinkApi;
///
/// let api = SnaplinkApi::new("https://sl.example.org");
/// assert_eq!(api.base_url(), "https://sl.example.org");
/// ```
#[derive(Clone)]
pub struct SnaplinkApi {
    url: String,
    client: reqwest::Client,
}

impl SnaplinkApi {
    /// Creates a new client talking to the server at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Replaces the underlying HTTP client, e.g. to configure timeouts.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.url
    }

    /// Shortens `original_link`.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The base URL is invalid (`ConfigurationError`)
    /// - The HTTP request fails (`RequestError`)
    /// - The server rejects the request (`Api`), e.g. for an empty URL
    /// - The response cannot be deserialized (`DeserializationError`)
    pub async fn shorten(&self, original_link: &str) -> Result<ShortenResponse, SnaplinkApiError> {
        let url: Url = Url::parse(&format!("{}/shorten", self.url))
            .map_err(|e| SnaplinkApiError::ConfigurationError(e.to_string()))?;

        let resp = self
            .client
            .post(url)
            .json(&ShortenRequest {
                url: original_link.to_string(),
            })
            .send()
            .await
            .map_err(|e| SnaplinkApiError::RequestError(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = match resp.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return Err(SnaplinkApiError::Api { status, message });
        }

        resp.json::<ShortenResponse>()
            .await
            .map_err(|e| SnaplinkApiError::DeserializationError(e.to_string()))
    }
}
