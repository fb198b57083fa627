//! Provider client error types.

use super::convert::ConversionError;

/// Errors from the directions / line-detail provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout
    #[error("provider request timed out")]
    Timeout,

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code or an error payload
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the API
    #[error("rate limited by provider")]
    RateLimited,

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// The requested line or data set does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The response parsed but could not be converted to domain types
    #[error("invalid provider data: {0}")]
    Conversion(#[from] ConversionError),
}

impl ProviderError {
    /// Classify a transport error, separating timeouts.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(e)
        }
    }

    /// True when the provider could not be reached or timed out.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ProviderError::Timeout => true,
            ProviderError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// True when retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::RateLimited => true,
            other => other.is_unavailable(),
        }
    }
}
