/*
[INPUT]:  Failures from reqwest, serde_json, url parsing and the task stream
[OUTPUT]: MercoError with retry classification and API body extraction
[POS]:    Error handling layer - one error type for the adapter crate
[UPDATE]: When adding an error source or changing retry classification
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Merco adapter
#[derive(Error, Debug)]
pub enum MercoError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Task stream error
    #[error("Stream error: {0}")]
    Stream(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MercoError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            MercoError::Http(_) | MercoError::Stream(_) | MercoError::InvalidResponse(_) => true,
            MercoError::Api { code, .. } => *code >= 500 || *code == 429,
            _ => false,
        }
    }

    /// Create an API error from status code and response body.
    ///
    /// The service answers errors as `{"error": "..."}`; other shapes fall back to the raw body.
    pub fn api_error(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .or_else(|| value.get("message"))
                    .and_then(|field| field.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());

        MercoError::Api {
            code: status.as_u16() as i32,
            message,
        }
    }
}

/// Result type alias for Merco operations
pub type Result<T> = std::result::Result<T, MercoError>;
