//! LLM error types.

use thiserror::Error;

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response parsed but did not carry what we asked for
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Provider settings are missing a required field
    #[error("missing provider setting: {0}")]
    MissingField(&'static str),

    /// Endpoint URL could not be built
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// Turn a non-success HTTP response into [`LLMError::Api`].
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LLMError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(LLMError::Api { status, message })
}
