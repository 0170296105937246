//! Error types for the OpenRouter HTTP client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`OpenRouterError`] failures.
pub type OpenRouterResult<T> = Result<T, OpenRouterError>;

/// Failures that can occur while talking to OpenRouter.
#[derive(Debug, Error)]
pub enum OpenRouterError {
    /// No API key was supplied explicitly or through `OPENROUTER_API_KEY`.
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build OpenRouter client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send OpenRouter request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// OpenRouter answered with a non-success status code.
    #[error("unexpected OpenRouter response status {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// Response payload could not be decoded.
    #[error("failed to decode OpenRouter response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The completion did not contain any choice.
    #[error("model `{model}` returned no completion choices")]
    NoChoices { model: String },
}
