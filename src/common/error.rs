//! Error types for the billing harness
//!
//! Three layers: [`Error`] covers startup (configuration, client construction),
//! [`ApiError`] classifies what came back from a single HTTP call, and
//! [`StepError`] is what a step hands to the runner when it did not pass.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Startup errors, raised before any step runs
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid API_URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl Error {
    /// Create an invalid base URL error
    pub fn invalid_base_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidBaseUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of an HTTP call that did not produce a 2xx response
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response reached us (connection refused, DNS failure, broken body)
    #[error("{message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status
    #[error("HTTP {status}")]
    Response {
        status: u16,
        body: serde_json::Value,
    },
}

impl ApiError {
    /// Create a transport error from anything displayable
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Why a step did not pass
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// 2xx response whose payload does not satisfy the step's success predicate
    #[error("Unexpected response: {reason}")]
    UnexpectedPayload {
        reason: String,
        body: serde_json::Value,
    },

    /// A step asked for an identifier no earlier step has produced
    #[error("No {what} available from an earlier step")]
    MissingContext { what: &'static str },
}

impl StepError {
    /// Create an unexpected payload error
    pub fn unexpected(reason: impl Into<String>, body: &serde_json::Value) -> Self {
        Self::UnexpectedPayload {
            reason: reason.into(),
            body: body.clone(),
        }
    }
}
