//! Error types for backend client operations.
//!
//! Two layers are defined here:
//!
//! - [`HttpError`] covers the transport gateway: anything that stops a
//!   response from arriving at all (connection failures after the retry
//!   budget, malformed URLs, caller cancellation).
//! - [`BackendError`] is what every typed endpoint operation returns. It wraps
//!   transport failures and adds the outcomes decided after a response has
//!   been received: unexpected status codes, undecodable bodies and invalid
//!   version strings.

use thiserror::Error;

/// Errors raised by the transport gateway before a response is available.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The HTTP request failed due to a network or connection error.
    ///
    /// Over an anonymizing proxy this typically means the circuit could not be
    /// built, the proxy refused the connection, or the request timed out.
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// An error occurred in the HTTP middleware layer.
    ///
    /// The middleware handles retry of transient failures, so this error
    /// usually means all retry attempts have been exhausted.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    /// Failed to join the request path onto the configured base URL.
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// Only `GET` and `POST` are used by the backend API.
    #[error("Unsupported HTTP method")]
    UnsupportedMethod,

    /// The caller's cancellation token fired before the exchange completed.
    #[error("Request cancelled")]
    Cancelled,
}

/// Errors returned by the typed endpoint operations.
///
/// Every public operation either returns its typed value or exactly one of
/// these variants. [`BackendError::Cancelled`] is not a fault: it reports that
/// the caller aborted the call, and can be told apart with
/// [`BackendError::is_cancelled`].
///
/// # Example
///
/// ```rust,no_run
/// use backend_client::http::BackendError;
///
/// fn describe(err: &BackendError) -> String {
///     match err {
///         BackendError::UnexpectedStatus { status, body } => format!("backend said {status}: {body}"),
///         BackendError::Cancelled => "cancelled".to_string(),
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// The anonymized channel could not deliver a response.
    #[error("Transport failure: {0}")]
    Transport(HttpError),

    /// The server answered with a status the operation does not accept.
    ///
    /// `body` is the response text exactly as received.
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// The HTTP status code returned by the server.
        status: reqwest::StatusCode,
        /// The raw response body.
        body: String,
    },

    /// A success response carried a body that does not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The versions endpoint returned a version string that cannot be interpreted.
    #[error("Invalid version reported by backend: {0}")]
    InvalidVersion(String),

    /// The call was rejected locally before anything was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller cancelled the operation before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

impl BackendError {
    /// Returns `true` when the call ended because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }

    /// Returns the HTTP status for [`BackendError::UnexpectedStatus`].
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            BackendError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<HttpError> for BackendError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => BackendError::Cancelled,
            other => BackendError::Transport(other),
        }
    }
}
