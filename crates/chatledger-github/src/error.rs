//! Error types for GitHub API operations.

/// Result type alias for GitHub API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// GitHub API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a non-success status.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code returned by the server.
        status: reqwest::StatusCode,
        /// The URL that was requested.
        url: String,
    },
}
