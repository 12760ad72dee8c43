//! Error types for Cinch

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for the middleware pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid HTTP request
    #[error("Invalid HTTP request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed YAML, TOML, or JSON input
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error building an HTTP message
    #[error("HTTP error: {0}")]
    HttpError(#[from] http::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert error to HTTP status code
    pub fn to_status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
