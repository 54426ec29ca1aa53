use thiserror::Error;

/// Type alias for Result with GmailError
pub type Result<T> = std::result::Result<T, GmailError>;

/// Error types for the auto-reply worker
#[derive(Error, Debug)]
pub enum GmailError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Authentication failed or stored credentials are unusable
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Resource already exists (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Message headers missing or unparseable
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// Label-related errors
    #[error("Label error: {0}")]
    LabelError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic catch-all error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl GmailError {
    /// Map an HTTP status code reported by the Gmail API onto an error variant
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => GmailError::BadRequest(message),
            401 => GmailError::AuthError(message),
            403 => GmailError::Forbidden(message),
            404 => GmailError::NotFound(message),
            409 => GmailError::Conflict(message),
            429 => GmailError::RateLimitExceeded(message),
            500..=599 => GmailError::ServerError { status, message },
            _ => GmailError::ApiError(format!("HTTP {}: {}", status, message)),
        }
    }

    /// True when the provider reported that the resource already exists
    pub fn is_conflict(&self) -> bool {
        matches!(self, GmailError::Conflict(_))
    }
}

impl From<google_gmail1::Error> for GmailError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // Non-success response without a JSON body
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                GmailError::from_status(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown").to_string(),
                )
            }
            // Non-success response with a JSON error document:
            // {"error": {"code": 409, "message": "...", "status": "ALREADY_EXISTS"}}
            google_gmail1::Error::BadRequest(ref body) => {
                let message = body
                    .pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| body.to_string());

                match body
                    .pointer("/error/code")
                    .and_then(|c| c.as_u64())
                    .and_then(|c| u16::try_from(c).ok())
                {
                    Some(status) => GmailError::from_status(status, message),
                    None => GmailError::BadRequest(message),
                }
            }
            google_gmail1::Error::HttpError(ref err) => {
                GmailError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => GmailError::NetworkError(err.to_string()),
            _ => GmailError::ApiError(error.to_string()),
        }
    }
}
