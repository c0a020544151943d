/// Error taxonomy for the acquisition layer
///
/// - `DecodeError`: the world feed could not be decoded at all
/// - `CacheError`: the backing store failed
/// - `ApiError`: an upstream request failed (transport, status, body)
/// - `AcquisitionError`: what collectors surface to the HTTP layer
use thiserror::Error;

/// Fatal world-feed decode failure
///
/// Truncation is never an error; it is reported on the decode outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed world feed: {len} bytes, need at least {min}")]
    MalformedInput { len: usize, min: usize },
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache task failed: {0}")]
    Task(String),
}

/// Upstream request failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Forbidden by {service} (HTTP 403)")]
    Forbidden { service: String },

    #[error("Rate limit exceeded by {service} (HTTP 429)")]
    TooManyRequests { service: String },

    #[error("Unauthorized by {service} (HTTP 401), check the API key")]
    Unauthorized { service: String },

    #[error("Bad request to {service} (HTTP 400): {body}")]
    BadRequest { service: String, body: String },

    #[error("{service} has no record of {resource} (HTTP 404)")]
    NotFound { service: String, resource: String },

    #[error("{service} returned HTTP {status}: {body}")]
    HttpStatus {
        service: String,
        status: u16,
        body: String,
    },

    #[error("{service} returned HTML instead of JSON")]
    HtmlResponse { service: String },

    #[error("{service} returned an empty body")]
    EmptyBody { service: String },

    #[error("{service} request timed out after {seconds}s")]
    Timeout { service: String, seconds: u64 },

    #[error("{service} network error: {message}")]
    Network { service: String, message: String },

    #[error("Failed to parse {service} response: {message}")]
    Parse { service: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Rejections that must feed the rate-limit coordinator
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Forbidden { .. })
    }

    /// Errors caused by the caller rather than the upstream
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::InvalidInput(_) | ApiError::BadRequest { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Failure surfaced by a collector after cache fallback was attempted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("{service} is rate limited until {until}")]
    RateLimited { service: String, until: String },

    #[error(transparent)]
    Upstream(#[from] ApiError),

    #[error("World feed decode failed: {0}")]
    Decode(#[from] DecodeError),
}

impl AcquisitionError {
    pub fn is_client_error(&self) -> bool {
        match self {
            AcquisitionError::Upstream(e) => e.is_client_error(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AcquisitionError::Upstream(e) if e.is_not_found())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AcquisitionError::RateLimited { .. })
    }
}
