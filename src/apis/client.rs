/// Base HTTP client with pacing and shared response classification
use crate::errors::ApiError;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Spaces out requests to an upstream
///
/// One request in flight at a time; consecutive acquisitions are separated by at
/// least `min_interval`.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            last_request: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    /// Wait until a request may be made
    pub async fn acquire(&self) -> Result<RateLimitGuard, String> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| format!("Failed to acquire rate limiter permit: {}", e))?;

        if !self.min_interval.is_zero() {
            let mut last = self.last_request.lock().await;
            if let Some(last_time) = *last {
                let elapsed = last_time.elapsed();
                if elapsed < self.min_interval {
                    tokio::time::sleep(self.min_interval - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }

        Ok(RateLimitGuard { _permit: permit })
    }
}

/// RAII guard returned by [`RateLimiter::acquire`]
pub struct RateLimitGuard {
    _permit: OwnedSemaphorePermit,
}

/// HTTP client wrapper with timeout and user agent
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

pub const USER_AGENT: &str = "game-stats-exporter/1.0";

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Map a transport failure to the error taxonomy
    pub fn transport_error(&self, service: &str, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                service: service.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            ApiError::Network {
                service: service.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Map a non-success status to its error; `Ok(())` for 2xx
///
/// `resource` names what was asked for and only shows up in 404 errors.
pub fn classify_status(
    service: &str,
    resource: &str,
    status: StatusCode,
    body: &str,
) -> Result<(), ApiError> {
    if status.is_success() {
        return Ok(());
    }
    let service = service.to_string();
    Err(match status {
        StatusCode::FORBIDDEN => ApiError::Forbidden { service },
        StatusCode::TOO_MANY_REQUESTS => ApiError::TooManyRequests { service },
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized { service },
        StatusCode::BAD_REQUEST => ApiError::BadRequest {
            service,
            body: truncate_body(body),
        },
        StatusCode::NOT_FOUND => ApiError::NotFound {
            service,
            resource: resource.to_string(),
        },
        other => ApiError::HttpStatus {
            service,
            status: other.as_u16(),
            body: truncate_body(body),
        },
    })
}

/// Upstreams answer some failures with an HTML error page and status 200
pub fn looks_like_html(body: &str) -> bool {
    body.trim_start().starts_with('<')
}

const MAX_ERROR_BODY: usize = 200;

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
