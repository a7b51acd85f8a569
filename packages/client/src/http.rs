//! HTTP transport with retry for idempotent requests.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::error::{ClientError, Result};

/// User agent string identifying this client.
const USER_AGENT: &str = concat!("abdera-client/", env!("CARGO_PKG_VERSION"));

/// Request timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
pub const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Retry behaviour for idempotent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, for requests that must not be repeated.
    #[must_use]
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before the given attempt (0-based): none, base, 2x base, ...
    /// Saturates instead of overflowing for long policies.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1_u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Create a configured HTTP client.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Send a request built by `build`, retrying connection errors, timeouts and
/// 5xx responses with exponential backoff.
///
/// With a single-attempt policy the response is returned whatever its
/// status. 4xx responses are never retried.
pub fn send_with_retry(policy: RetryPolicy, build: impl Fn() -> RequestBuilder) -> Result<Response> {
    let mut last_error: Option<String> = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.delay(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying after delay");
            thread::sleep(delay);
        }

        match build().send() {
            Ok(response) => {
                let status = response.status();
                if status.is_server_error() && policy.max_attempts > 1 {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = policy.max_attempts,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }
                return Ok(response);
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = policy.max_attempts,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(ClientError::Http(e));
            }
        }
    }

    Err(ClientError::RetriesExhausted {
        attempts: policy.max_attempts,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}
