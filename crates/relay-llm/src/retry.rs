// Bounded exponential backoff for idempotent, non-streaming HTTP calls.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_retries: u32,
    /// Seconds before the first retry
    pub initial_delay: f64,
    pub max_delay: f64,
    pub exponential_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_delay: 0.5,
            max_delay: 8.0,
            exponential_base: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Compute the backoff delay for a retry attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.initial_delay * self.exponential_base.powi(exponent);
        let delay = delay.min(self.max_delay);
        // NaN or negative from misconfigured values
        let delay = if delay.is_nan() { 0.0 } else { delay.clamp(0.0, 300.0) };
        Duration::from_secs_f64(delay)
    }

    fn should_retry(&self, attempt: u32) -> bool {
        self.enabled && attempt < self.max_retries
    }
}

/// Send a request, retrying transport errors, 429 and 5xx responses.
///
/// Other statuses are returned to the caller untouched so it can build a
/// vendor-specific error from the body.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    mut build: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut attempt: u32 = 0;

    loop {
        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let retryable = status.as_u16() == 429 || status.is_server_error();
                if !retryable || !policy.should_retry(attempt) {
                    return Ok(response);
                }

                tracing::warn!(
                    status = status.as_u16(),
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    "Retryable HTTP status"
                );
            }
            Err(err) => {
                if !policy.should_retry(attempt) {
                    return Err(err);
                }
                tracing::warn!(
                    error = %err,
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    "Request error"
                );
            }
        }

        let delay = policy.delay_for_attempt(attempt);
        attempt += 1;
        tracing::info!("Retrying after {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = RetryPolicy {
            initial_delay: 1.0,
            exponential_base: 2.0,
            max_delay: 60.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy {
            initial_delay: 1.0,
            exponential_base: 10.0,
            max_delay: 5.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(5));
    }

    #[test]
    fn test_negative_delay_clamped() {
        let policy = RetryPolicy {
            initial_delay: -3.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
    }

    #[test]
    fn test_disabled_policy_never_retries() {
        let policy = RetryPolicy::disabled();
        assert!(!policy.should_retry(0));
    }
}
