use lectern_core::{LecternError, Result};
use rand::Rng;
use std::{future::Future, time::Duration};

/// Bounded exponential backoff for transient provider failures.
///
/// `max_attempts` counts every call, including the first: the default of 3
/// means one initial attempt plus at most two retries.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_factor: f32,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_factor: 2.0,
            jitter: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f32) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn jitter_delay(&self) -> Duration {
        let millis = self.jitter.as_millis() as u64;
        if millis == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
    }
}

#[must_use]
pub fn is_transient_status(status_code: u16) -> bool {
    matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

#[must_use]
pub fn is_transient_message(message: &str) -> bool {
    let normalized = message.to_ascii_uppercase();
    normalized.contains("429")
        || normalized.contains("408")
        || normalized.contains("500")
        || normalized.contains("502")
        || normalized.contains("503")
        || normalized.contains("504")
        || normalized.contains("529")
        || normalized.contains("RATE LIMIT")
        || normalized.contains("TOO MANY REQUESTS")
        || normalized.contains("OVERLOADED")
        || normalized.contains("TIMEOUT")
        || normalized.contains("TIMED OUT")
        || normalized.contains("CONNECTION RESET")
}

#[must_use]
pub fn is_transient_error(error: &LecternError) -> bool {
    match error {
        LecternError::Model(message) => is_transient_message(message),
        _ => false,
    }
}

fn next_backoff(current: Duration, policy: &RetryPolicy) -> Duration {
    if current >= policy.max_backoff {
        return policy.max_backoff;
    }

    let factor = policy.backoff_factor.max(1.0) as f64;
    let scaled = Duration::from_secs_f64(current.as_secs_f64() * factor);
    scaled.min(policy.max_backoff)
}

pub async fn with_retry<T, Op, Fut, Classify>(
    policy: &RetryPolicy,
    classify_error: Classify,
    mut operation: Op,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    Classify: Fn(&LecternError) -> bool,
{
    let mut attempt: u32 = 1;
    let mut backoff = policy.initial_backoff;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && classify_error(&error) => {
                let pause = backoff + policy.jitter_delay();
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = pause.as_millis() as u64,
                    error = %error,
                    "Model call failed with transient error; retrying"
                );
                tokio::time::sleep(pause).await;
                backoff = next_backoff(backoff, policy);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(max_attempts)
            .with_initial_backoff(Duration::ZERO)
            .with_max_backoff(Duration::ZERO)
            .with_jitter(Duration::ZERO)
    }

    #[tokio::test]
    async fn with_retry_recovers_from_transient_errors() {
        let policy = instant_policy(3);
        let attempts = Arc::new(AtomicU32::new(0));

        let result = with_retry(&policy, is_transient_error, || {
            let attempts = Arc::clone(&attempts);
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    return Err(LecternError::Model("HTTP 429 rate limit".to_string()));
                }
                Ok("ok")
            }
        })
        .await
        .expect("operation should succeed after retries");

        assert_eq!(result, "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_stops_on_non_transient_error() {
        let policy = instant_policy(3);
        let attempts = Arc::new(AtomicU32::new(0));

        let error = with_retry(&policy, is_transient_error, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LecternError::Model("HTTP 400 bad request".to_string()))
            }
        })
        .await
        .expect_err("operation should fail without retries");

        assert!(matches!(error, LecternError::Model(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_max_attempts() {
        let policy = instant_policy(3);
        let attempts = Arc::new(AtomicU32::new(0));

        let error = with_retry(&policy, is_transient_error, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LecternError::Model("503 service unavailable".to_string()))
            }
        })
        .await
        .expect_err("operation should exhaust its attempts");

        assert!(matches!(error, LecternError::Model(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_policy_none_makes_a_single_attempt() {
        let policy = RetryPolicy::none().with_jitter(Duration::ZERO);
        let attempts = Arc::new(AtomicU32::new(0));

        let error = with_retry(&policy, is_transient_error, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LecternError::Model("HTTP 429 too many requests".to_string()))
            }
        })
        .await
        .expect_err("single attempt should return first error");

        assert!(matches!(error, LecternError::Model(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_status_codes() {
        assert!(is_transient_status(408));
        assert!(is_transient_status(429));
        assert!(is_transient_status(503));
        assert!(is_transient_status(529));
        assert!(!is_transient_status(400));
        assert!(!is_transient_status(401));
    }

    #[test]
    fn transient_message_sniffing() {
        assert!(is_transient_message("Anthropic API error (429 Too Many Requests, retryable)"));
        assert!(is_transient_message("overloaded_error: Overloaded"));
        assert!(is_transient_message("request timed out"));
        assert!(!is_transient_message("invalid x-api-key"));
    }

    #[test]
    fn non_model_errors_are_not_transient() {
        assert!(!is_transient_error(&LecternError::Parse("bad json".to_string())));
        assert!(!is_transient_error(&LecternError::Config("missing key".to_string())));
    }

    #[test]
    fn backoff_growth_is_capped() {
        let policy = RetryPolicy::default()
            .with_initial_backoff(Duration::from_secs(1))
            .with_max_backoff(Duration::from_secs(30))
            .with_backoff_factor(2.0);

        let mut delay = policy.initial_backoff;
        for _ in 0..10 {
            delay = next_backoff(delay, &policy);
            assert!(delay <= policy.max_backoff);
        }
        assert_eq!(delay, policy.max_backoff);
    }
}
