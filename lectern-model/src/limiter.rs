//! Client-side request throttling over a trailing window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_REQUESTS_PER_MINUTE: usize = 50;

const WINDOW: Duration = Duration::from_secs(60);
/// Added to every computed wait so a retry lands safely past the window edge.
const WAIT_BUFFER: Duration = Duration::from_secs(1);

/// Admits at most `limit` requests per trailing window, sleeping callers that
/// arrive over budget. Timestamps are held behind a single mutex that is never
/// held across a sleep, so waiting callers do not block concurrent admits.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    stamps: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

impl RateLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            window: WINDOW,
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait until a request slot is free, then claim it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut stamps = self.stamps.lock().await;
                let now = Instant::now();
                while stamps
                    .front()
                    .is_some_and(|stamp| now.duration_since(*stamp) > self.window)
                {
                    stamps.pop_front();
                }

                if stamps.len() < self.limit {
                    stamps.push_back(now);
                    return;
                }

                match stamps.front() {
                    Some(oldest) => {
                        self.window.saturating_sub(now.duration_since(*oldest)) + WAIT_BUFFER
                    }
                    None => WAIT_BUFFER,
                }
            };

            tracing::warn!(
                wait_secs = wait.as_secs_f32(),
                limit = self.limit,
                "Rate limit reached; waiting for a request slot"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_limit_without_waiting() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn over_limit_acquire_waits_for_window_rollover() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(60), "waited only {elapsed:?}");
        assert!(elapsed < Duration::from_secs(70), "waited too long: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_beyond_limit_are_deferred() {
        let limiter = Arc::new(RateLimiter::new(3));
        let admitted = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            let admitted = Arc::clone(&admitted);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                admitted.fetch_add(1, Ordering::SeqCst);
            }));
        }

        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        assert_eq!(admitted.load(Ordering::SeqCst), 3);

        tokio::time::advance(Duration::from_secs(62)).await;
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(admitted.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn slots_free_up_as_old_stamps_age_out() {
        let limiter = RateLimiter::new(1).with_window(Duration::from_secs(10));

        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(11)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_limit_is_clamped_to_one() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.limit(), 1);
        limiter.acquire().await;
    }
}
