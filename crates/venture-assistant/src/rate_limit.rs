use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Token bucket shared by every LLM-backed tool. Refills at `rps` tokens per
/// second up to a burst of `rps`.
#[derive(Clone)]
pub struct RateLimiter {
    rps: u32,
    state: Arc<Mutex<Bucket>>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rate limit exceeded (RATE_LIMIT_RPS={rps}): try again in ~{}ms", .retry_after.as_millis())]
pub struct RateLimited {
    pub rps: u32,
    pub retry_after: Duration,
}

impl RateLimiter {
    /// `None` when `RATE_LIMIT_RPS` is unset, unparseable or zero.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        lookup("RATE_LIMIT_RPS")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .and_then(Self::per_second)
    }

    pub fn per_second(rps: u32) -> Option<Self> {
        if rps == 0 {
            return None;
        }
        Some(Self {
            rps,
            state: Arc::new(Mutex::new(Bucket {
                tokens: f64::from(rps),
                last: Instant::now(),
            })),
        })
    }

    pub fn rps(&self) -> u32 {
        self.rps
    }

    pub async fn check(&self) -> Result<(), RateLimited> {
        let capacity = f64::from(self.rps);
        let mut bucket = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last);
        bucket.last = now;
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * capacity).min(capacity);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(());
        }

        Err(RateLimited {
            rps: self.rps,
            retry_after: Duration::from_secs_f64((1.0 - bucket.tokens) / capacity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_missing_rate_disables_limiter() {
        assert!(RateLimiter::per_second(0).is_none());
        assert!(RateLimiter::from_lookup(|_| None).is_none());
        assert!(RateLimiter::from_lookup(|_| Some("fast".to_string())).is_none());
        assert_eq!(
            RateLimiter::from_lookup(|_| Some(" 4 ".to_string())).map(|l| l.rps()),
            Some(4)
        );
    }

    #[tokio::test]
    async fn burst_is_bounded_by_rate() {
        let limiter = RateLimiter::per_second(2).unwrap();
        assert!(limiter.check().await.is_ok());
        assert!(limiter.check().await.is_ok());
        let err = limiter.check().await.unwrap_err();
        assert_eq!(err.rps, 2);
        assert!(err.retry_after <= Duration::from_millis(500));
        assert!(err.to_string().starts_with("rate limit exceeded (RATE_LIMIT_RPS=2)"));
    }
}
