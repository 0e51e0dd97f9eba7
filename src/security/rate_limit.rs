//! Global token-bucket rate limiting.
//!
//! One bucket is shared by every inbound request. It starts full at the burst
//! size and refills continuously at the configured rate, computed lazily on
//! each admission attempt.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::http::pipeline::Stage;
use crate::observability::metrics;

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_rate: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        if now > self.last_update {
            self.last_update = now;
        }

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    rate: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(rate: NonZeroU32, burst: NonZeroU32) -> Self {
        let burst = f64::from(burst.get());
        Self {
            bucket: Mutex::new(TokenBucket::new(burst, Instant::now())),
            rate: f64::from(rate.get()),
            burst,
        }
    }

    /// Take one token if available.
    pub fn try_consume(&self) -> bool {
        self.try_consume_at(Instant::now())
    }

    pub(crate) fn try_consume_at(&self, now: Instant) -> bool {
        // The bucket holds plain numbers, a panic mid-update cannot leave it torn.
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.try_acquire(now, self.burst, self.rate)
    }
}

#[derive(Clone)]
pub struct RateLimitStage {
    limiter: Arc<RateLimiter>,
}

impl RateLimitStage {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// `None` when either setting is zero; validation rejects that earlier.
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        let rate = NonZeroU32::new(config.requests_per_second)?;
        let burst = NonZeroU32::new(config.burst_size)?;
        Some(Self::new(Arc::new(RateLimiter::new(rate, burst))))
    }
}

impl Stage for RateLimitStage {
    async fn intercept(&self, request: Request, next: Next) -> Response {
        if self.limiter.try_consume() {
            return next.run(request).await;
        }

        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        metrics::record_rejection(metrics::REJECTED_RATE_LIMIT);
        ApiError::RateLimited.into_response()
    }
}
