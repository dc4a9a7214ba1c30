//! Circuit breaker for exchange bans and rate limiting.
//!
//! HTTP 418 (IP ban) trips it at once; repeated 429s or transport failures
//! trip it after a threshold. While open, every request is refused locally
//! until the cooldown expires.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open { tripped_at: Instant },
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// 5-minute cooldown, trips after 5 consecutive failures.
    pub fn for_exchange() -> Self {
        Self::new(Duration::from_secs(5 * 60), 5)
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when a request may go out. An expired open breaker closes here.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.inner();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open { tripped_at } if tripped_at.elapsed() >= self.cooldown => {
                inner.state = BreakerState::Closed;
                inner.consecutive_failures = 0;
                true
            }
            BreakerState::Open { .. } => false,
        }
    }

    pub fn record_success(&self) {
        self.inner().consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold
            && inner.state == BreakerState::Closed
        {
            warn!(
                failures = inner.consecutive_failures,
                "exchange circuit breaker tripped"
            );
            inner.state = BreakerState::Open {
                tripped_at: Instant::now(),
            };
        }
    }

    pub fn trip(&self) {
        warn!("exchange circuit breaker tripped immediately");
        self.inner().state = BreakerState::Open {
            tripped_at: Instant::now(),
        };
    }

    pub fn remaining_cooldown(&self) -> Duration {
        match self.inner().state {
            BreakerState::Closed => Duration::ZERO,
            BreakerState::Open { tripped_at } => self.cooldown.saturating_sub(tripped_at.elapsed()),
        }
    }
}
