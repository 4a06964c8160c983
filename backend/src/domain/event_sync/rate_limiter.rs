//! Request rate limiting for the throttled intranet API.
//!
//! Every upstream call (event listings, subscriber pages, retries) passes
//! through one shared limiter.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use super::SyncSleeper;

/// Admission gate called before each upstream request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestRateLimiter: Send + Sync {
    /// Wait until the next request may be issued.
    async fn acquire(&self);
}

/// Leaky-bucket limiter spacing requests at least `interval` apart.
///
/// The first request passes immediately. Each later request is scheduled one
/// interval after the previous slot, so bursts drain at a fixed rate. Time is
/// read from the injected clock and waits go through the injected sleeper.
pub struct IntervalRateLimiter {
    interval: TimeDelta,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn SyncSleeper>,
    next_slot: Mutex<Option<DateTime<Utc>>>,
}

impl IntervalRateLimiter {
    /// Build a limiter admitting one request per `interval`.
    pub fn new(interval: Duration, clock: Arc<dyn Clock>, sleeper: Arc<dyn SyncSleeper>) -> Self {
        Self {
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
            clock,
            sleeper,
            next_slot: Mutex::new(None),
        }
    }

    /// Claim the next slot and return how long the caller must wait for it.
    fn reserve(&self, now: DateTime<Utc>) -> Duration {
        let mut next_slot = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = match *next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };
        *next_slot = Some(
            slot.checked_add_signed(self.interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        (slot - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
impl RequestRateLimiter for IntervalRateLimiter {
    async fn acquire(&self) {
        let wait = self.reserve(self.clock.utc());
        if !wait.is_zero() {
            self.sleeper.sleep(wait).await;
        }
    }
}
