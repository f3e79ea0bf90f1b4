//! Aggregate request rate limiting
//!
//! Every fetch of a run goes through one `RateLimiter`. The limiter hands out
//! start slots that are at least a random delay in `[min, max]` apart, so the
//! request rate towards the site stays bounded no matter how many workers
//! are active.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared request slot allocator
#[derive(Debug)]
pub struct RateLimiter {
    min_delay_ms: u64,
    max_delay_ms: u64,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter spacing requests by a random delay in `[min, max]`
    ///
    /// Bounds are swapped if given in the wrong order.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        let (min, max) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };

        Self {
            min_delay_ms: min.as_millis() as u64,
            max_delay_ms: max.as_millis() as u64,
            next_slot: Mutex::new(None),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Waits until the caller may send its request
    ///
    /// The first acquisition returns immediately. Each acquisition reserves
    /// its slot before sleeping, so concurrent callers queue up in lock
    /// order.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.delay());
            slot
        };

        tokio::time::sleep_until(slot).await;
    }

    fn delay(&self) -> Duration {
        if self.min_delay_ms == self.max_delay_ms {
            return Duration::from_millis(self.min_delay_ms);
        }
        let ms = rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms);
        Duration::from_millis(ms)
    }
}
