use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use rand::Rng;

use crate::config::CrawlSettings;
use crate::frontier::{FrontierEntry, Label};

/// Per-entry delay applied before a fetch: base + jitter + retries × step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Politeness {
    pub list_delay: Duration,
    pub detail_delay: Duration,
    pub max_jitter: Duration,
    pub retry_step: Duration,
}

impl Politeness {
    pub fn from_settings(settings: &CrawlSettings) -> Self {
        Self {
            list_delay: settings.list_delay,
            detail_delay: settings.detail_delay,
            max_jitter: settings.max_jitter,
            retry_step: settings.retry_step,
        }
    }

    pub fn delay_for(&self, entry: &FrontierEntry) -> Duration {
        self.base_delay_for(entry) + self.jitter()
    }

    /// The delay without jitter.
    pub fn base_delay_for(&self, entry: &FrontierEntry) -> Duration {
        let base = match entry.label {
            Label::List { .. } => self.list_delay,
            Label::Detail => self.detail_delay,
        };
        base + self.retry_step.saturating_mul(entry.retry_count)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Optional global request cap shared by all workers; permits are evenly spaced.
pub struct RateShaper {
    limiter: Option<DirectRateLimiter>,
}

impl RateShaper {
    pub fn new(requests_per_minute: Option<u32>) -> Self {
        let limiter = requests_per_minute
            .and_then(NonZeroU32::new)
            .map(|rpm| RateLimiter::direct(Quota::per_minute(rpm).allow_burst(NonZeroU32::MIN)));
        Self { limiter }
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    pub async fn wait_for_permit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
