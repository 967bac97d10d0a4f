//! Bounded retry policy with linear backoff and cache busting

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for the primary image tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries issued after the first failed attempt
    pub max_retries: u32,

    /// Delay before the first retry, grown linearly afterwards
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given bounds
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Whether another retry is allowed after `failures` failed attempts
    pub fn should_retry(&self, failures: u32) -> bool {
        failures <= self.max_retries && failures > 0
    }

    /// Delay before retry `n` (0-based): `base_delay × (n + 1)`
    pub fn delay_for(&self, n: u32) -> Duration {
        self.base_delay.saturating_mul(n.saturating_add(1))
    }
}

/// Append a disambiguating `retry`/`t` pair so intermediaries cannot
/// re-serve a cached failure.
pub fn cache_busted(url: &str, retry: u32, timestamp_ms: i64) -> String {
    let (head, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };
    let separator = if head.contains('?') { '&' } else { '?' };

    let mut busted = format!("{}{}retry={}&t={}", head, separator, retry, timestamp_ms);
    if let Some(fragment) = fragment {
        busted.push('#');
        busted.push_str(fragment);
    }
    busted
}

/// Durations as integer milliseconds in config files
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
