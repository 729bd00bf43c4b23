//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Cache configuration.
///
/// Durations are stored in milliseconds so the config reads naturally
/// from JSON. A zero `ttl_ms` makes every entry stale on arrival; a zero
/// `sweep_interval_ms` disables the background sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live applied to every entry, in milliseconds
    pub ttl_ms: u64,
    /// Cadence of the background sweep, in milliseconds
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 3_600_000,         // 1 hour
            sweep_interval_ms: 60_000, // 1 minute
        }
    }
}

impl CacheConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = duration_to_ms(ttl);
        self
    }

    /// Sets the sweep interval. `Duration::ZERO` disables sweeping.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval_ms = duration_to_ms(interval);
        self
    }

    /// Entry TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Sweep interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Whether this config starts a background sweep.
    pub fn sweep_enabled(&self) -> bool {
        self.ttl_ms > 0 && self.sweep_interval_ms > 0
    }
}

fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
