//! Stored cache entries.

use std::time::{Duration, Instant};

/// A cached value and the instant it stops being visible.
#[derive(Clone, Debug)]
pub(crate) struct Entry<V> {
    pub(crate) value: V,
    /// `None` when `inserted + ttl` overflows the clock; such entries never expire.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now.checked_add(ttl),
        }
    }

    /// An entry is expired once `now` reaches its deadline.
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}
