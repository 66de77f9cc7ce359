//! Deterministic proxy rotation.
//!
//! Cycles round-robin through the configured pool via a monotonically
//! increasing counter owned by the rotator instance. Each run owns its own
//! rotator; two runs sharing one target must partition their pools
//! externally.

use crate::error::{AppError, Result};
use crate::models::ProxyEntry;

/// Round-robin cursor over the configured proxy pool.
#[derive(Debug)]
pub struct ProxyRotator {
    pool: Vec<ProxyEntry>,
    counter: usize,
}

impl ProxyRotator {
    /// Create a rotator over a non-empty pool.
    ///
    /// An empty pool is a configuration error: "no proxy" must be expressed
    /// as an explicit direct-connection entry, never by omission.
    pub fn new(pool: Vec<ProxyEntry>) -> Result<Self> {
        if pool.is_empty() {
            return Err(AppError::config(
                "proxy pool is empty; configure at least one entry",
            ));
        }
        Ok(Self { pool, counter: 0 })
    }

    /// Next entry in strict round-robin order. Every call advances the
    /// counter by one regardless of what the caller does with the entry.
    pub fn next(&mut self) -> ProxyEntry {
        let entry = self.pool[self.counter % self.pool.len()].clone();
        self.counter += 1;
        entry
    }

    /// Total number of entries handed out so far.
    pub fn cursor(&self) -> usize {
        self.counter
    }

    /// Size of the configured pool.
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }
}
