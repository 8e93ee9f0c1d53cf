//! Rate limiting for form submissions
//!
//! Hits are kept as a timestamp log per client key; a request is allowed
//! when fewer than `limit` earlier hits fall inside the trailing window.

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The hit was recorded
    Allowed { remaining: usize },

    /// The hit was refused; the oldest hit leaves the window after `retry_after`
    Limited { retry_after: Duration },
}

/// Storage for per-key hit logs
///
/// The in-memory store is used by default and in tests; a shared external
/// store can be plugged in for multi-instance deployments.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record a hit for `key` at `now` unless `limit` hits already fall
    /// within `window`
    async fn try_acquire(
        &self,
        key: &str,
        now: Instant,
        window: Duration,
        limit: usize,
    ) -> RateLimitDecision;

    /// Drop hits older than `window`, returning how many keys were removed
    async fn purge_expired(&self, now: Instant, window: Duration) -> usize;

    /// Number of keys currently tracked
    async fn tracked_keys(&self) -> usize;
}

/// Process-local store; resets on restart
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    hits: RwLock<HashMap<String, Vec<Instant>>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn try_acquire(
        &self,
        key: &str,
        now: Instant,
        window: Duration,
        limit: usize,
    ) -> RateLimitDecision {
        let mut hits = self.hits.write().await;
        let key_hits = hits.entry(key.to_string()).or_default();

        // Remove old requests outside the window
        key_hits.retain(|&time| now.saturating_duration_since(time) < window);

        if key_hits.len() >= limit {
            let oldest = key_hits.iter().min().copied().unwrap_or(now);
            let retry_after = window.saturating_sub(now.saturating_duration_since(oldest));
            return RateLimitDecision::Limited { retry_after };
        }

        key_hits.push(now);
        RateLimitDecision::Allowed { remaining: limit - key_hits.len() }
    }

    async fn purge_expired(&self, now: Instant, window: Duration) -> usize {
        let mut hits = self.hits.write().await;
        let before = hits.len();
        hits.retain(|_, times| {
            times.retain(|&time| now.saturating_duration_since(time) < window);
            !times.is_empty()
        });
        before - hits.len()
    }

    async fn tracked_keys(&self) -> usize {
        self.hits.read().await.len()
    }
}

/// Limits contact submissions per client address
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    /// Create a rate limiter backed by the in-memory store
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryRateLimitStore::new()))
    }

    /// Create a rate limiter over a custom store
    pub fn with_store(config: &RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self { store, limit: config.contact_max_requests as usize, window: config.window() }
    }

    /// Check and record a request from `key`
    pub async fn check(&self, key: &str) -> Result<(), ApiError> {
        self.check_at(key, Instant::now()).await
    }

    /// Check and record a request from `key` at a given instant
    pub async fn check_at(&self, key: &str, now: Instant) -> Result<(), ApiError> {
        match self.store.try_acquire(key, now, self.window, self.limit).await {
            RateLimitDecision::Allowed { remaining } => {
                debug!("Rate limit ok for {} ({} remaining)", key, remaining);
                Ok(())
            }
            RateLimitDecision::Limited { retry_after } => {
                // Round up so clients never retry a moment too early
                let retry_after_secs =
                    retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                Err(ApiError::RateLimited { retry_after_secs: retry_after_secs.max(1) })
            }
        }
    }

    /// Drop expired entries from the store
    pub async fn purge_expired(&self) -> usize {
        self.store.purge_expired(Instant::now(), self.window).await
    }
}
