//! Shared, read-only service state

use crate::config::ApiConfig;
use crate::rate_limiter::RateLimiter;
use anyhow::{Context, Result};
use earnings_engine::{Dataset, PayoutCalculator, QueryPlanner};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a request handler needs
///
/// Only the rate limiter holds mutable state; the dataset, planner and
/// calculator are immutable after startup.
pub struct ApiState {
    pub config: ApiConfig,
    pub dataset: Dataset,
    pub planner: QueryPlanner,
    pub calculator: PayoutCalculator,
    pub rate_limiter: RateLimiter,
}

impl ApiState {
    /// Build state over the embedded dataset
    pub fn new(config: ApiConfig) -> Result<Self> {
        let dataset = Dataset::embedded().context("Failed to load embedded dataset")?;
        Ok(Self::with_dataset(config, dataset))
    }

    /// Build state over a given dataset with an in-memory rate limiter
    pub fn with_dataset(config: ApiConfig, dataset: Dataset) -> Self {
        let rate_limiter = RateLimiter::new(&config.rate_limits);
        Self::with_parts(config, dataset, rate_limiter)
    }

    /// Build state from explicit parts
    pub fn with_parts(config: ApiConfig, dataset: Dataset, rate_limiter: RateLimiter) -> Self {
        let planner = QueryPlanner::from_config(&config.engine);
        Self { config, dataset, planner, calculator: PayoutCalculator::new(), rate_limiter }
    }
}

/// Periodically drop expired rate limit entries so the store does not grow
/// with every address ever seen
pub fn start_rate_limit_purger(state: Arc<ApiState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let period = state.config.rate_limits.purge_interval();
        info!("Starting rate limit purger (every {:?})", period);

        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;

            let removed = state.rate_limiter.purge_expired().await;
            if removed > 0 {
                debug!("Purged {} expired rate limit entries", removed);
            }
        }
    })
}
