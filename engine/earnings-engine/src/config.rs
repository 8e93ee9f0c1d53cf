use crate::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Configuration for the earnings engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Season treated as "now" by the synthetic historical projection
    pub current_season: i32,

    /// Rows per page when a request asks for none
    pub default_page_size: usize,

    /// Largest page a request may ask for
    pub max_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            current_season: chrono::Utc::now().year(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(season) = std::env::var("DINKBANK_CURRENT_SEASON") {
            config.current_season = season.parse().unwrap_or(config.current_season);
        }

        if let Ok(page_size) = std::env::var("DINKBANK_DEFAULT_PAGE_SIZE") {
            config.default_page_size = page_size.parse().unwrap_or(DEFAULT_PAGE_SIZE);
        }

        if let Ok(max_page_size) = std::env::var("DINKBANK_MAX_PAGE_SIZE") {
            config.max_page_size = max_page_size.parse().unwrap_or(MAX_PAGE_SIZE);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject page limits that cannot produce a page
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(anyhow::anyhow!("Page sizes must be greater than zero"));
        }

        if self.default_page_size > self.max_page_size {
            return Err(anyhow::anyhow!(
                "Default page size {} exceeds maximum {}",
                self.default_page_size,
                self.max_page_size
            ));
        }

        Ok(())
    }
}
