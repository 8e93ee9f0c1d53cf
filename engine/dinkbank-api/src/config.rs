//! Configuration for the DinkBank API

use anyhow::{Context, Result};
use earnings_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Main configuration for the API service
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApiConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Rate limiting configuration
    pub rate_limits: RateLimitConfig,

    /// Form submission configuration
    pub submissions: SubmissionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Ranking and query configuration
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Use the first `X-Forwarded-For` entry as the client address
    pub trust_forwarded_for: bool,

    /// Largest accepted request body in bytes
    pub max_body_bytes: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Contact submissions allowed per client address per window
    pub contact_max_requests: u32,

    /// Rate limit window in seconds
    pub window_seconds: u64,

    /// How often expired entries are purged, in seconds
    pub purge_interval_seconds: u64,
}

/// Form submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Minimum time between form render and submit, in milliseconds
    pub min_fill_time_ms: i64,

    /// Expected answer to the corrections form arithmetic check
    pub human_check_answer: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            trust_forwarded_for: false,
            max_body_bytes: 32 * 1024,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { contact_max_requests: 5, window_seconds: 600, purge_interval_seconds: 60 }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self { min_fill_time_ms: 3000, human_check_answer: "7".to_string() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_seconds)
    }
}

impl ApiConfig {
    /// Get the server address
    pub fn server_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: ApiConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override values from `DINKBANK_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("DINKBANK_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("DINKBANK_PORT") {
            self.server.port = port.parse().unwrap_or(self.server.port);
        }

        if let Ok(level) = std::env::var("DINKBANK_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("DINKBANK_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(limit) = std::env::var("DINKBANK_CONTACT_RATE_LIMIT") {
            self.rate_limits.contact_max_requests =
                limit.parse().unwrap_or(self.rate_limits.contact_max_requests);
        }

        if let Ok(window) = std::env::var("DINKBANK_RATE_WINDOW_SECS") {
            self.rate_limits.window_seconds =
                window.parse().unwrap_or(self.rate_limits.window_seconds);
        }

        if let Ok(answer) = std::env::var("DINKBANK_HUMAN_CHECK_ANSWER") {
            self.submissions.human_check_answer = answer;
        }

        if let Ok(season) = std::env::var("DINKBANK_CURRENT_SEASON") {
            self.engine.current_season = season.parse().unwrap_or(self.engine.current_season);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level)),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            _ => return Err(anyhow::anyhow!("Invalid log format: {}", self.logging.format)),
        }

        if self.rate_limits.contact_max_requests == 0 {
            return Err(anyhow::anyhow!("Contact rate limit must allow at least one request"));
        }

        if self.rate_limits.window_seconds == 0 || self.rate_limits.purge_interval_seconds == 0 {
            return Err(anyhow::anyhow!("Rate limit intervals must be greater than zero"));
        }

        if self.submissions.min_fill_time_ms < 0 {
            return Err(anyhow::anyhow!(
                "Invalid minimum fill time: {}",
                self.submissions.min_fill_time_ms
            ));
        }

        if self.submissions.human_check_answer.trim().is_empty() {
            return Err(anyhow::anyhow!("Human check answer must not be empty"));
        }

        self.engine.validate()?;

        Ok(())
    }
}

/// Load configuration from an optional file and environment variables
pub fn load_config(path: Option<&Path>) -> Result<ApiConfig> {
    let mut config = match path {
        Some(path) if path.exists() => {
            tracing::debug!("Loading configuration from file: {:?}", path);
            ApiConfig::load_from_file(path)?
        }
        Some(path) => {
            return Err(anyhow::anyhow!("Config file not found: {:?}", path));
        }
        None => ApiConfig::default(),
    };

    config.apply_env();
    config.validate().context("Invalid configuration")?;

    Ok(config)
}
