//! DinkBank API
//!
//! HTTP service over the earnings engine: the player table, player profiles,
//! tiered payout ladders, plus the contact and correction forms.

pub mod config;
pub mod error;
pub mod logging;
pub mod rate_limiter;
pub mod rest_api;
pub mod signals;
pub mod state;
pub mod submissions;

pub use config::{load_config, ApiConfig};
pub use error::{ApiError, ApiResult};
pub use logging::initialize_logging;
pub use rate_limiter::{InMemoryRateLimitStore, RateLimitStore, RateLimiter};
pub use rest_api::create_routes;
pub use signals::shutdown_signal;
pub use state::{start_rate_limit_purger, ApiState};
