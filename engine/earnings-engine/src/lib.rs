//! DinkBank earnings engine
//!
//! Ranks players by prize money, answers filtered/sorted/paginated player
//! table queries and scales published payout ladders by contract tier. All
//! operations are pure functions over a read-only, in-memory dataset.

pub mod calculator;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod money;
pub mod projection;
pub mod query;
pub mod ranking;
pub mod types;

pub use calculator::{payout, EventType, PayoutCalculator, PayoutModel, TierModel, TieredLadder};
pub use config::EngineConfig;
pub use dataset::{Dataset, PlayerProfile};
pub use error::{EngineError, EngineResult};
pub use money::Money;
pub use projection::SyntheticSeasonProjection;
pub use query::{
    query, resolve_effective_sort, FilterCriteria, PageSpec, QueryPlanner, QueryResult,
    SortColumn, SortDirection, SortSpec,
};
pub use ranking::rank;
pub use types::*;
