use crate::error::EngineError;
use crate::money::{self, Money};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Player gender as published on the tour rosters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl FromStr for Gender {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            _ => Err(EngineError::UnknownGender(s.to_string())),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "M"),
            Gender::Female => write!(f, "F"),
        }
    }
}

/// Professional pickleball tours, each with its own payout structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tour {
    Ppa,
    Mlp,
    App,
}

impl Tour {
    pub const ALL: [Tour; 3] = [Tour::Ppa, Tour::Mlp, Tour::App];
}

impl FromStr for Tour {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PPA" => Ok(Tour::Ppa),
            "MLP" => Ok(Tour::Mlp),
            "APP" => Ok(Tour::App),
            _ => Err(EngineError::UnknownTour(s.to_string())),
        }
    }
}

impl fmt::Display for Tour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tour::Ppa => write!(f, "PPA"),
            Tour::Mlp => write!(f, "MLP"),
            Tour::App => write!(f, "APP"),
        }
    }
}

/// Sponsorship/contract status used to scale published prize tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContractTier {
    Gold,
    Standard,
    Futures,
    #[default]
    Unsigned,
}

impl ContractTier {
    pub const ALL: [ContractTier; 4] =
        [ContractTier::Gold, ContractTier::Standard, ContractTier::Futures, ContractTier::Unsigned];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractTier::Gold => "gold",
            ContractTier::Standard => "standard",
            ContractTier::Futures => "futures",
            ContractTier::Unsigned => "unsigned",
        }
    }
}

impl FromStr for ContractTier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gold" => Ok(ContractTier::Gold),
            "standard" => Ok(ContractTier::Standard),
            "futures" => Ok(ContractTier::Futures),
            "unsigned" => Ok(ContractTier::Unsigned),
            _ => Err(EngineError::UnknownTier(s.to_string())),
        }
    }
}

impl fmt::Display for ContractTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which prize field a ranking is computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Ytd,
    Alltime,
}

impl FromStr for Timeframe {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ytd" => Ok(Timeframe::Ytd),
            "alltime" | "all-time" | "all_time" => Ok(Timeframe::Alltime),
            _ => Err(EngineError::UnknownTimeframe(s.to_string())),
        }
    }
}

/// Money totals published for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTotals {
    #[serde(deserialize_with = "money::deserialize")]
    pub ytd_prize: Money,
    #[serde(deserialize_with = "money::deserialize")]
    pub all_time_prize: Money,
    #[serde(default, deserialize_with = "money::deserialize")]
    pub reported_contracts: Money,
    #[serde(default, deserialize_with = "money::deserialize")]
    pub endorsements_estimate: Money,
}

/// Participation in a single tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRecord {
    pub tour: Tour,
    #[serde(default)]
    pub appearances: u32,
    #[serde(deserialize_with = "money::deserialize")]
    pub earnings: Money,
}

/// A professional player and their published earnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub gender: Gender,
    pub country: String,
    pub totals: PlayerTotals,
    #[serde(default)]
    pub contract_tier: ContractTier,
    #[serde(default)]
    pub tours: Vec<TourRecord>,
}

impl Player {
    /// Prize value used for ranking in the given timeframe
    pub fn prize_for(&self, timeframe: Timeframe) -> Money {
        match timeframe {
            Timeframe::Ytd => self.totals.ytd_prize,
            Timeframe::Alltime => self.totals.all_time_prize,
        }
    }

    /// Earnings on a single tour, zero when the player never appeared there
    pub fn earnings_for(&self, tour: Tour) -> Money {
        self.tours.iter().filter(|record| record.tour == tour).map(|record| record.earnings).sum()
    }

    /// Check the money invariants of a single player record
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.slug.is_empty()
            || !self.slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(EngineError::InvalidPlayer {
                slug: self.slug.clone(),
                reason: "slug must be lowercase ascii, digits or '-'".to_string(),
            });
        }

        if self.totals.all_time_prize < self.totals.ytd_prize {
            return Err(EngineError::InvalidPlayer {
                slug: self.slug.clone(),
                reason: format!(
                    "all-time prize {} is below year-to-date prize {}",
                    self.totals.all_time_prize, self.totals.ytd_prize
                ),
            });
        }

        Ok(())
    }
}

/// Draw a payout was earned in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bracket {
    /// Men's singles
    Ms,
    /// Women's singles
    Ws,
    /// Men's doubles
    Md,
    /// Women's doubles
    Wd,
    /// Mixed doubles
    Xd,
}

/// Prize money a player earned at a single event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayout {
    pub event_slug: String,
    pub player_id: String,
    pub bracket: Bracket,
    pub result: String,
    #[serde(deserialize_with = "money::deserialize")]
    pub prize: Money,
    pub date: NaiveDate,
}

/// Whether a ladder amount is paid to each player or split across a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoutBasis {
    PerPlayer,
    PerTeam,
}

/// One placement of a payout ladder. `amount` is the gold-tier base value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRow {
    pub placement: String,
    #[serde(deserialize_with = "money::deserialize")]
    pub amount: Money,
}

/// A published payout ladder, highest placement first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutTable {
    pub tour: Tour,
    pub division: String,
    pub event_class: String,
    pub payout_basis: PayoutBasis,
    pub rows: Vec<PayoutRow>,
}

/// A player with their position in a ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlayer {
    pub rank: u32,
    pub rank_value: Money,
    pub player: Player,
}

/// Flattened table row used by the player listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRow {
    pub rank: u32,
    pub id: String,
    pub slug: String,
    pub name: String,
    pub gender: Gender,
    pub country: String,
    pub contract_tier: ContractTier,
    pub total: Money,
    pub ppa: Money,
    pub mlp: Money,
    pub app: Money,
    pub reported_contracts: Money,
    pub endorsements: Money,
}

impl PlayerRow {
    /// Build a row from a ranked player; `total` is the ranking value
    pub fn from_ranked(ranked: &RankedPlayer) -> Self {
        let player = &ranked.player;
        Self {
            rank: ranked.rank,
            id: player.id.clone(),
            slug: player.slug.clone(),
            name: player.name.clone(),
            gender: player.gender,
            country: player.country.clone(),
            contract_tier: player.contract_tier,
            total: ranked.rank_value,
            ppa: player.earnings_for(Tour::Ppa),
            mlp: player.earnings_for(Tour::Mlp),
            app: player.earnings_for(Tour::App),
            reported_contracts: player.totals.reported_contracts,
            endorsements: player.totals.endorsements_estimate,
        }
    }

    /// Earnings column for a tour
    pub fn tour_earnings(&self, tour: Tour) -> Money {
        match tour {
            Tour::Ppa => self.ppa,
            Tour::Mlp => self.mlp,
            Tour::App => self.app,
        }
    }
}
