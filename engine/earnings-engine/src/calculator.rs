//! Tiered prize calculator.
//!
//! Published payout ladders list the gold-tier amount for each placement.
//! A player's estimated take-home is that amount scaled by the multiplier of
//! their contract tier. PPA scales by a single scalar per tier; MLP scales
//! differently per event type.

use crate::error::{EngineError, EngineResult};
use crate::money::Money;
use crate::types::{ContractTier, PayoutBasis, PayoutTable, Tour};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// MLP event categories with distinct contract scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Midseason,
    Playoffs,
    Appearance,
}

impl FromStr for EventType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "midseason" => Ok(EventType::Midseason),
            "playoffs" => Ok(EventType::Playoffs),
            "appearance" | "appearance-fee" | "appearance_fee" => Ok(EventType::Appearance),
            _ => Err(EngineError::UnknownEventType(s.to_string())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Midseason => write!(f, "midseason"),
            EventType::Playoffs => write!(f, "playoffs"),
            EventType::Appearance => write!(f, "appearance"),
        }
    }
}

/// Multipliers for each MLP event type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventMultipliers {
    pub midseason: f64,
    pub playoffs: f64,
    pub appearance: f64,
}

impl EventMultipliers {
    pub fn get(&self, event_type: EventType) -> f64 {
        match event_type {
            EventType::Midseason => self.midseason,
            EventType::Playoffs => self.playoffs,
            EventType::Appearance => self.appearance,
        }
    }
}

/// How a contract tier scales base amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TierModel {
    Flat { multiplier: f64 },
    PerEventType { multipliers: EventMultipliers },
}

impl TierModel {
    /// Resolve the scalar for an event type. Flat models ignore the event
    /// type; per-event-type models require one.
    pub fn multiplier(&self, tour: Tour, event_type: Option<EventType>) -> EngineResult<f64> {
        match self {
            TierModel::Flat { multiplier } => Ok(*multiplier),
            TierModel::PerEventType { multipliers } => event_type
                .map(|event_type| multipliers.get(event_type))
                .ok_or_else(|| EngineError::MissingEventType(tour.to_string())),
        }
    }
}

/// Round to the nearest whole dollar, halves up
pub fn round_half_up(value: f64) -> Money {
    if value.is_finite() && value > 0.0 {
        (value + 0.5).floor() as Money
    } else {
        0
    }
}

/// Contract tier models for a single tour
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutModel {
    pub tour: Tour,
    pub tiers: BTreeMap<ContractTier, TierModel>,
}

impl PayoutModel {
    /// PPA: one scalar per tier
    pub fn ppa() -> Self {
        let tiers = BTreeMap::from([
            (ContractTier::Gold, TierModel::Flat { multiplier: 1.0 }),
            (ContractTier::Standard, TierModel::Flat { multiplier: 0.4 }),
            (ContractTier::Futures, TierModel::Flat { multiplier: 0.2 }),
            (ContractTier::Unsigned, TierModel::Flat { multiplier: 0.1 }),
        ]);
        Self { tour: Tour::Ppa, tiers }
    }

    /// MLP: separate scalars for midseason, playoffs and appearance fees
    pub fn mlp() -> Self {
        let triple = |midseason, playoffs, appearance| TierModel::PerEventType {
            multipliers: EventMultipliers { midseason, playoffs, appearance },
        };
        let tiers = BTreeMap::from([
            (ContractTier::Gold, triple(1.0, 1.0, 1.0)),
            (ContractTier::Standard, triple(0.6, 0.75, 0.5)),
            (ContractTier::Futures, triple(0.3, 0.5, 0.25)),
            (ContractTier::Unsigned, triple(0.1, 0.25, 0.1)),
        ]);
        Self { tour: Tour::Mlp, tiers }
    }

    /// APP publishes no contract scale; every tier is paid the base amount
    pub fn app() -> Self {
        let tiers = ContractTier::ALL
            .iter()
            .map(|tier| (*tier, TierModel::Flat { multiplier: 1.0 }))
            .collect();
        Self { tour: Tour::App, tiers }
    }

    pub fn for_tour(tour: Tour) -> Self {
        match tour {
            Tour::Ppa => Self::ppa(),
            Tour::Mlp => Self::mlp(),
            Tour::App => Self::app(),
        }
    }

    pub fn tier_model(&self, tier: ContractTier) -> EngineResult<&TierModel> {
        self.tiers.get(&tier).ok_or_else(|| EngineError::UnknownTier(tier.to_string()))
    }

    /// Scale a base amount for a tier
    pub fn payout(
        &self,
        base_amount: Money,
        tier: ContractTier,
        event_type: Option<EventType>,
    ) -> EngineResult<Money> {
        let multiplier = self.tier_model(tier)?.multiplier(self.tour, event_type)?;
        Ok(round_half_up(base_amount as f64 * multiplier))
    }
}

/// Scale a base amount under the PPA model, parsing the tier by name
pub fn payout(base_amount: Money, tier: &str) -> EngineResult<Money> {
    let tier: ContractTier = tier.parse()?;
    PayoutModel::ppa().payout(base_amount, tier, None)
}

/// A ladder placement evaluated at a tier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPayout {
    pub placement: String,
    pub base_amount: Money,
    pub amount: Money,
}

/// A full payout ladder evaluated at a tier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredLadder {
    pub tour: Tour,
    pub division: String,
    pub event_class: String,
    pub payout_basis: PayoutBasis,
    pub tier: ContractTier,
    pub event_type: Option<EventType>,
    pub rows: Vec<TierPayout>,
}

/// Applies tour payout models to published ladders
#[derive(Debug, Clone)]
pub struct PayoutCalculator {
    models: BTreeMap<Tour, PayoutModel>,
}

impl PayoutCalculator {
    pub fn new() -> Self {
        let models = Tour::ALL.iter().map(|tour| (*tour, PayoutModel::for_tour(*tour))).collect();
        Self { models }
    }

    pub fn model(&self, tour: Tour) -> Option<&PayoutModel> {
        self.models.get(&tour)
    }

    /// Evaluate every placement of a table at a tier.
    ///
    /// When no event type is given it is taken from the table's event class
    /// if that names one (MLP tables are published per event type).
    pub fn ladder(
        &self,
        table: &PayoutTable,
        tier: ContractTier,
        event_type: Option<EventType>,
    ) -> EngineResult<TieredLadder> {
        let model = self
            .model(table.tour)
            .ok_or_else(|| EngineError::UnknownTour(table.tour.to_string()))?;
        let event_type = event_type.or_else(|| table.event_class.parse().ok());

        let rows = table
            .rows
            .iter()
            .map(|row| {
                Ok(TierPayout {
                    placement: row.placement.clone(),
                    base_amount: row.amount,
                    amount: model.payout(row.amount, tier, event_type)?,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        debug!(
            "Evaluated {} {} ladder ({}) at tier {}",
            table.tour, table.event_class, table.division, tier
        );

        Ok(TieredLadder {
            tour: table.tour,
            division: table.division.clone(),
            event_class: table.event_class.clone(),
            payout_basis: table.payout_basis,
            tier,
            event_type,
            rows,
        })
    }
}

impl Default for PayoutCalculator {
    fn default() -> Self {
        Self::new()
    }
}
