use crate::error::{EngineError, EngineResult};
use crate::money::Money;
use crate::ranking::{rank, rank_of};
use crate::types::{EventPayout, Player, PlayerRow, PayoutTable, Timeframe, Tour};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

const PLAYERS_JSON: &str = include_str!("../data/players.json");
const PAYOUTS_JSON: &str = include_str!("../data/payouts.json");
const PAYOUT_TABLES_JSON: &str = include_str!("../data/payout_tables.json");

/// Published totals that disagree with a player's payout history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsDiscrepancy {
    pub player_id: String,
    pub slug: String,
    pub published_all_time: Money,
    pub derived_from_payouts: Money,
}

/// Everything the profile page shows for a single player
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub player: Player,
    pub ytd_rank: Option<u32>,
    pub all_time_rank: Option<u32>,
    /// Most recent first
    pub payouts: Vec<EventPayout>,
    pub derived_prize: Money,
}

/// Read-only earnings dataset
///
/// Loaded once at startup; nothing is created, changed or removed
/// afterward.
#[derive(Debug, Clone)]
pub struct Dataset {
    players: Vec<Player>,

    /// Map from player ID to index in `players`
    players_by_id: HashMap<String, usize>,

    /// Map from slug to index in `players`
    players_by_slug: HashMap<String, usize>,

    payouts: Vec<EventPayout>,

    payout_tables: Vec<PayoutTable>,
}

impl Dataset {
    /// Build a dataset, validating every player record
    pub fn new(
        players: Vec<Player>,
        payouts: Vec<EventPayout>,
        payout_tables: Vec<PayoutTable>,
    ) -> EngineResult<Self> {
        let mut players_by_id = HashMap::with_capacity(players.len());
        let mut players_by_slug = HashMap::with_capacity(players.len());

        for (index, player) in players.iter().enumerate() {
            player.validate()?;

            if players_by_id.insert(player.id.clone(), index).is_some() {
                return Err(EngineError::Duplicate { kind: "player id", value: player.id.clone() });
            }
            if players_by_slug.insert(player.slug.clone(), index).is_some() {
                return Err(EngineError::Duplicate { kind: "slug", value: player.slug.clone() });
            }
        }

        for payout in &payouts {
            if !players_by_id.contains_key(&payout.player_id) {
                warn!(
                    "Payout for event {} references unknown player {}",
                    payout.event_slug, payout.player_id
                );
            }
        }

        let dataset = Self { players, players_by_id, players_by_slug, payouts, payout_tables };

        let discrepancies = dataset.discrepancies();
        if !discrepancies.is_empty() {
            warn!(
                "{} players have published totals that differ from their payout history",
                discrepancies.len()
            );
            for discrepancy in &discrepancies {
                debug!(
                    "Totals mismatch for {}: published {} vs derived {}",
                    discrepancy.slug,
                    discrepancy.published_all_time,
                    discrepancy.derived_from_payouts
                );
            }
        }

        Ok(dataset)
    }

    /// Parse a dataset from its three JSON documents
    pub fn from_json(players: &str, payouts: &str, payout_tables: &str) -> EngineResult<Self> {
        let players: Vec<Player> = serde_json::from_str(players)?;
        let payouts: Vec<EventPayout> = serde_json::from_str(payouts)?;
        let payout_tables: Vec<PayoutTable> = serde_json::from_str(payout_tables)?;
        Self::new(players, payouts, payout_tables)
    }

    /// The dataset compiled into the binary
    pub fn embedded() -> EngineResult<Self> {
        let dataset = Self::from_json(PLAYERS_JSON, PAYOUTS_JSON, PAYOUT_TABLES_JSON)?;
        info!(
            "Loaded embedded dataset: {} players, {} payouts, {} payout tables",
            dataset.players.len(),
            dataset.payouts.len(),
            dataset.payout_tables.len()
        );
        Ok(dataset)
    }

    /// Load `players.json`, `payouts.json` and `payout_tables.json` from a
    /// directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> EngineResult<Self> {
        let dir = dir.as_ref();
        info!("Loading dataset from: {:?}", dir);

        let read = |name: &str| {
            std::fs::read_to_string(dir.join(name))
                .map_err(|e| EngineError::Dataset(format!("failed to read {name}: {e}")))
        };

        Self::from_json(
            &read("players.json")?,
            &read("payouts.json")?,
            &read("payout_tables.json")?,
        )
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> EngineResult<&Player> {
        self.players_by_id
            .get(id)
            .map(|index| &self.players[*index])
            .ok_or_else(|| EngineError::PlayerNotFound(id.to_string()))
    }

    pub fn get_by_slug(&self, slug: &str) -> EngineResult<&Player> {
        self.players_by_slug
            .get(slug)
            .map(|index| &self.players[*index])
            .ok_or_else(|| EngineError::PlayerNotFound(slug.to_string()))
    }

    /// Payout history for a player, most recent first
    pub fn payouts_for(&self, player_id: &str) -> Vec<&EventPayout> {
        let mut payouts: Vec<&EventPayout> =
            self.payouts.iter().filter(|payout| payout.player_id == player_id).collect();
        payouts.sort_by(|a, b| b.date.cmp(&a.date));
        payouts
    }

    /// Sum of a player's recorded payouts
    pub fn derived_prize(&self, player_id: &str) -> Money {
        self.payouts.iter().filter(|payout| payout.player_id == player_id).map(|p| p.prize).sum()
    }

    /// Players whose published all-time prize differs from their payouts
    pub fn discrepancies(&self) -> Vec<TotalsDiscrepancy> {
        self.players
            .iter()
            .filter_map(|player| {
                let derived = self.derived_prize(&player.id);
                (derived != player.totals.all_time_prize).then(|| TotalsDiscrepancy {
                    player_id: player.id.clone(),
                    slug: player.slug.clone(),
                    published_all_time: player.totals.all_time_prize,
                    derived_from_payouts: derived,
                })
            })
            .collect()
    }

    /// Payout tables, optionally restricted to one tour
    pub fn payout_tables(&self, tour: Option<Tour>) -> Vec<&PayoutTable> {
        self.payout_tables.iter().filter(|table| tour.map_or(true, |t| table.tour == t)).collect()
    }

    /// Ranked table rows for the timeframe
    pub fn rows(&self, timeframe: Timeframe) -> Vec<PlayerRow> {
        rank(&self.players, timeframe).iter().map(PlayerRow::from_ranked).collect()
    }

    /// Profile for the player with the given slug
    pub fn profile(&self, slug: &str) -> EngineResult<PlayerProfile> {
        let player = self.get_by_slug(slug)?;
        let ytd = rank(&self.players, Timeframe::Ytd);
        let all_time = rank(&self.players, Timeframe::Alltime);

        Ok(PlayerProfile {
            player: player.clone(),
            ytd_rank: rank_of(&ytd, &player.id),
            all_time_rank: rank_of(&all_time, &player.id),
            payouts: self.payouts_for(&player.id).into_iter().cloned().collect(),
            derived_prize: self.derived_prize(&player.id),
        })
    }
}
