//! Prize-money ranking over a roster

use crate::types::{Player, RankedPlayer, Timeframe};
use tracing::debug;

/// Rank players by descending prize value for the timeframe.
///
/// Ranks are 1-based and strictly sequential. Players with equal prize value
/// keep their relative input order; no secondary key is applied.
pub fn rank(players: &[Player], timeframe: Timeframe) -> Vec<RankedPlayer> {
    let mut ordered: Vec<&Player> = players.iter().collect();
    // `sort_by` is stable
    ordered.sort_by(|a, b| b.prize_for(timeframe).cmp(&a.prize_for(timeframe)));

    let ranked: Vec<RankedPlayer> = ordered
        .into_iter()
        .enumerate()
        .map(|(index, player)| RankedPlayer {
            rank: index as u32 + 1,
            rank_value: player.prize_for(timeframe),
            player: player.clone(),
        })
        .collect();

    debug!("Ranked {} players by {:?}", ranked.len(), timeframe);
    ranked
}

/// Position of a player in a ranking, if present
pub fn rank_of(ranked: &[RankedPlayer], player_id: &str) -> Option<u32> {
    ranked.iter().find(|entry| entry.player.id == player_id).map(|entry| entry.rank)
}
