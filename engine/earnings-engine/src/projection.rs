//! Synthetic historical projection.
//!
//! No per-season history exists in the dataset, so past seasons are
//! simulated by scaling current earnings down along a fixed curve. Output of
//! this module is illustrative only and must never be presented as a real
//! historical record.

use crate::money::Money;
use crate::types::PlayerRow;

/// Lowest scale any past season is projected at, in percent
pub const MIN_PROJECTION_PERCENT: u64 = 20;

/// Scale lost per season back, in percent
pub const PROJECTION_STEP_PERCENT: u64 = 20;

/// Projects current earnings onto a past display year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSeasonProjection {
    current_season: i32,
}

impl SyntheticSeasonProjection {
    pub fn new(current_season: i32) -> Self {
        Self { current_season }
    }

    /// Seasons between the display year and the current season; zero for
    /// the current or any future year
    pub fn years_back(&self, display_year: i32) -> u32 {
        self.current_season.saturating_sub(display_year).max(0) as u32
    }

    /// `max(20, 100 - 20 * yearsBack)` percent.
    ///
    /// Held as an integer percentage so `1 - 0.2 * 3` is exactly 40%.
    pub fn percent(&self, display_year: i32) -> u64 {
        let years_back = self.years_back(display_year) as u64;
        let lost = PROJECTION_STEP_PERCENT.saturating_mul(years_back);
        100u64.saturating_sub(lost).max(MIN_PROJECTION_PERCENT)
    }

    /// `max(0.2, 1 - 0.2 * yearsBack)`
    pub fn factor(&self, display_year: i32) -> f64 {
        self.percent(display_year) as f64 / 100.0
    }

    /// Scale a single amount, flooring to whole dollars
    pub fn project(&self, amount: Money, display_year: i32) -> Money {
        let percent = self.percent(display_year);
        if percent == 100 {
            return amount;
        }
        (amount as u128 * percent as u128 / 100) as Money
    }

    /// Scale every earnings field of a row in place
    pub fn apply(&self, row: &mut PlayerRow, display_year: i32) {
        if self.years_back(display_year) == 0 {
            return;
        }
        row.total = self.project(row.total, display_year);
        row.ppa = self.project(row.ppa, display_year);
        row.mlp = self.project(row.mlp, display_year);
        row.app = self.project(row.app, display_year);
        row.reported_contracts = self.project(row.reported_contracts, display_year);
        row.endorsements = self.project(row.endorsements, display_year);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_seasons_back() {
        let projection = SyntheticSeasonProjection::new(2025);
        assert_eq!(projection.years_back(2022), 3);
        assert_eq!(projection.project(100_000, 2022), 40_000);
    }

    #[test]
    fn test_factor_floors_at_minimum() {
        let projection = SyntheticSeasonProjection::new(2025);
        assert_eq!(projection.factor(2025), 1.0);
        assert_eq!(projection.factor(2030), 1.0);
        assert_eq!(projection.factor(2020), 0.2);
        assert_eq!(projection.percent(2000), MIN_PROJECTION_PERCENT);
        assert_eq!(projection.project(100_000, 2010), 20_000);
    }

    #[test]
    fn test_project_floors_fractions() {
        let projection = SyntheticSeasonProjection::new(2025);
        // 0.8 * 12_345 = 9_876.0; 0.8 * 7 = 5.6
        assert_eq!(projection.project(12_345, 2024), 9_876);
        assert_eq!(projection.project(7, 2024), 5);
    }

    #[test]
    fn test_current_and_future_years_unchanged() {
        let projection = SyntheticSeasonProjection::new(2025);
        assert_eq!(projection.project(123_457, 2025), 123_457);
        assert_eq!(projection.project(123_457, 2026), 123_457);
    }

    #[test]
    fn test_extreme_years_do_not_overflow() {
        let projection = SyntheticSeasonProjection::new(2025);
        assert_eq!(projection.years_back(i32::MIN), i32::MAX as u32);
        assert_eq!(projection.project(100, i32::MIN), 20);
        assert_eq!(projection.years_back(i32::MAX), 0);
        assert_eq!(projection.project(100, i32::MAX), 100);
    }
}
