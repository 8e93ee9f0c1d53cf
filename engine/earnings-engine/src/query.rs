//! Filtering, sorting and pagination for the player table.
//!
//! The pipeline is: synthetic year projection, filter, resolve the effective
//! sort, stable sort, reassign view-relative ranks, paginate.

use crate::config::EngineConfig;
use crate::money::coerce_numeric;
use crate::projection::SyntheticSeasonProjection;
use crate::types::{ContractTier, Gender, PlayerRow, Tour};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Default rows per page for the player table
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: usize = 200;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse a direction, falling back to descending for anything unrecognised
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// Columns of the player table that can be sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Rank,
    Name,
    Country,
    Tier,
    Total,
    Tour(Tour),
    Contracts,
    Endorsements,
}

impl SortColumn {
    /// Parse a column key. Unknown keys degrade to `Total`.
    pub fn parse(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "rank" => SortColumn::Rank,
            "name" => SortColumn::Name,
            "country" => SortColumn::Country,
            "tier" | "contracttier" | "contract_tier" => SortColumn::Tier,
            "total" => SortColumn::Total,
            "ppa" => SortColumn::Tour(Tour::Ppa),
            "mlp" => SortColumn::Tour(Tour::Mlp),
            "app" => SortColumn::Tour(Tour::App),
            "contracts" | "reportedcontracts" => SortColumn::Contracts,
            "endorsements" => SortColumn::Endorsements,
            other => {
                debug!("Unknown sort column '{}', using total", other);
                SortColumn::Total
            }
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SortColumn::Rank => "rank",
            SortColumn::Name => "name",
            SortColumn::Country => "country",
            SortColumn::Tier => "tier",
            SortColumn::Total => "total",
            SortColumn::Tour(Tour::Ppa) => "ppa",
            SortColumn::Tour(Tour::Mlp) => "mlp",
            SortColumn::Tour(Tour::App) => "app",
            SortColumn::Contracts => "contracts",
            SortColumn::Endorsements => "endorsements",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Requested or effective ordering of the player table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn parse(column: &str, direction: &str) -> Self {
        Self::new(SortColumn::parse(column), SortDirection::parse(direction))
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortColumn::Total, SortDirection::Desc)
    }
}

/// Filters applied to the player table. Every field is optional and the
/// present ones are AND-ed together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    pub gender: Option<Gender>,
    pub tour: Option<Tour>,
    pub contract_tier: Option<ContractTier>,
    pub search: Option<String>,
    /// Display year for the synthetic season projection
    pub year: Option<i32>,
}

impl FilterCriteria {
    /// Whether a row satisfies every active filter
    pub fn matches(&self, row: &PlayerRow) -> bool {
        if let Some(gender) = self.gender {
            if row.gender != gender {
                return false;
            }
        }

        if let Some(tour) = self.tour {
            if row.tour_earnings(tour) == 0 {
                return false;
            }
        }

        if let Some(tier) = self.contract_tier {
            if row.contract_tier != tier {
                return false;
            }
        }

        if let Some(needle) = self.search_needle() {
            if !row.name.to_lowercase().contains(&needle) {
                return false;
            }
        }

        true
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase)
    }
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub page: usize,
    pub page_size: usize,
}

impl PageSpec {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Clamp to a usable request: page 0 becomes 1, page size 0 becomes the
    /// default and oversized pages are capped
    pub fn normalized(&self, default_page_size: usize, max_page_size: usize) -> Self {
        let page = self.page.max(1);
        let page_size = match self.page_size {
            0 => default_page_size,
            size => size.min(max_page_size),
        };
        Self { page, page_size: page_size.max(1) }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1)).saturating_mul(self.page_size)
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// A single page of the player table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<PlayerRow>,
    /// Rows matching the filters, before pagination
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
    /// Column actually used for ordering
    pub sort_column: String,
    pub sort_direction: SortDirection,
}

/// Ordering to use for a request.
///
/// While a tour filter is active, sorting by the blended `total` ranks by
/// that tour's earnings instead, always descending, whatever direction was
/// requested.
pub fn resolve_effective_sort(criteria: &FilterCriteria, requested: &SortSpec) -> SortSpec {
    match (criteria.tour, requested.column) {
        (Some(tour), SortColumn::Total) => {
            SortSpec::new(SortColumn::Tour(tour), SortDirection::Desc)
        }
        _ => *requested,
    }
}

/// A value used for comparing rows
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    /// Numeric view of the value; text is coerced
    pub fn as_number(&self) -> f64 {
        match self {
            SortValue::Number(value) => *value,
            SortValue::Text(text) => coerce_numeric(text),
        }
    }

    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => self.as_number().total_cmp(&other.as_number()),
        }
    }
}

/// Extract the comparison value of a column
pub fn sort_value(row: &PlayerRow, column: SortColumn) -> SortValue {
    match column {
        SortColumn::Rank => SortValue::Number(row.rank as f64),
        SortColumn::Name => SortValue::Text(row.name.clone()),
        SortColumn::Country => SortValue::Text(row.country.clone()),
        SortColumn::Tier => SortValue::Text(row.contract_tier.as_str().to_string()),
        SortColumn::Total => SortValue::Number(row.total as f64),
        SortColumn::Tour(tour) => SortValue::Number(row.tour_earnings(tour) as f64),
        SortColumn::Contracts => SortValue::Number(row.reported_contracts as f64),
        SortColumn::Endorsements => SortValue::Number(row.endorsements as f64),
    }
}

/// Runs player table queries against a fixed season
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    projection: SyntheticSeasonProjection,
    default_page_size: usize,
    max_page_size: usize,
}

impl QueryPlanner {
    /// Create a planner for the given current season
    pub fn new(current_season: i32) -> Self {
        Self {
            projection: SyntheticSeasonProjection::new(current_season),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Create a planner from engine configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            projection: SyntheticSeasonProjection::new(config.current_season),
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// Filter, sort and paginate rows
    pub fn query(
        &self,
        rows: &[PlayerRow],
        criteria: &FilterCriteria,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> QueryResult {
        let page = page.normalized(self.default_page_size, self.max_page_size);

        let mut visible: Vec<PlayerRow> = rows
            .iter()
            .cloned()
            .map(|mut row| {
                if let Some(year) = criteria.year {
                    self.projection.apply(&mut row, year);
                }
                row
            })
            .filter(|row| criteria.matches(row))
            .collect();

        let effective = resolve_effective_sort(criteria, sort);
        visible.sort_by(|a, b| {
            let ordering =
                sort_value(a, effective.column).compare(&sort_value(b, effective.column));
            match effective.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        for (index, row) in visible.iter_mut().enumerate() {
            row.rank = index as u32 + 1;
        }

        let total_count = visible.len();
        let total_pages = total_count.div_ceil(page.page_size);
        let page_rows: Vec<PlayerRow> =
            visible.into_iter().skip(page.offset()).take(page.page_size).collect();

        debug!(
            "Player query matched {} rows, returning page {} ({} rows) sorted by {} {:?}",
            total_count,
            page.page,
            page_rows.len(),
            effective.column,
            effective.direction
        );

        QueryResult {
            rows: page_rows,
            total_count,
            total_pages,
            page: page.page,
            page_size: page.page_size,
            sort_column: effective.column.key().to_string(),
            sort_direction: effective.direction,
        }
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Filter, sort and paginate rows against the configured current season
pub fn query(
    rows: &[PlayerRow],
    criteria: &FilterCriteria,
    sort: &SortSpec,
    page: &PageSpec,
) -> QueryResult {
    QueryPlanner::default().query(rows, criteria, sort, page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn row(id: &str, gender: Gender, tier: ContractTier, earnings: [u64; 3]) -> PlayerRow {
        let [ppa, mlp, app] = earnings;
        PlayerRow {
            rank: 0,
            id: id.to_string(),
            slug: id.to_string(),
            name: format!("Player {}", id.to_uppercase()),
            gender,
            country: "USA".to_string(),
            contract_tier: tier,
            total: ppa + mlp + app,
            ppa,
            mlp,
            app,
            reported_contracts: 0,
            endorsements: 0,
        }
    }

    fn sample_rows() -> Vec<PlayerRow> {
        vec![
            row("a", Gender::Female, ContractTier::Gold, [500, 100, 0]),
            row("b", Gender::Male, ContractTier::Standard, [0, 900, 50]),
            row("c", Gender::Female, ContractTier::Futures, [200, 300, 0]),
            row("d", Gender::Male, ContractTier::Gold, [50, 0, 400]),
            row("e", Gender::Female, ContractTier::Unsigned, [0, 0, 75]),
            row("f", Gender::Female, ContractTier::Gold, [10, 700, 0]),
        ]
    }

    fn planner() -> QueryPlanner {
        QueryPlanner::new(2025)
    }

    fn ids(result: &QueryResult) -> Vec<&str> {
        result.rows.iter().map(|row| row.id.as_str()).collect()
    }

    fn all_rows(criteria: &FilterCriteria) -> QueryResult {
        planner().query(&sample_rows(), criteria, &SortSpec::default(), &PageSpec::new(1, 100))
    }

    #[test]
    fn test_no_filters_sorts_by_total_desc() {
        let result = all_rows(&FilterCriteria::default());
        assert_eq!(result.total_count, 6);
        assert_eq!(ids(&result), vec!["b", "f", "a", "c", "d", "e"]);
        assert_eq!(result.rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_filter_conjunction_is_intersection() {
        let female =
            all_rows(&FilterCriteria { gender: Some(Gender::Female), ..Default::default() });
        let ppa = all_rows(&FilterCriteria { tour: Some(Tour::Ppa), ..Default::default() });
        let both = all_rows(&FilterCriteria {
            gender: Some(Gender::Female),
            tour: Some(Tour::Ppa),
            ..Default::default()
        });

        let female_ids: HashSet<&str> = ids(&female).into_iter().collect();
        let ppa_ids: HashSet<&str> = ids(&ppa).into_iter().collect();
        let both_ids: HashSet<&str> = ids(&both).into_iter().collect();

        let expected: HashSet<&str> = female_ids.intersection(&ppa_ids).copied().collect();
        assert_eq!(both_ids, expected);
        assert_eq!(both.total_count, 3);
    }

    #[test]
    fn test_tour_filter_requires_positive_earnings() {
        let result = all_rows(&FilterCriteria { tour: Some(Tour::App), ..Default::default() });
        assert_eq!(ids(&result), vec!["d", "e", "b"]);
    }

    #[test]
    fn test_tier_and_search_filters() {
        let gold = all_rows(&FilterCriteria {
            contract_tier: Some(ContractTier::Gold),
            ..Default::default()
        });
        assert_eq!(gold.total_count, 3);

        let search = all_rows(&FilterCriteria {
            search: Some("  player c ".to_string()),
            ..Default::default()
        });
        assert_eq!(ids(&search), vec!["c"]);

        let blank =
            all_rows(&FilterCriteria { search: Some("   ".to_string()), ..Default::default() });
        assert_eq!(blank.total_count, 6);
    }

    #[test]
    fn test_resolve_effective_sort_overrides_total_for_tour() {
        let criteria = FilterCriteria { tour: Some(Tour::Mlp), ..Default::default() };
        let requested = SortSpec::new(SortColumn::Total, SortDirection::Asc);
        assert_eq!(
            resolve_effective_sort(&criteria, &requested),
            SortSpec::new(SortColumn::Tour(Tour::Mlp), SortDirection::Desc)
        );

        let by_name = SortSpec::new(SortColumn::Name, SortDirection::Asc);
        assert_eq!(resolve_effective_sort(&criteria, &by_name), by_name);

        let no_tour = FilterCriteria::default();
        assert_eq!(resolve_effective_sort(&no_tour, &requested), requested);
    }

    #[test]
    fn test_tour_sort_override_ignores_direction() {
        let criteria = FilterCriteria { tour: Some(Tour::Mlp), ..Default::default() };
        let result = planner().query(
            &sample_rows(),
            &criteria,
            &SortSpec::new(SortColumn::Total, SortDirection::Asc),
            &PageSpec::new(1, 100),
        );

        let mut expected: Vec<PlayerRow> =
            sample_rows().into_iter().filter(|row| row.mlp > 0).collect();
        expected.sort_by(|a, b| b.mlp.cmp(&a.mlp));
        let expected_ids: Vec<String> = expected.into_iter().map(|row| row.id).collect();

        assert_eq!(ids(&result), expected_ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(result.sort_column, "mlp");
        assert_eq!(result.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn test_text_columns_sort_alphabetically() {
        let result = planner().query(
            &sample_rows(),
            &FilterCriteria::default(),
            &SortSpec::parse("name", "asc"),
            &PageSpec::new(1, 100),
        );
        assert_eq!(ids(&result), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_unknown_sort_key_falls_back_to_total() {
        assert_eq!(SortColumn::parse("nonsense"), SortColumn::Total);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Desc);
    }

    #[test]
    fn test_ranks_are_relative_to_view() {
        let result = all_rows(&FilterCriteria { gender: Some(Gender::Male), ..Default::default() });
        assert_eq!(ids(&result), vec!["b", "d"]);
        assert_eq!(result.rows[0].rank, 1);
        assert_eq!(result.rows[1].rank, 2);
    }

    #[test]
    fn test_pagination_slices_and_counts() {
        let result = planner().query(
            &sample_rows(),
            &FilterCriteria::default(),
            &SortSpec::default(),
            &PageSpec::new(2, 4),
        );
        assert_eq!(result.total_count, 6);
        assert_eq!(result.total_pages, 2);
        assert_eq!(ids(&result), vec!["d", "e"]);
        assert_eq!(result.rows[0].rank, 5);

        let past_end = planner().query(
            &sample_rows(),
            &FilterCriteria::default(),
            &SortSpec::default(),
            &PageSpec::new(9, 4),
        );
        assert!(past_end.rows.is_empty());
        assert_eq!(past_end.total_count, 6);
    }

    #[test]
    fn test_page_normalization() {
        let page = PageSpec::new(0, 0).normalized(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        assert_eq!(page, PageSpec::new(1, DEFAULT_PAGE_SIZE));

        let page = PageSpec::new(3, 10_000).normalized(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        assert_eq!(page, PageSpec::new(3, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_year_projection_scales_rows() {
        let rows = vec![row("a", Gender::Female, ContractTier::Gold, [100_000, 0, 0])];
        let result = planner().query(
            &rows,
            &FilterCriteria { year: Some(2022), ..Default::default() },
            &SortSpec::default(),
            &PageSpec::default(),
        );
        assert_eq!(result.rows[0].total, 40_000);
        assert_eq!(result.rows[0].ppa, 40_000);
    }

    #[test]
    fn test_empty_dataset() {
        let result = planner().query(
            &[],
            &FilterCriteria { tour: Some(Tour::Ppa), ..Default::default() },
            &SortSpec::default(),
            &PageSpec::default(),
        );
        assert!(result.rows.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(result.total_pages, 0);
    }

    #[test]
    fn test_sort_value_coerces_text_against_numbers() {
        let text = SortValue::Text("$1,500".to_string());
        assert_eq!(text.as_number(), 1500.0);
        assert_eq!(text.compare(&SortValue::Number(1000.0)), Ordering::Greater);
        assert_eq!(SortValue::Text("n/a".to_string()).as_number(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_pages_reconstruct_filtered_set(
            totals in proptest::collection::vec(0u64..500, 0..60),
            page_size in 1usize..12,
        ) {
            let rows: Vec<PlayerRow> = totals
                .iter()
                .enumerate()
                .map(|(i, total)| {
                    row(&format!("p{i}"), Gender::Male, ContractTier::Gold, [*total, 0, 0])
                })
                .collect();
            let criteria = FilterCriteria { tour: Some(Tour::Ppa), ..Default::default() };
            let sort = SortSpec::default();

            let full = planner().query(&rows, &criteria, &sort, &PageSpec::new(1, MAX_PAGE_SIZE));
            let mut stitched = Vec::new();
            let pages = full.total_count.div_ceil(page_size);
            for page in 1..=pages {
                let result =
                    planner().query(&rows, &criteria, &sort, &PageSpec::new(page, page_size));
                prop_assert_eq!(result.total_count, full.total_count);
                stitched.extend(result.rows.into_iter().map(|row| row.id));
            }

            let expected: Vec<String> = full.rows.into_iter().map(|row| row.id).collect();
            prop_assert_eq!(stitched, expected);
        }
    }
}
