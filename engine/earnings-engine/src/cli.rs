//! # Command Line Interface
//!
//! CLI for inspecting rankings, player tables and tiered payouts.

use crate::calculator::{EventType, PayoutCalculator};
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::money::Money;
use crate::query::{FilterCriteria, PageSpec, QueryPlanner, SortSpec};
use crate::ranking::rank;
use crate::types::{ContractTier, Gender, Timeframe, Tour};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Earnings CLI over the DinkBank dataset
#[derive(Parser)]
#[command(name = "earnings-cli")]
#[command(about = "Query DinkBank prize-money rankings and payout ladders")]
pub struct Cli {
    /// Directory holding players.json, payouts.json and payout_tables.json.
    /// The embedded dataset is used when omitted.
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Season treated as current for year projections
    #[arg(long)]
    pub season: Option<i32>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the prize-money ranking
    Rank {
        /// ytd or alltime
        #[arg(long, default_value = "ytd")]
        timeframe: String,
        /// Number of players to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Filter, sort and page the player table
    Players {
        #[arg(long, default_value = "ytd")]
        timeframe: String,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        tour: Option<String>,
        #[arg(long)]
        tier: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long, default_value = "total")]
        sort: String,
        #[arg(long, default_value = "desc")]
        dir: String,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "25")]
        page_size: usize,
    },
    /// Evaluate a tour's payout ladders at a contract tier
    Payouts {
        #[arg(long)]
        tour: String,
        #[arg(long, default_value = "gold")]
        tier: String,
        /// midseason, playoffs or appearance (MLP only)
        #[arg(long)]
        event_type: Option<String>,
    },
    /// Show a player's profile
    Profile {
        /// Player slug
        slug: String,
    },
    /// List players whose totals disagree with their payout history
    Discrepancies,
}

/// CLI handler
pub struct CliHandler {
    dataset: Dataset,
    planner: QueryPlanner,
    calculator: PayoutCalculator,
}

impl CliHandler {
    /// Create new CLI handler
    pub fn new(data_dir: Option<&PathBuf>, season: Option<i32>) -> Result<Self> {
        let dataset = match data_dir {
            Some(dir) => Dataset::load_from_dir(dir).context("Failed to load dataset")?,
            None => Dataset::embedded().context("Failed to load embedded dataset")?,
        };

        let mut config = EngineConfig::from_env()?;
        if let Some(season) = season {
            config.current_season = season;
        }

        Ok(Self {
            dataset,
            planner: QueryPlanner::from_config(&config),
            calculator: PayoutCalculator::new(),
        })
    }

    /// Handle CLI commands
    pub fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Rank { timeframe, limit } => self.show_rank(&timeframe, limit),
            Commands::Players {
                timeframe,
                gender,
                tour,
                tier,
                search,
                year,
                sort,
                dir,
                page,
                page_size,
            } => {
                let criteria = FilterCriteria {
                    gender: gender.as_deref().map(str::parse::<Gender>).transpose()?,
                    tour: tour.as_deref().map(str::parse::<Tour>).transpose()?,
                    contract_tier: tier.as_deref().map(str::parse::<ContractTier>).transpose()?,
                    search,
                    year,
                };
                self.show_players(
                    &timeframe,
                    &criteria,
                    &SortSpec::parse(&sort, &dir),
                    &PageSpec::new(page, page_size),
                )
            }
            Commands::Payouts { tour, tier, event_type } => {
                self.show_payouts(&tour, &tier, event_type.as_deref())
            }
            Commands::Profile { slug } => self.show_profile(&slug),
            Commands::Discrepancies => self.show_discrepancies(),
        }
    }

    fn show_rank(&self, timeframe: &str, limit: usize) -> Result<()> {
        let timeframe: Timeframe = timeframe.parse()?;
        println!("Prize-money ranking ({:?})", timeframe);
        println!("{}", "=".repeat(50));

        for entry in rank(self.dataset.players(), timeframe).iter().take(limit) {
            println!(
                "{:>3}. {:<24} {:>4} {:>14}",
                entry.rank,
                entry.player.name,
                entry.player.country,
                format_money(entry.rank_value)
            );
        }

        Ok(())
    }

    fn show_players(
        &self,
        timeframe: &str,
        criteria: &FilterCriteria,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<()> {
        let timeframe: Timeframe = timeframe.parse()?;
        let rows = self.dataset.rows(timeframe);
        let result = self.planner.query(&rows, criteria, sort, page);

        println!(
            "Players: {} matching, page {}/{} (sorted by {} {:?})",
            result.total_count,
            result.page,
            result.total_pages.max(1),
            result.sort_column,
            result.sort_direction
        );
        println!("{}", "=".repeat(50));

        if result.rows.is_empty() {
            println!("No players found");
            return Ok(());
        }

        for row in &result.rows {
            println!(
                "{:>3}. {:<24} {} {:<8} total {:>12}  PPA {:>10}  MLP {:>10}  APP {:>10}",
                row.rank,
                row.name,
                row.gender,
                row.contract_tier,
                format_money(row.total),
                format_money(row.ppa),
                format_money(row.mlp),
                format_money(row.app)
            );
        }

        Ok(())
    }

    fn show_payouts(&self, tour: &str, tier: &str, event_type: Option<&str>) -> Result<()> {
        let tour: Tour = tour.parse()?;
        let tier: ContractTier = tier.parse()?;
        let event_type = event_type.map(str::parse::<EventType>).transpose()?;

        for table in self.dataset.payout_tables(Some(tour)) {
            let ladder = self.calculator.ladder(table, tier, event_type)?;
            println!(
                "{} {} - {} ({:?}, tier {})",
                ladder.tour, ladder.event_class, ladder.division, ladder.payout_basis, ladder.tier
            );
            println!("{}", "-".repeat(50));
            for row in &ladder.rows {
                println!(
                    "  {:<20} {:>12} -> {:>12}",
                    row.placement,
                    format_money(row.base_amount),
                    format_money(row.amount)
                );
            }
            println!();
        }

        Ok(())
    }

    fn show_profile(&self, slug: &str) -> Result<()> {
        let profile = self.dataset.profile(slug)?;
        let player = &profile.player;

        println!("{} ({}, {})", player.name, player.country, player.gender);
        println!("{}", "=".repeat(50));
        println!("Contract tier:  {}", player.contract_tier);
        println!("YTD prize:      {}", format_money(player.totals.ytd_prize));
        println!("All-time prize: {}", format_money(player.totals.all_time_prize));
        println!("YTD rank:       {}", profile.ytd_rank.map_or("-".to_string(), |r| r.to_string()));
        println!(
            "All-time rank:  {}",
            profile.all_time_rank.map_or("-".to_string(), |r| r.to_string())
        );
        println!("\nRecorded payouts ({} total):", format_money(profile.derived_prize));
        for payout in &profile.payouts {
            println!(
                "  {} {:<28} {:?} {:<14} {:>10}",
                payout.date,
                payout.event_slug,
                payout.bracket,
                payout.result,
                format_money(payout.prize)
            );
        }

        Ok(())
    }

    fn show_discrepancies(&self) -> Result<()> {
        let discrepancies = self.dataset.discrepancies();
        println!("Totals discrepancies: {}", discrepancies.len());
        println!("{}", "=".repeat(50));

        for discrepancy in discrepancies {
            println!(
                "  {:<24} published {:>14}  payouts {:>14}",
                discrepancy.slug,
                format_money(discrepancy.published_all_time),
                format_money(discrepancy.derived_from_payouts)
            );
        }

        Ok(())
    }
}

/// Format whole dollars as `$1,234,567`
pub fn format_money(amount: Money) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
