//! Headless multi-year simulation runs.
//!
//! A [`Strategy`] plays the between-turn actions a player would take, then
//! the farm closes the year. One [`YearLine`] is collected per closed year.

use std::fmt;

use agri_core::error::GameError;
use agri_core::ledger::InsuranceKind;
use agri_core::math::Money;
use agri_core::random::RandomSource;
use agri_core::simulation::Farm;
use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, warn};

/// Cash kept back from planting.
const RESERVE: Money = Money::from_dollars(2000);

/// Livestock heads the diversified strategy aims for.
const HERD_TARGET: u32 = 4;

/// Scripted player behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Never act; only close years.
    Idle,
    /// Plant paddy rice on every empty tile each year.
    Rice,
    /// Storage, irrigation, a small herd, insurance, a currency position
    /// and sugarcane on the rest.
    Diversified,
}

impl Strategy {
    /// Take this year's actions.
    pub fn play<R: RandomSource>(self, farm: &mut Farm<R>) {
        match self {
            Self::Idle => {}
            Self::Rice => plant_everywhere(farm, "paddyRice", Money::ZERO),
            Self::Diversified => play_diversified(farm),
        }
    }
}

fn empty_tiles<R: RandomSource>(farm: &Farm<R>) -> Vec<(u32, u32)> {
    farm.grid()
        .tiles()
        .iter()
        .filter(|t| t.is_empty())
        .map(|t| (t.x, t.z))
        .collect()
}

fn plant_everywhere<R: RandomSource>(farm: &mut Farm<R>, crop: &str, reserve: Money) {
    let Some(cost) = farm.catalog().crop(crop).map(|c| c.cost) else {
        return;
    };
    for (x, z) in empty_tiles(farm) {
        if farm.ledger().cash < cost + reserve {
            break;
        }
        if let Err(error) = farm.place(x, z, crop) {
            debug!(x, z, %error, "Planting skipped");
        }
    }
}

fn place_first_empty<R: RandomSource>(farm: &mut Farm<R>, asset: &str) -> bool {
    empty_tiles(farm)
        .first()
        .is_some_and(|&(x, z)| farm.place(x, z, asset).is_ok())
}

fn play_diversified<R: RandomSource>(farm: &mut Farm<R>) {
    if farm.ledger().pending_bribe.is_some() {
        let accept = farm.ledger().cash > Money::from_dollars(5000);
        if let Err(error) = farm.resolve_bribe(accept) {
            debug!(%error, "Bribe left unanswered");
        }
    }

    for structure in ["barn", "well"] {
        if !farm.has_structure(structure) {
            place_first_empty(farm, structure);
        }
    }

    let missing = HERD_TARGET.saturating_sub(farm.grid().livestock_heads()) as usize;
    for animal in ["duck", "pig"].into_iter().cycle().take(missing) {
        if farm.ledger().cash < RESERVE {
            break;
        }
        place_first_empty(farm, animal);
    }

    if !farm.ledger().is_insured() && farm.ledger().cash > Money::from_dollars(3000) {
        if let Err(error) = farm.buy_insurance(InsuranceKind::Annual) {
            debug!(%error, "Insurance not bought");
        }
    }

    if farm.ledger().holding("usd") == 0 && farm.ledger().cash > Money::from_dollars(6000) {
        if let Err(error) = farm.buy_instrument("usd", 1) {
            debug!(%error, "Currency position not opened");
        }
    }

    plant_everywhere(farm, "sugarcane", RESERVE);
}

/// One closed year, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearLine {
    /// Year that closed.
    pub year: u32,
    /// Cash after the year.
    pub cash: Money,
    /// Integrity after the year, rounded to whole points.
    pub integrity: i32,
    /// Net worth after the year.
    pub net_worth: Money,
    /// Event that fired, if any.
    pub event: Option<String>,
}

impl fmt::Display for YearLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "year {:>3}  cash {:>14}  integrity {:>3}  net worth {:>14}  {}",
            self.year,
            self.cash.to_string(),
            self.integrity,
            self.net_worth.to_string(),
            self.event.as_deref().unwrap_or("-")
        )
    }
}

/// Result of a headless run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// One line per closed year.
    pub years: Vec<YearLine>,
    /// Whether the run stopped on game over.
    pub game_over: bool,
    /// Final state hash.
    pub final_hash: u64,
}

/// Play `years` years with a strategy.
///
/// Stops early on game over.
pub fn run<R: RandomSource>(farm: &mut Farm<R>, years: u32, strategy: Strategy) -> RunSummary {
    let mut lines = Vec::with_capacity(years as usize);
    let mut game_over = false;

    for _ in 0..years {
        strategy.play(farm);
        match farm.end_turn() {
            Ok(report) => lines.push(YearLine {
                year: report.year,
                cash: farm.ledger().cash,
                integrity: farm.ledger().integrity.round().to_num(),
                net_worth: report.record.balance_sheet.equity.net_worth,
                event: report.event.map(|e| e.name),
            }),
            Err(GameError::GameOver) => {
                warn!(year = farm.year(), "Game over");
                game_over = true;
                break;
            }
            Err(error) => {
                warn!(%error, "Turn failed");
                break;
            }
        }
    }

    RunSummary {
        years: lines,
        game_over,
        final_hash: farm.state_hash(),
    }
}
