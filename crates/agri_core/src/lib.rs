//! # Agri Core
//!
//! Deterministic farm economy simulation core for Agri-Ledger.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (catalogs are parsed from in-memory strings)
//! - No system randomness (a [`random::RandomSource`] is injected)
//! - No floating-point math in state (fixed-point and integer cents)
//!
//! This separation enables:
//! - Headless simulation runs
//! - Action replays verified by state hash
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`data`] - Economy, rules and event catalogs
//! - [`grid`] - Farm tiles, placement, liquidation and renovation
//! - [`ledger`] - Cash, integrity, insurance, tools and holdings
//! - [`market`] - Instrument prices and trading
//! - [`events`] - Event resolution and effects
//! - [`balance`] - Balance sheet derivation
//! - [`turn`] - Year-end pipeline
//! - [`simulation`] - Game state and the [`simulation::Farm`] facade
//! - [`replay`] - Action recording and playback
//! - [`math`] - Fixed-point and money types

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod balance;
pub mod data;
pub mod error;
pub mod events;
pub mod grid;
pub mod ledger;
pub mod market;
pub mod math;
pub mod random;
pub mod replay;
pub mod simulation;
pub mod turn;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::balance::BalanceSheet;
    pub use crate::data::{EconomyCatalog, EconomyRules, EventCatalog};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{FarmGrid, Occupant, Tile};
    pub use crate::ledger::{InsuranceKind, PlayerLedger, Tool, YearRecord};
    pub use crate::market::MarketEngine;
    pub use crate::math::{Fixed, Money};
    pub use crate::random::{RandomSource, ScriptedRandom, SeededRandom};
    pub use crate::replay::{ActionOutcome, FarmAction, Replay};
    pub use crate::simulation::{BribeOutcome, Farm, Forecast, SimulationContext};
    pub use crate::turn::TurnReport;
}
