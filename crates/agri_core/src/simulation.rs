//! Simulation state and the farm facade.
//!
//! [`SimulationContext`] is the whole mutable game state: grid, ledger and
//! market, plus the year counter and forecast. It is plain data that can be
//! cloned, hashed and snapshotted.
//!
//! [`Farm`] owns a context together with the static catalogs and the injected
//! random source, and exposes every operation a presentation layer needs.
//!
//! # Determinism
//!
//! - No floating-point math in state (fixed-point and integer cents)
//! - No system randomness (the caller injects a [`RandomSource`])
//! - Ordered maps and arena-ordered tiles for iteration
//! - Same seed and same actions always produce the same state hash
//!
//! # Example
//!
//! ```
//! use agri_core::simulation::Farm;
//!
//! let mut farm = Farm::builtin(42).unwrap();
//! farm.place(0, 0, "paddyRice").unwrap();
//! let report = farm.end_turn().unwrap();
//! assert_eq!(report.year, 1);
//! assert!(farm.balance_sheet().is_balanced());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::balance::BalanceSheet;
use crate::data::{AssetKind, EconomyCatalog, EventCatalog};
use crate::error::{GameError, Result};
use crate::events::EventSystem;
use crate::grid::{FarmGrid, Liquidation, Occupant, Placement, Renovation};
use crate::ledger::{EventSummary, Insurance, InsuranceKind, PlayerLedger, Tool, YearRecord};
use crate::market::{MarketEngine, TradeQuote};
use crate::math::{Fixed, Money};
use crate::random::{RandomSource, SeededRandom};
use crate::turn::{process_turn, TurnReport};

/// Next year's event, drawn early by a comms structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Forecast {
    /// Event that will fire, `None` for a quiet year.
    pub event: Option<EventSummary>,
}

/// Complete mutable game state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationContext {
    /// Year the next turn will close, starting at 1.
    pub year: u32,
    /// Farm tiles.
    pub grid: FarmGrid,
    /// Cash, integrity and everything else the player holds.
    pub ledger: PlayerLedger,
    /// Instrument prices.
    pub market: MarketEngine,
    /// Pre-drawn event for the next turn.
    pub forecast: Option<Forecast>,
    /// Terminal flag; once set, no turn runs again.
    pub game_over: bool,
}

impl SimulationContext {
    /// Opening state for a catalog.
    #[must_use]
    pub fn new(catalog: &EconomyCatalog) -> Self {
        let rules = &catalog.rules;
        Self {
            year: 1,
            grid: FarmGrid::new(rules.starting_grid_size),
            ledger: PlayerLedger::new(rules, rules.starting_grid_size),
            market: MarketEngine::new(&catalog.instruments, rules),
            forecast: None,
            game_over: false,
        }
    }

    /// Derive the current balance sheet.
    #[must_use]
    pub fn balance_sheet(&self, catalog: &EconomyCatalog) -> BalanceSheet {
        BalanceSheet::compute(&self.grid, &self.ledger, &self.market, &catalog.rules)
    }

    /// Hash of the entire state.
    ///
    /// Two contexts with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Encode the state for an in-memory snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize farm: {e}")))
    }

    /// Decode a snapshot produced by [`SimulationContext::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize farm: {e}")))
    }
}

/// Result of answering a bribe demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BribeOutcome {
    /// Paid; cash actually taken.
    Paid(Money),
    /// Refused; integrity change applied.
    Refused(Fixed),
}

/// A running farm game.
///
/// Every mutation is request/response: it either succeeds and returns what
/// happened, or fails with a [`GameError`] and leaves the state untouched.
#[derive(Debug, Clone)]
pub struct Farm<R = SeededRandom> {
    catalog: EconomyCatalog,
    events: EventSystem,
    rng: R,
    ctx: SimulationContext,
}

impl Farm<SeededRandom> {
    /// A farm on the built-in catalogs with a seeded generator.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded catalog fails to parse.
    pub fn builtin(seed: u64) -> Result<Self> {
        Ok(Self::new(
            EconomyCatalog::builtin()?,
            EventCatalog::builtin()?,
            SeededRandom::new(seed),
        ))
    }
}

impl<R: RandomSource> Farm<R> {
    /// Start a new game.
    #[must_use]
    pub fn new(catalog: EconomyCatalog, events: EventCatalog, rng: R) -> Self {
        let ctx = SimulationContext::new(&catalog);
        Self {
            catalog,
            events: EventSystem::new(events),
            rng,
            ctx,
        }
    }

    /// Reset to the opening state. The random source keeps its position.
    pub fn initialize(&mut self) {
        self.ctx = SimulationContext::new(&self.catalog);
        info!("Farm initialized");
    }

    /// Close the current year.
    ///
    /// # Errors
    ///
    /// [`GameError::GameOver`] once integrity is exhausted, on every call
    /// until [`Farm::initialize`].
    pub fn end_turn(&mut self) -> Result<TurnReport> {
        process_turn(&mut self.ctx, &self.catalog, &self.events, &mut self.rng)
    }

    fn ensure_running(&self, operation: &str) -> Result<()> {
        if self.ctx.game_over {
            warn!(operation, "Refused: game over");
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    /// Buy and place a catalog asset on an empty tile.
    ///
    /// # Errors
    ///
    /// See [`FarmGrid::place`]; also [`GameError::GameOver`].
    pub fn place(&mut self, x: u32, z: u32, asset_id: &str) -> Result<Placement> {
        self.ensure_running("place")?;
        let placement = self
            .ctx
            .grid
            .place(x, z, asset_id, &self.catalog, self.ctx.ledger.cash)
            .map_err(|e| refused("place", e))?;
        self.ctx.ledger.spend(placement.cost)?;
        if placement.kind == AssetKind::Structure {
            self.ctx.ledger.building_value += placement.cost;
        }
        debug!(x, z, asset = asset_id, cost = %placement.cost, "Placed");
        Ok(placement)
    }

    /// Sell whatever occupies a tile.
    ///
    /// # Errors
    ///
    /// [`GameError::TileEmpty`], [`GameError::OutOfBounds`] or
    /// [`GameError::GameOver`].
    pub fn liquidate(&mut self, x: u32, z: u32) -> Result<Liquidation> {
        self.ensure_running("liquidate")?;
        let sold = self
            .ctx
            .grid
            .liquidate(x, z, &self.catalog)
            .map_err(|e| refused("liquidate", e))?;
        self.ctx.ledger.credit(sold.refund);
        if matches!(sold.occupant, Occupant::Structure { .. }) {
            self.ctx.ledger.write_down_buildings(sold.base_value);
        }
        debug!(x, z, refund = %sold.refund, "Liquidated");
        Ok(sold)
    }

    /// Upgrade a structure to its next tier.
    ///
    /// # Errors
    ///
    /// See [`FarmGrid::renovate`]; also [`GameError::GameOver`].
    pub fn renovate(&mut self, x: u32, z: u32) -> Result<Renovation> {
        self.ensure_running("renovate")?;
        let renovation = self
            .ctx
            .grid
            .renovate(x, z, &self.catalog, self.ctx.ledger.cash)
            .map_err(|e| refused("renovate", e))?;
        self.ctx.ledger.spend(renovation.cost)?;
        self.ctx.ledger.building_value += renovation.cost;
        debug!(x, z, to = %renovation.to, "Renovated");
        Ok(renovation)
    }

    /// Buy units of an instrument at the current price.
    ///
    /// # Errors
    ///
    /// See [`MarketEngine::buy`]; also [`GameError::GameOver`].
    pub fn buy_instrument(&mut self, id: &str, quantity: u32) -> Result<TradeQuote> {
        self.ensure_running("buy_instrument")?;
        let quote = self
            .ctx
            .market
            .buy(id, quantity, self.ctx.ledger.cash)
            .map_err(|e| refused("buy_instrument", e))?;
        self.ctx.ledger.spend(quote.total)?;
        self.ctx.ledger.add_holding(id, quantity);
        Ok(quote)
    }

    /// Sell units of an instrument at the current price.
    ///
    /// # Errors
    ///
    /// See [`MarketEngine::sell`]; also [`GameError::GameOver`].
    pub fn sell_instrument(&mut self, id: &str, quantity: u32) -> Result<TradeQuote> {
        self.ensure_running("sell_instrument")?;
        let held = self.ctx.ledger.holding(id);
        let quote = self
            .ctx
            .market
            .sell(id, quantity, held)
            .map_err(|e| refused("sell_instrument", e))?;
        self.ctx.ledger.credit(quote.total);
        self.ctx.ledger.remove_holding(id, quantity);
        Ok(quote)
    }

    /// Buy crop insurance. Returns the premium paid.
    ///
    /// Switching from annual to one-time is allowed; buying a plan that is
    /// already active, or anything on top of one-time cover, is not.
    ///
    /// # Errors
    ///
    /// [`GameError::AlreadyInsured`], [`GameError::InsufficientFunds`],
    /// [`GameError::InvalidState`] for [`InsuranceKind::None`], or
    /// [`GameError::GameOver`].
    pub fn buy_insurance(&mut self, kind: InsuranceKind) -> Result<Money> {
        self.ensure_running("buy_insurance")?;
        let rules = &self.catalog.rules;
        let cost = match kind {
            InsuranceKind::None => {
                return Err(GameError::InvalidState("no insurance plan selected".to_string()))
            }
            InsuranceKind::OneTime => rules.one_time_insurance_cost,
            InsuranceKind::Annual => rules.annual_insurance_cost,
        };
        let current = self.ctx.ledger.insurance;
        if current.active && (current.kind == InsuranceKind::OneTime || current.kind == kind) {
            return Err(refused("buy_insurance", GameError::AlreadyInsured));
        }
        self.ctx
            .ledger
            .spend(cost)
            .map_err(|e| refused("buy_insurance", e))?;
        self.ctx.ledger.insurance = Insurance { active: true, kind };
        info!(?kind, cost = %cost, "Insurance bought");
        Ok(cost)
    }

    /// Grow the grid by one row and column. Returns the price paid.
    ///
    /// # Errors
    ///
    /// [`GameError::InsufficientFunds`] or [`GameError::GameOver`].
    pub fn expand_grid(&mut self) -> Result<Money> {
        self.ensure_running("expand_grid")?;
        let rules = &self.catalog.rules;
        let new_size = self.ctx.grid.size() + 1;
        let cost = rules.expansion_cost(new_size);
        self.ctx
            .ledger
            .spend(cost)
            .map_err(|e| refused("expand_grid", e))?;
        self.ctx.grid.expand();
        self.ctx.ledger.yearly_tax_liability = rules.property_tax(new_size);
        info!(size = new_size, cost = %cost, "Grid expanded");
        Ok(cost)
    }

    /// Check if a structure (or a renovated tier of it) stands on the grid.
    #[must_use]
    pub fn has_structure(&self, id: &str) -> bool {
        self.ctx.grid.has_structure(id, &self.catalog)
    }

    /// Own or drop a tool.
    ///
    /// # Errors
    ///
    /// [`GameError::GameOver`].
    pub fn set_tool(&mut self, tool: Tool, active: bool) -> Result<()> {
        self.ensure_running("set_tool")?;
        self.ctx.ledger.tools.set(tool, active);
        Ok(())
    }

    /// Answer the pending bribe demand.
    ///
    /// # Errors
    ///
    /// [`GameError::NoPendingDecision`] or [`GameError::GameOver`].
    pub fn resolve_bribe(&mut self, accept: bool) -> Result<BribeOutcome> {
        self.ensure_running("resolve_bribe")?;
        let bribe = self
            .ctx
            .ledger
            .pending_bribe
            .take()
            .ok_or(GameError::NoPendingDecision)?;
        let outcome = if accept {
            BribeOutcome::Paid(self.ctx.ledger.deduct(bribe.pay))
        } else {
            self.ctx.ledger.adjust_integrity(bribe.refuse_integrity);
            BribeOutcome::Refused(bribe.refuse_integrity)
        };
        info!(event = %bribe.event_id, ?outcome, "Bribe resolved");
        Ok(outcome)
    }

    /// Current ledger.
    #[must_use]
    pub const fn ledger(&self) -> &PlayerLedger {
        &self.ctx.ledger
    }

    /// Current grid.
    #[must_use]
    pub const fn grid(&self) -> &FarmGrid {
        &self.ctx.grid
    }

    /// Current market.
    #[must_use]
    pub const fn market(&self) -> &MarketEngine {
        &self.ctx.market
    }

    /// Whole simulation state.
    #[must_use]
    pub const fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Economy catalog in use.
    #[must_use]
    pub const fn catalog(&self) -> &EconomyCatalog {
        &self.catalog
    }

    /// Event system in use.
    #[must_use]
    pub const fn events(&self) -> &EventSystem {
        &self.events
    }

    /// The injected random source.
    #[must_use]
    pub const fn rng(&self) -> &R {
        &self.rng
    }

    /// Closed years, oldest first.
    #[must_use]
    pub fn history(&self) -> &[YearRecord] {
        &self.ctx.ledger.history
    }

    /// Year the next turn will close.
    #[must_use]
    pub const fn year(&self) -> u32 {
        self.ctx.year
    }

    /// Whether the game has ended.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.ctx.game_over
    }

    /// Next year's event, if a forecast exists.
    #[must_use]
    pub const fn forecast(&self) -> Option<&Forecast> {
        self.ctx.forecast.as_ref()
    }

    /// Derive the current balance sheet.
    #[must_use]
    pub fn balance_sheet(&self) -> BalanceSheet {
        self.ctx.balance_sheet(&self.catalog)
    }

    /// Hash of the simulation state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.ctx.state_hash()
    }

    /// Capture the state, e.g. before a turn.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        self.ctx.serialize()
    }

    /// Roll the state back to a snapshot. The random source is not rewound.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be decoded; the state is kept.
    pub fn restore(&mut self, snapshot: &[u8]) -> Result<()> {
        self.ctx = SimulationContext::deserialize(snapshot)?;
        Ok(())
    }
}

fn refused(operation: &str, error: GameError) -> GameError {
    warn!(operation, %error, "Operation refused");
    error
}
