//! Player ledger: cash, integrity, insurance, holdings and yearly history.
//!
//! All clamping happens here, at the point of mutation: cash never drops
//! below zero and integrity always stays within `0..=100`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::balance::BalanceSheet;
use crate::data::{EconomyRules, ToolMultipliers};
use crate::error::{GameError, Result};
use crate::math::{fixed_map_serde, fixed_serde, Fixed, Money};

/// Upper bound of the integrity score.
pub const MAX_INTEGRITY: i32 = 100;

/// Crop insurance plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InsuranceKind {
    /// No plan.
    #[default]
    None,
    /// Permanent protection bought once.
    OneTime,
    /// Renewed (and paid) every year.
    Annual,
}

/// Current insurance coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Insurance {
    /// Whether crops are currently covered.
    pub active: bool,
    /// Plan in force.
    pub kind: InsuranceKind,
}

/// Farm tools that multiply crop yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    /// Hand tools.
    HandTools,
    /// Animal-drawn plow; only helps while livestock lives on the farm.
    AnimalPlow,
    /// Tractor; burns fuel every harvest.
    Tractor,
    /// Tractor overhaul; unlocks the harvester.
    TractorRenovated,
    /// Combine harvester.
    Harvester,
}

/// Which tools the farm owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ToolFlags {
    /// Hand tools owned.
    pub hand_tools: bool,
    /// Animal plow owned.
    pub animal_plow: bool,
    /// Tractor owned.
    pub tractor: bool,
    /// Tractor renovated.
    pub tractor_renovated: bool,
    /// Harvester owned.
    pub harvester: bool,
}

impl ToolFlags {
    /// Toggle a tool.
    pub fn set(&mut self, tool: Tool, active: bool) {
        match tool {
            Tool::HandTools => self.hand_tools = active,
            Tool::AnimalPlow => self.animal_plow = active,
            Tool::Tractor => self.tractor = active,
            Tool::TractorRenovated => self.tractor_renovated = active,
            Tool::Harvester => self.harvester = active,
        }
    }

    /// Check whether a tool is owned.
    #[must_use]
    pub const fn is_active(&self, tool: Tool) -> bool {
        match tool {
            Tool::HandTools => self.hand_tools,
            Tool::AnimalPlow => self.animal_plow,
            Tool::Tractor => self.tractor,
            Tool::TractorRenovated => self.tractor_renovated,
            Tool::Harvester => self.harvester,
        }
    }

    /// Combined crop yield multiplier of all effective tools.
    #[must_use]
    pub fn yield_multiplier(&self, rates: &ToolMultipliers, has_livestock: bool) -> Fixed {
        let mut multiplier = Fixed::ONE;
        if self.hand_tools {
            multiplier *= rates.hand_tools;
        }
        if self.animal_plow && has_livestock {
            multiplier *= rates.animal_plow;
        }
        if self.tractor {
            multiplier *= rates.tractor;
        }
        if self.harvester && self.tractor_renovated {
            multiplier *= rates.harvester;
        }
        multiplier
    }

    /// Fuel burned per harvest.
    #[must_use]
    pub fn fuel_cost(&self, rules: &EconomyRules) -> Money {
        if self.tractor {
            rules.tractor_fuel_cost
        } else {
            Money::ZERO
        }
    }
}

/// Event multipliers that last until the next harvest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HarvestModifiers {
    /// Applied to every crop tile.
    #[serde(with = "fixed_serde")]
    pub crop_yield: Fixed,
    /// Market factor applied to every crop tile.
    #[serde(with = "fixed_serde")]
    pub sell_price: Fixed,
    /// Applied to every livestock tile.
    #[serde(with = "fixed_serde")]
    pub livestock: Fixed,
    /// Per-asset overrides.
    #[serde(with = "fixed_map_serde")]
    pub specific: BTreeMap<String, Fixed>,
}

impl Default for HarvestModifiers {
    fn default() -> Self {
        Self {
            crop_yield: Fixed::ONE,
            sell_price: Fixed::ONE,
            livestock: Fixed::ONE,
            specific: BTreeMap::new(),
        }
    }
}

impl HarvestModifiers {
    /// Override multiplier for one asset, 1 if none is set.
    #[must_use]
    pub fn specific_for(&self, asset_id: &str) -> Fixed {
        self.specific.get(asset_id).copied().unwrap_or(Fixed::ONE)
    }

    /// Back to neutral.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A bribe waiting for the player's answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingBribe {
    /// Event that demanded the bribe.
    pub event_id: String,
    /// Amount to pay when accepting.
    pub pay: Money,
    /// Integrity change when refusing.
    #[serde(with = "fixed_serde")]
    pub refuse_integrity: Fixed,
}

/// Short reference to a catalog event, kept in records and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event ID.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Immutable financial record of one closed year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRecord {
    /// Year that closed (starting at 1).
    pub year: u32,
    /// Balance sheet at year end.
    pub balance_sheet: BalanceSheet,
    /// Event that fired, if any.
    pub event: Option<EventSummary>,
    /// Harvest income plus interest.
    pub revenue: Money,
    /// Property tax plus fuel.
    pub expenses: Money,
}

/// Everything the player owns or owes outside the grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerLedger {
    /// Cash on hand, never negative.
    pub cash: Money,
    /// Standing score, `0..=100`.
    #[serde(with = "fixed_serde")]
    pub integrity: Fixed,
    /// Outstanding loans.
    pub loans: Money,
    /// Deferred maintenance.
    pub unpaid_maintenance: Money,
    /// Last assessed property tax.
    pub yearly_tax_liability: Money,
    /// Book value of all structures.
    pub building_value: Money,
    /// Crop insurance.
    pub insurance: Insurance,
    /// Instrument ID to units held.
    pub holdings: BTreeMap<String, u32>,
    /// Owned tools.
    pub tools: ToolFlags,
    /// Event multipliers for the coming harvest.
    pub modifiers: HarvestModifiers,
    /// Whether a drought is in progress.
    pub drought: bool,
    /// Bribe awaiting a decision.
    pub pending_bribe: Option<PendingBribe>,
    /// Closed years, oldest first.
    pub history: Vec<YearRecord>,
}

impl PlayerLedger {
    /// Fresh ledger for a new game on a grid of `grid_size`.
    #[must_use]
    pub fn new(rules: &EconomyRules, grid_size: u32) -> Self {
        Self {
            cash: rules.starting_cash.floor_zero(),
            integrity: clamp_integrity(rules.starting_integrity),
            loans: Money::ZERO,
            unpaid_maintenance: Money::ZERO,
            yearly_tax_liability: rules.property_tax(grid_size),
            building_value: Money::ZERO,
            insurance: Insurance::default(),
            holdings: BTreeMap::new(),
            tools: ToolFlags::default(),
            modifiers: HarvestModifiers::default(),
            drought: false,
            pending_bribe: None,
            history: Vec::new(),
        }
    }

    /// Pay a price in full.
    ///
    /// # Errors
    ///
    /// [`GameError::InsufficientFunds`] if cash does not cover `amount`; the
    /// ledger is left untouched.
    pub fn spend(&mut self, amount: Money) -> Result<()> {
        if amount > self.cash {
            return Err(GameError::insufficient_funds(amount, self.cash));
        }
        self.cash -= amount;
        Ok(())
    }

    /// Take up to `amount`, stopping at zero. Returns what was actually taken.
    pub fn deduct(&mut self, amount: Money) -> Money {
        let before = self.cash;
        self.cash = self.cash.deduct(amount.floor_zero());
        before - self.cash
    }

    /// Add cash.
    pub fn credit(&mut self, amount: Money) {
        self.cash = (self.cash + amount).floor_zero();
    }

    /// Shift integrity by `delta`, clamped to `0..=100`.
    pub fn adjust_integrity(&mut self, delta: Fixed) {
        self.integrity = clamp_integrity(self.integrity.saturating_add(delta));
    }

    /// Multiply integrity by `factor`, clamped to `0..=100`.
    pub fn scale_integrity(&mut self, factor: Fixed) {
        self.integrity = clamp_integrity(self.integrity.saturating_mul(factor));
    }

    /// Whether integrity is exhausted.
    #[must_use]
    pub fn is_bankrupt_of_integrity(&self) -> bool {
        self.integrity <= Fixed::ZERO
    }

    /// Lower book value of buildings, stopping at zero.
    pub fn write_down_buildings(&mut self, amount: Money) {
        self.building_value = self.building_value.deduct(amount);
    }

    /// Units held of an instrument.
    #[must_use]
    pub fn holding(&self, instrument: &str) -> u32 {
        self.holdings.get(instrument).copied().unwrap_or(0)
    }

    /// Add units of an instrument.
    pub fn add_holding(&mut self, instrument: &str, quantity: u32) {
        let held = self.holdings.entry(instrument.to_string()).or_insert(0);
        *held = held.saturating_add(quantity);
    }

    /// Remove units of an instrument; empty positions are dropped.
    pub fn remove_holding(&mut self, instrument: &str, quantity: u32) {
        if let Some(held) = self.holdings.get_mut(instrument) {
            *held = held.saturating_sub(quantity);
            if *held == 0 {
                self.holdings.remove(instrument);
            }
        }
    }

    /// Whether crops are insured right now.
    #[must_use]
    pub const fn is_insured(&self) -> bool {
        self.insurance.active
    }
}

/// Clamp an integrity value into `0..=100`.
#[must_use]
pub fn clamp_integrity(value: Fixed) -> Fixed {
    value.clamp(Fixed::ZERO, Fixed::from_num(MAX_INTEGRITY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::percent;

    fn ledger() -> PlayerLedger {
        PlayerLedger::new(&EconomyRules::default(), 5)
    }

    #[test]
    fn test_new_ledger_uses_rules() {
        let ledger = ledger();
        assert_eq!(ledger.cash, Money::from_dollars(10_000));
        assert_eq!(ledger.integrity, Fixed::from_num(100));
        assert_eq!(ledger.yearly_tax_liability, Money::from_dollars(1250));
        assert!(!ledger.is_insured());
        assert!(ledger.history.is_empty());
    }

    #[test]
    fn test_spend_rejects_overdraft() {
        let mut ledger = ledger();
        ledger.spend(Money::from_dollars(4000)).unwrap();
        assert_eq!(ledger.cash, Money::from_dollars(6000));
        let err = ledger.spend(Money::from_dollars(6001)).unwrap_err();
        assert!(matches!(err, GameError::InsufficientFunds { .. }));
        assert_eq!(ledger.cash, Money::from_dollars(6000));
    }

    #[test]
    fn test_deduct_clamps_at_zero() {
        let mut ledger = ledger();
        let taken = ledger.deduct(Money::from_dollars(12_000));
        assert_eq!(taken, Money::from_dollars(10_000));
        assert_eq!(ledger.cash, Money::ZERO);
    }

    #[test]
    fn test_integrity_is_clamped() {
        let mut ledger = ledger();
        ledger.adjust_integrity(Fixed::from_num(30));
        assert_eq!(ledger.integrity, Fixed::from_num(100));
        ledger.adjust_integrity(Fixed::from_num(-250));
        assert_eq!(ledger.integrity, Fixed::ZERO);
        assert!(ledger.is_bankrupt_of_integrity());
    }

    #[test]
    fn test_holdings_drop_empty_positions() {
        let mut ledger = ledger();
        ledger.add_holding("gold", 3);
        ledger.remove_holding("gold", 1);
        assert_eq!(ledger.holding("gold"), 2);
        ledger.remove_holding("gold", 2);
        assert!(!ledger.holdings.contains_key("gold"));
    }

    #[test]
    fn test_tool_multiplier_stacks() {
        let rates = ToolMultipliers::default();
        let mut tools = ToolFlags::default();
        assert_eq!(tools.yield_multiplier(&rates, false), Fixed::ONE);

        tools.set(Tool::Tractor, true);
        tools.set(Tool::Harvester, true);
        // Harvester needs the renovated tractor.
        assert_eq!(tools.yield_multiplier(&rates, false), rates.tractor);

        tools.set(Tool::TractorRenovated, true);
        assert_eq!(
            tools.yield_multiplier(&rates, false),
            rates.tractor * rates.harvester
        );

        tools.set(Tool::AnimalPlow, true);
        assert!(tools.yield_multiplier(&rates, true) > tools.yield_multiplier(&rates, false));
        assert_eq!(tools.fuel_cost(&EconomyRules::default()), Money::from_dollars(100));
    }

    #[test]
    fn test_modifiers_reset() {
        let mut modifiers = HarvestModifiers::default();
        modifiers.crop_yield = percent(80);
        modifiers.specific.insert("durian".to_string(), percent(150));
        assert_eq!(modifiers.specific_for("durian"), percent(150));
        assert_eq!(modifiers.specific_for("paddyRice"), Fixed::ONE);
        modifiers.reset();
        assert_eq!(modifiers, HarvestModifiers::default());
    }
}
