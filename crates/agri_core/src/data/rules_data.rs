//! Numeric rules of the year-end pipeline.
//!
//! Every field has a default, so an economy file only needs to list the rules
//! it overrides.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, dollars_serde, percent, ratio, Fixed, Money};

/// Yield multipliers granted by farm tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolMultipliers {
    /// Hand tools bonus.
    #[serde(with = "decimal_serde")]
    pub hand_tools: Fixed,
    /// Animal plow bonus; needs living livestock on the grid.
    #[serde(with = "decimal_serde")]
    pub animal_plow: Fixed,
    /// Tractor bonus.
    #[serde(with = "decimal_serde")]
    pub tractor: Fixed,
    /// Harvester bonus; needs a renovated tractor.
    #[serde(with = "decimal_serde")]
    pub harvester: Fixed,
}

impl Default for ToolMultipliers {
    fn default() -> Self {
        Self {
            hand_tools: percent(105),
            animal_plow: percent(115),
            tractor: percent(140),
            harvester: Fixed::from_num(2),
        }
    }
}

/// Economy-wide constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Cash at the start of a new game.
    #[serde(with = "dollars_serde")]
    pub starting_cash: Money,

    /// Grid side length at the start of a new game.
    pub starting_grid_size: u32,

    /// Integrity at the start of a new game.
    #[serde(with = "decimal_serde")]
    pub starting_integrity: Fixed,

    /// Property tax per tile per year.
    #[serde(with = "dollars_serde")]
    pub tax_per_tile: Money,

    /// Interest paid on post-tax cash.
    #[serde(with = "decimal_serde")]
    pub interest_rate: Fixed,

    /// Balance-sheet value of one tile of land.
    #[serde(with = "dollars_serde")]
    pub land_price_per_tile: Money,

    /// Balance-sheet value of one head of livestock.
    #[serde(with = "dollars_serde")]
    pub livestock_head_value: Money,

    /// Harvest revenue for crops missing from the catalog.
    #[serde(with = "dollars_serde")]
    pub fallback_crop_yield: Money,

    /// Per-head revenue for animals missing from the catalog.
    #[serde(with = "dollars_serde")]
    pub fallback_livestock_yield: Money,

    /// Integrity gained in a year that ends with more cash than it began.
    #[serde(with = "decimal_serde")]
    pub integrity_profit_bonus: Fixed,

    /// Depreciation factor with a storage structure on the grid.
    #[serde(with = "decimal_serde")]
    pub depreciation_with_storage: Fixed,

    /// Depreciation factor without a storage structure.
    #[serde(with = "decimal_serde")]
    pub depreciation_without_storage: Fixed,

    /// Harvest factor during an unirrigated drought.
    #[serde(with = "decimal_serde")]
    pub drought_penalty: Fixed,

    /// Flat fuel cost per harvest while a tractor is active.
    #[serde(with = "dollars_serde")]
    pub tractor_fuel_cost: Money,

    /// Tool yield multipliers.
    pub tools: ToolMultipliers,

    /// Price of permanent insurance.
    #[serde(with = "dollars_serde")]
    pub one_time_insurance_cost: Money,

    /// Yearly premium of annual insurance.
    #[serde(with = "dollars_serde")]
    pub annual_insurance_cost: Money,

    /// Fraction of base value refunded on liquidation.
    #[serde(with = "decimal_serde")]
    pub refund_rate: Fixed,

    /// Refund fraction while a road structure is on the grid.
    #[serde(with = "decimal_serde")]
    pub road_refund_rate: Fixed,

    /// Cost of the first grid expansion.
    #[serde(with = "dollars_serde")]
    pub expansion_base_cost: Money,

    /// Cost growth per additional expansion.
    #[serde(with = "decimal_serde")]
    pub expansion_growth: Fixed,

    /// Lowest price an event impact can set.
    #[serde(with = "dollars_serde")]
    pub event_price_floor: Money,

    /// Highest price an event impact can set.
    #[serde(with = "dollars_serde")]
    pub event_price_ceiling: Money,

    /// Number of prices kept per instrument.
    pub price_history_len: usize,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            starting_cash: Money::from_dollars(10_000),
            starting_grid_size: 5,
            starting_integrity: Fixed::from_num(100),
            tax_per_tile: Money::from_dollars(50),
            interest_rate: percent(8),
            land_price_per_tile: Money::from_dollars(1000),
            livestock_head_value: Money::from_dollars(300),
            fallback_crop_yield: Money::from_dollars(150),
            fallback_livestock_yield: Money::from_dollars(80),
            integrity_profit_bonus: Fixed::from_num(5),
            depreciation_with_storage: percent(98),
            depreciation_without_storage: percent(90),
            drought_penalty: percent(60),
            tractor_fuel_cost: Money::from_dollars(100),
            tools: ToolMultipliers::default(),
            one_time_insurance_cost: Money::from_dollars(8000),
            annual_insurance_cost: Money::from_dollars(1000),
            refund_rate: percent(70),
            road_refund_rate: percent(85),
            expansion_base_cost: Money::from_dollars(1000),
            expansion_growth: ratio(3, 2),
            event_price_floor: Money::from_cents(10),
            event_price_ceiling: Money::from_dollars(10_000),
            price_history_len: 10,
        }
    }
}

impl EconomyRules {
    /// Property tax owed for a grid of the given side length.
    #[must_use]
    pub fn property_tax(&self, grid_size: u32) -> Money {
        self.tax_per_tile.times(grid_size.saturating_mul(grid_size))
    }

    /// Balance-sheet land value for a grid of the given side length.
    #[must_use]
    pub fn land_value(&self, grid_size: u32) -> Money {
        self.land_price_per_tile.times(grid_size.saturating_mul(grid_size))
    }

    /// Cost of growing the grid to `new_size`.
    ///
    /// `base × growth^(new_size − starting_size)`, rounded to the dollar
    /// once at the end.
    #[must_use]
    pub fn expansion_cost(&self, new_size: u32) -> Money {
        let steps = new_size.saturating_sub(self.starting_grid_size);
        let growth = (0..steps).fold(Fixed::ONE, |acc, _| acc.saturating_mul(self.expansion_growth));
        self.expansion_base_cost.scale_to_dollar(growth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_tax_and_land() {
        let rules = EconomyRules::default();
        assert_eq!(rules.property_tax(5), Money::from_dollars(1250));
        assert_eq!(rules.land_value(5), Money::from_dollars(25_000));
        assert_eq!(rules.property_tax(6), Money::from_dollars(1800));
    }

    #[test]
    fn test_expansion_cost_grows() {
        let rules = EconomyRules::default();
        assert_eq!(rules.expansion_cost(5), Money::from_dollars(1000));
        assert_eq!(rules.expansion_cost(6), Money::from_dollars(1500));
        assert_eq!(rules.expansion_cost(7), Money::from_dollars(2250));
        assert_eq!(rules.expansion_cost(8), Money::from_dollars(3375));
    }

    #[test]
    fn test_expansion_cost_rounds_only_at_the_end() {
        let rules = EconomyRules::default();
        // 1000 × 1.5^9 = 38,443.36; 1.5^13 → 194,619.51; 1.5^14 → 291,929.26
        assert_eq!(rules.expansion_cost(14), Money::from_dollars(38_443));
        assert_eq!(rules.expansion_cost(18), Money::from_dollars(194_620));
        assert_eq!(rules.expansion_cost(19), Money::from_dollars(291_929));
    }

    #[test]
    fn test_partial_rules_use_defaults() {
        let rules: EconomyRules = ron::from_str("(tax_per_tile: 75, interest_rate: 0.05)").unwrap();
        assert_eq!(rules.tax_per_tile, Money::from_dollars(75));
        assert_eq!(rules.starting_cash, Money::from_dollars(10_000));
        assert_eq!(rules.starting_grid_size, 5);
    }
}
