//! Balance sheet derivation.
//!
//! A balance sheet is never stored as the source of truth; it is recomputed
//! from the grid, the ledger and the market whenever it is needed. Money is
//! integer cents, so `assets − liabilities == net worth` holds exactly.

use serde::{Deserialize, Serialize};

use crate::data::EconomyRules;
use crate::grid::FarmGrid;
use crate::ledger::PlayerLedger;
use crate::market::MarketEngine;
use crate::math::Money;

/// Asset side of the balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Assets {
    /// Cash on hand.
    pub cash: Money,
    /// Market value of instrument holdings.
    pub stock_value: Money,
    /// Value of the land under the grid.
    pub land_value: Money,
    /// Value of all livestock heads.
    pub livestock_value: Money,
    /// Book value of structures.
    pub building_value: Money,
    /// Sum of the above.
    pub total: Money,
}

/// Liability side of the balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Liabilities {
    /// Outstanding loans.
    pub loans: Money,
    /// Deferred maintenance.
    pub unpaid_maintenance: Money,
    /// Current property tax assessment.
    pub yearly_tax_liability: Money,
    /// Sum of the above.
    pub total: Money,
}

/// Owner's equity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Equity {
    /// Assets minus liabilities.
    pub net_worth: Money,
}

/// Derived financial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// What the farm owns.
    pub assets: Assets,
    /// What the farm owes.
    pub liabilities: Liabilities,
    /// What is left for the owner.
    pub equity: Equity,
}

impl BalanceSheet {
    /// Derive the balance sheet from current state.
    #[must_use]
    pub fn compute(
        grid: &FarmGrid,
        ledger: &PlayerLedger,
        market: &MarketEngine,
        rules: &EconomyRules,
    ) -> Self {
        let cash = ledger.cash;
        let stock_value = market.portfolio_value(&ledger.holdings);
        let land_value = rules.land_value(grid.size());
        let livestock_value = rules.livestock_head_value.times(grid.livestock_heads());
        let building_value = ledger.building_value;

        let assets = Assets {
            cash,
            stock_value,
            land_value,
            livestock_value,
            building_value,
            total: cash + stock_value + land_value + livestock_value + building_value,
        };

        let liabilities = Liabilities {
            loans: ledger.loans,
            unpaid_maintenance: ledger.unpaid_maintenance,
            yearly_tax_liability: ledger.yearly_tax_liability,
            total: ledger.loans + ledger.unpaid_maintenance + ledger.yearly_tax_liability,
        };

        Self {
            assets,
            liabilities,
            equity: Equity {
                net_worth: assets.total - liabilities.total,
            },
        }
    }

    /// Check the accounting identity and that totals match their parts.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let a = &self.assets;
        let l = &self.liabilities;
        a.total == a.cash + a.stock_value + a.land_value + a.livestock_value + a.building_value
            && l.total == l.loans + l.unpaid_maintenance + l.yearly_tax_liability
            && a.total - l.total == self.equity.net_worth
    }
}
