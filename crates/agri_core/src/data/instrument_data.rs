//! Tradable instrument definitions.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, dollars_serde, ratio, Fixed, Money};

/// Instrument class; decides the random-walk bias and mean-reversion strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentClass {
    /// Safe-haven commodity (gold): slight upward drift.
    SafeHaven,
    /// Currency: neutral drift, strong pull back to base.
    Currency,
    /// Equity: neutral drift, weak pull so trends persist.
    Equity,
}

impl InstrumentClass {
    /// Centre of the uniform shock; draws below it push the price down.
    #[must_use]
    pub fn bias(self) -> Fixed {
        match self {
            Self::SafeHaven => ratio(45, 100),
            Self::Currency | Self::Equity => ratio(1, 2),
        }
    }

    /// Fraction of the gap to the base price closed each step.
    #[must_use]
    pub fn reversion_strength(self) -> Fixed {
        match self {
            Self::SafeHaven => ratio(2, 100),
            Self::Currency => ratio(5, 100),
            Self::Equity => ratio(1, 100),
        }
    }
}

/// Data-driven instrument definition.
///
/// # Example RON
///
/// ```ron
/// (
///     id: "gold",
///     name: "Gold",
///     symbol: "XAU",
///     class: SafeHaven,
///     base_price: 8000,
///     volatility: 0.03,
///     floor: 5000,
///     ceiling: 12000,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentData {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Ticker symbol.
    pub symbol: String,

    /// Instrument class.
    pub class: InstrumentClass,

    /// Starting price and mean-reversion anchor.
    #[serde(with = "dollars_serde")]
    pub base_price: Money,

    /// Maximum fractional move per random-walk step.
    #[serde(with = "decimal_serde")]
    pub volatility: Fixed,

    /// Lowest price the random walk may reach.
    #[serde(with = "dollars_serde")]
    pub floor: Money,

    /// Highest price the random walk may reach.
    #[serde(with = "dollars_serde")]
    pub ceiling: Money,
}
