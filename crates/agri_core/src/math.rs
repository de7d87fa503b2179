//! Fixed-point and money arithmetic for deterministic simulation.
//!
//! Simulation state never holds floating-point values. Multipliers, rates and
//! the integrity score use [`Fixed`]; cash and prices use [`Money`], an integer
//! count of cents. Decimal numbers coming from data files are converted once at
//! load time.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Build a fixed-point rate from a whole percentage (`percent(8)` is 0.08).
#[must_use]
pub fn percent(value: i32) -> Fixed {
    Fixed::from_num(value) / Fixed::from_num(100)
}

/// Build a fixed-point value from a ratio of integers.
#[must_use]
pub fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

/// Convert a decimal read from a data file into [`Fixed`].
///
/// Returns `None` for NaN, infinities and values outside the fixed range.
#[must_use]
pub fn decimal(value: f64) -> Option<Fixed> {
    if value.is_finite() {
        Fixed::checked_from_num(value)
    } else {
        None
    }
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for `BTreeMap<String, Fixed>` via raw bit representations.
pub mod fixed_map_serde {
    use std::collections::BTreeMap;

    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize every value as its raw bits.
    pub fn serialize<S>(value: &BTreeMap<String, Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bits: BTreeMap<&str, i64> = value
            .iter()
            .map(|(key, v)| (key.as_str(), v.to_bits()))
            .collect();
        bits.serialize(serializer)
    }

    /// Deserialize a map of raw bits.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = BTreeMap::<String, i64>::deserialize(deserializer)?;
        Ok(bits
            .into_iter()
            .map(|(key, v)| (key, Fixed::from_bits(v)))
            .collect())
    }
}

/// A number as written by a human: either an integer or a decimal.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Numeral {
    Whole(i64),
    Decimal(f64),
}

impl Numeral {
    fn as_f64(self) -> f64 {
        match self {
            Self::Whole(v) => v as f64,
            Self::Decimal(v) => v,
        }
    }
}

/// Serde support for human-written decimals in data files.
///
/// `0.08` in a RON file becomes the closest [`Fixed`] value.
pub mod decimal_serde {
    use super::{decimal, Fixed, Numeral};
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a decimal into a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Numeral::deserialize(deserializer)?.as_f64();
        decimal(raw).ok_or_else(|| D::Error::custom(format!("decimal out of range: {raw}")))
    }
}

/// Serde support for dollar amounts in data files.
pub mod dollars_serde {
    use super::{Money, Numeral};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize money as dollars.
    pub fn serialize<S>(value: &Money, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.cents() % 100 == 0 {
            value.whole_dollars().serialize(serializer)
        } else {
            (value.cents() as f64 / 100.0).serialize(serializer)
        }
    }

    /// Deserialize dollars into cents, rounding to the nearest cent.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Numeral::deserialize(deserializer)? {
            Numeral::Whole(dollars) => Money::from_dollars(dollars),
            Numeral::Decimal(dollars) => Money::from_cents((dollars * 100.0).round() as i64),
        })
    }
}

/// Convert a decimal dollar amount read from a data file into [`Money`].
#[must_use]
pub fn dollars(value: f64) -> Money {
    Money::from_cents((value * 100.0).round() as i64)
}

/// An amount of money in whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero money.
    pub const ZERO: Self = Self(0);

    /// Create an amount from whole dollars.
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Create an amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Raw cent count.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whole-dollar part (truncated toward zero).
    #[must_use]
    pub const fn whole_dollars(self) -> i64 {
        self.0 / 100
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply by a fixed-point factor, rounding half away from zero to the cent.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        let product = i128::from(self.0) * i128::from(factor.to_bits());
        let half = 1i128 << (Fixed::FRAC_NBITS - 1);
        let rounded = if product >= 0 {
            (product + half) >> Fixed::FRAC_NBITS
        } else {
            -((-product + half) >> Fixed::FRAC_NBITS)
        };
        Self(saturate_i128(rounded))
    }

    /// Multiply by an integer quantity.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Subtract `rhs`, never going below zero.
    #[must_use]
    pub fn deduct(self, rhs: Self) -> Self {
        (self - rhs).floor_zero()
    }

    /// Clamp negative amounts to zero.
    #[must_use]
    pub fn floor_zero(self) -> Self {
        self.max(Self::ZERO)
    }

    /// Multiply by a fixed-point factor and round once, straight to the
    /// dollar (half away from zero).
    #[must_use]
    pub fn scale_to_dollar(self, factor: Fixed) -> Self {
        let product = i128::from(self.0) * i128::from(factor.to_bits());
        let unit = 100i128 << Fixed::FRAC_NBITS;
        let dollars = if product >= 0 {
            (product + unit / 2) / unit
        } else {
            -((-product + unit / 2) / unit)
        };
        Self(saturate_i128(dollars.saturating_mul(100)))
    }

    /// Round to the nearest whole dollar, half away from zero.
    #[must_use]
    pub const fn round_to_dollar(self) -> Self {
        let rem = self.0 % 100;
        let base = self.0 - rem;
        if rem >= 50 {
            Self(base + 100)
        } else if rem <= -50 {
            Self(base - 100)
        } else {
            Self(base)
        }
    }
}

fn saturate_i128(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value > 0 { i64::MAX } else { i64::MIN })
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = (abs / 100).to_string();
        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}${grouped}.{:02}", abs % 100)
    }
}
