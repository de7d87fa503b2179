//! Market engine: tradable instruments with bounded random-walk prices.
//!
//! # Price dynamics
//!
//! Each step draws `u` in `[0, 1)` per instrument, in catalog order:
//!
//! ```text
//! shocked  = price × (1 + (u − bias) × 2 × volatility)
//! reverted = shocked + (base − shocked) × reversion
//! price    = clamp(round_to_dollar(reverted), floor, ceiling)
//! ```
//!
//! Event impacts multiply the price directly and use the global safety bound
//! instead of the per-instrument one. Trading never mutates the market: `buy`
//! and `sell` return a [`TradeQuote`] for the caller to settle.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::data::{EconomyRules, InstrumentClass, InstrumentData};
use crate::error::{GameError, Result};
use crate::math::{fixed_serde, Fixed, Money};
use crate::random::RandomSource;

/// Live state of one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketAsset {
    /// Instrument ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Class deciding bias and reversion.
    pub class: InstrumentClass,
    /// Price right now.
    pub current_price: Money,
    /// Mean-reversion anchor.
    pub base_price: Money,
    /// Maximum fractional move per step.
    #[serde(with = "fixed_serde")]
    pub volatility: Fixed,
    /// Random-walk lower bound.
    pub floor: Money,
    /// Random-walk upper bound.
    pub ceiling: Money,
    /// Recent prices, oldest first, current last.
    pub history: VecDeque<Money>,
}

impl MarketAsset {
    fn from_data(data: &InstrumentData) -> Self {
        Self {
            id: data.id.clone(),
            name: data.name.clone(),
            symbol: data.symbol.clone(),
            class: data.class,
            current_price: data.base_price,
            base_price: data.base_price,
            volatility: data.volatility,
            floor: data.floor,
            ceiling: data.ceiling,
            history: VecDeque::from([data.base_price]),
        }
    }

    fn record(&mut self, price: Money, capacity: usize) {
        self.current_price = price;
        self.history.push_back(price);
        while self.history.len() > capacity.max(1) {
            self.history.pop_front();
        }
    }

    /// Price before the most recent change, if any.
    #[must_use]
    pub fn previous_price(&self) -> Option<Money> {
        let len = self.history.len();
        (len >= 2).then(|| self.history[len - 2])
    }
}

/// Price quote for a validated trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeQuote {
    /// Instrument ID.
    pub instrument: String,
    /// Units traded.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Money,
    /// Cost of a buy or proceeds of a sell.
    pub total: Money,
}

/// All tradable instruments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketEngine {
    assets: Vec<MarketAsset>,
    history_len: usize,
    event_floor: Money,
    event_ceiling: Money,
}

impl MarketEngine {
    /// Open a market at base prices.
    #[must_use]
    pub fn new(instruments: &[InstrumentData], rules: &EconomyRules) -> Self {
        Self {
            assets: instruments.iter().map(MarketAsset::from_data).collect(),
            history_len: rules.price_history_len,
            event_floor: rules.event_price_floor,
            event_ceiling: rules.event_price_ceiling,
        }
    }

    /// All instruments in catalog order.
    #[must_use]
    pub fn assets(&self) -> &[MarketAsset] {
        &self.assets
    }

    /// Find an instrument by ID.
    #[must_use]
    pub fn asset(&self, id: &str) -> Option<&MarketAsset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Current price of an instrument.
    #[must_use]
    pub fn price(&self, id: &str) -> Option<Money> {
        self.asset(id).map(|a| a.current_price)
    }

    /// Advance every price by one random-walk step.
    ///
    /// Draws exactly one value per instrument, in catalog order.
    pub fn step_random_walk<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        let two = Fixed::from_num(2);
        for asset in &mut self.assets {
            let u = rng.next_unit();
            let shock = Fixed::ONE + (u - asset.class.bias()) * two * asset.volatility;
            let shocked = asset.current_price.scale(shock);
            let pull = (asset.base_price - shocked).scale(asset.class.reversion_strength());
            let next = (shocked + pull)
                .round_to_dollar()
                .clamp(asset.floor, asset.ceiling);
            asset.record(next, self.history_len);
        }
        tracing::trace!(
            prices = ?self.assets.iter().map(|a| a.current_price.cents()).collect::<Vec<_>>(),
            "Market step"
        );
    }

    /// Multiply prices by event impacts.
    ///
    /// Returns the IDs in `impacts` that name no instrument; those are skipped.
    pub fn apply_event_impacts(&mut self, impacts: &BTreeMap<String, Fixed>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (id, multiplier) in impacts {
            let Some(asset) = self.assets.iter_mut().find(|a| &a.id == id) else {
                tracing::warn!(instrument = %id, "Event impact on unknown instrument");
                unknown.push(id.clone());
                continue;
            };
            let next = asset
                .current_price
                .scale(*multiplier)
                .clamp(self.event_floor, self.event_ceiling);
            asset.record(next, self.history_len);
        }
        unknown
    }

    /// Quote a purchase without executing it.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidQuantity`], [`GameError::UnknownInstrument`], or
    /// [`GameError::InsufficientFunds`] when the cost exceeds `available`.
    pub fn buy(&self, id: &str, quantity: u32, available: Money) -> Result<TradeQuote> {
        let quote = self.quote(id, quantity)?;
        if quote.total > available {
            return Err(GameError::insufficient_funds(quote.total, available));
        }
        Ok(quote)
    }

    /// Quote a sale without executing it.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidQuantity`], [`GameError::UnknownInstrument`], or
    /// [`GameError::InsufficientHoldings`] when `quantity` exceeds `held`.
    pub fn sell(&self, id: &str, quantity: u32, held: u32) -> Result<TradeQuote> {
        let quote = self.quote(id, quantity)?;
        if quantity > held {
            return Err(GameError::InsufficientHoldings {
                instrument: id.to_string(),
                requested: quantity,
                held,
            });
        }
        Ok(quote)
    }

    fn quote(&self, id: &str, quantity: u32) -> Result<TradeQuote> {
        if quantity == 0 {
            return Err(GameError::InvalidQuantity(quantity));
        }
        let unit_price = self
            .price(id)
            .ok_or_else(|| GameError::UnknownInstrument(id.to_string()))?;
        Ok(TradeQuote {
            instrument: id.to_string(),
            quantity,
            unit_price,
            total: unit_price.times(quantity),
        })
    }

    /// Market value of a set of holdings. Unknown instruments count as zero.
    #[must_use]
    pub fn portfolio_value(&self, holdings: &BTreeMap<String, u32>) -> Money {
        holdings
            .iter()
            .filter_map(|(id, qty)| self.price(id).map(|p| p.times(*qty)))
            .sum()
    }

    /// Percent change of the latest price versus the one before it.
    ///
    /// Zero when there is no earlier price; `None` for unknown instruments.
    #[must_use]
    pub fn price_change_percent(&self, id: &str) -> Option<Fixed> {
        let asset = self.asset(id)?;
        let Some(previous) = asset.previous_price().filter(|p| p.cents() > 0) else {
            return Some(Fixed::ZERO);
        };
        let delta = Fixed::saturating_from_num(asset.current_price.cents() - previous.cents());
        let base = Fixed::saturating_from_num(previous.cents());
        Some(delta / base * Fixed::from_num(100))
    }

    /// Return every instrument to its base price with a one-entry history.
    pub fn reset(&mut self) {
        for asset in &mut self.assets {
            asset.current_price = asset.base_price;
            asset.history = VecDeque::from([asset.base_price]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EconomyCatalog;
    use crate::math::{percent, ratio};
    use crate::random::ScriptedRandom;

    fn market() -> MarketEngine {
        let catalog = EconomyCatalog::builtin().unwrap();
        MarketEngine::new(&catalog.instruments, &catalog.rules)
    }

    #[test]
    fn test_opens_at_base_prices() {
        let market = market();
        assert_eq!(market.assets().len(), 3);
        assert_eq!(market.price("gold"), Some(Money::from_dollars(8000)));
        assert_eq!(market.price("usd"), Some(Money::from_dollars(2500)));
        assert_eq!(market.price("stocks"), Some(Money::from_dollars(5000)));
        assert_eq!(market.asset("gold").unwrap().history.len(), 1);
    }

    #[test]
    fn test_buy_quotes() {
        let market = market();
        let quote = market.buy("gold", 2, Money::from_dollars(20_000)).unwrap();
        assert_eq!(quote.total, Money::from_dollars(16_000));
        assert_eq!(quote.unit_price, Money::from_dollars(8000));

        let err = market.buy("gold", 2, Money::from_dollars(10_000)).unwrap_err();
        assert_eq!(
            err,
            GameError::insufficient_funds(Money::from_dollars(16_000), Money::from_dollars(10_000))
        );
        assert_eq!(
            market.buy("bitcoin", 1, Money::from_dollars(1)).unwrap_err(),
            GameError::UnknownInstrument("bitcoin".to_string())
        );
        assert_eq!(
            market.buy("gold", 0, Money::from_dollars(1)).unwrap_err(),
            GameError::InvalidQuantity(0)
        );
    }

    #[test]
    fn test_sell_checks_holdings() {
        let market = market();
        let quote = market.sell("usd", 2, 3).unwrap();
        assert_eq!(quote.total, Money::from_dollars(5000));
        let err = market.sell("usd", 4, 3).unwrap_err();
        assert!(matches!(err, GameError::InsufficientHoldings { requested: 4, held: 3, .. }));
    }

    #[test]
    fn test_neutral_draw_keeps_currency_at_base() {
        let mut market = market();
        let mut rng = ScriptedRandom::constant(ratio(1, 2));
        market.step_random_walk(&mut rng);
        assert_eq!(market.price("usd"), Some(Money::from_dollars(2500)));
        assert_eq!(market.price("stocks"), Some(Money::from_dollars(5000)));
        // Gold is biased upward at u = 0.5: 8000 × 1.003 = 8024, pulled back 2%.
        assert_eq!(market.price("gold"), Some(Money::from_dollars(8024)));
        assert_eq!(rng.drawn(), 3);
    }

    #[test]
    fn test_random_walk_respects_bounds() {
        let mut market = market();
        let mut high = ScriptedRandom::constant(Fixed::ONE - Fixed::DELTA);
        for _ in 0..500 {
            market.step_random_walk(&mut high);
        }
        for asset in market.assets() {
            assert!(asset.current_price <= asset.ceiling, "{}", asset.id);
            assert!(asset.history.len() <= 10);
        }

        let mut low = ScriptedRandom::constant(Fixed::ZERO);
        for _ in 0..500 {
            market.step_random_walk(&mut low);
        }
        for asset in market.assets() {
            assert!(asset.current_price >= asset.floor, "{}", asset.id);
        }
    }

    #[test]
    fn test_event_impacts_and_change_percent() {
        let mut market = market();
        let mut impacts = BTreeMap::new();
        impacts.insert("stocks".to_string(), percent(70));
        impacts.insert("oil".to_string(), percent(200));
        let unknown = market.apply_event_impacts(&impacts);
        assert_eq!(unknown, vec!["oil".to_string()]);
        assert_eq!(market.price("stocks"), Some(Money::from_dollars(3500)));
        let change = market.price_change_percent("stocks").unwrap();
        assert!((change + Fixed::from_num(30)).abs() < ratio(1, 1000), "{change}");
        assert_eq!(market.price_change_percent("gold"), Some(Fixed::ZERO));
        assert_eq!(market.price_change_percent("oil"), None);
    }

    #[test]
    fn test_event_impact_uses_global_bound() {
        let mut market = market();
        let mut impacts = BTreeMap::new();
        impacts.insert("gold".to_string(), Fixed::from_num(3));
        market.apply_event_impacts(&impacts);
        assert_eq!(market.price("gold"), Some(Money::from_dollars(10_000)));
    }

    #[test]
    fn test_portfolio_value_and_reset() {
        let mut market = market();
        let mut holdings = BTreeMap::new();
        holdings.insert("gold".to_string(), 1);
        holdings.insert("usd".to_string(), 2);
        holdings.insert("delisted".to_string(), 9);
        assert_eq!(market.portfolio_value(&holdings), Money::from_dollars(13_000));

        market.step_random_walk(&mut ScriptedRandom::constant(Fixed::ZERO));
        market.reset();
        assert_eq!(market.price("gold"), Some(Money::from_dollars(8000)));
        assert_eq!(market.asset("gold").unwrap().history.len(), 1);
    }
}
