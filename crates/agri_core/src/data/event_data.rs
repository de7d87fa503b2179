//! Random event definitions.
//!
//! The event catalog is a JSON array of sparse records. Each record is turned
//! into a [`GameEvent`] whose effects are an ordered list of [`EventEffect`]
//! variants, sorted by [`EffectStage`] so that application order never depends
//! on how the file was written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal, dollars, fixed_map_serde, fixed_serde, Fixed, Money};

/// Broad category of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Natural or man-made disaster.
    Disaster,
    /// Good fortune.
    Fortune,
    /// Market shock.
    Market,
    /// Weather change.
    Weather,
    /// Bribe demand requiring a player decision.
    Corruption,
    /// Any other category.
    #[serde(other)]
    Other,
}

/// Visual hint carried by an event. Drought-related cues also drive state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualCue {
    /// Starts a drought that lasts until irrigated or rained out.
    Drought,
    /// Ends any drought.
    Rain,
    /// Ends any drought.
    Sunshine,
    /// Purely cosmetic cue.
    Other(String),
}

impl VisualCue {
    fn parse(raw: &str) -> Self {
        match raw {
            "drought" => Self::Drought,
            "rain" => Self::Rain,
            "sunshine" => Self::Sunshine,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Position of an effect in the application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EffectStage {
    /// Visual cue and drought flag.
    Visual,
    /// Yield, price and livestock multipliers.
    Multipliers,
    /// Insurance-gated crop failure.
    CropFailure,
    /// Animal loss.
    AnimalLoss,
    /// Per-asset multiplier overrides.
    SpecificOverride,
    /// Integrity delta.
    Integrity,
    /// Cash loss and gain.
    Cash,
    /// Tile loss.
    TileLoss,
    /// Market impact.
    Market,
    /// Pending player decision.
    Decision,
}

/// A single effect of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventEffect {
    /// Visual hint (and drought flag).
    Visual(VisualCue),
    /// Sets the crop yield multiplier for this harvest.
    CropYield(#[serde(with = "fixed_serde")] Fixed),
    /// Sets the sell price (market factor) multiplier for this harvest.
    SellPrice(#[serde(with = "fixed_serde")] Fixed),
    /// Sets the livestock yield multiplier for this harvest.
    LivestockYield(#[serde(with = "fixed_serde")] Fixed),
    /// Destroys every tile of a crop unless insurance covers it.
    CropFailure {
        /// Crop ID that fails.
        crop: String,
        /// Gate for the whole effect: unset means the failure does nothing;
        /// set means active insurance neutralizes it and no insurance clears
        /// the crop.
        insurance_protected: bool,
    },
    /// Removes every livestock tile holding one of these animals.
    AnimalLoss(Vec<String>),
    /// Per-asset multipliers for this harvest.
    SpecificMultipliers(#[serde(with = "fixed_map_serde")] BTreeMap<String, Fixed>),
    /// Integrity delta.
    Integrity(#[serde(with = "fixed_serde")] Fixed),
    /// Cash removed (floored at zero).
    CashLoss(Money),
    /// Cash added.
    CashGain(Money),
    /// Number of occupied tiles lost, in grid order.
    TilesLost(u32),
    /// Instrument ID to price multiplier.
    MarketImpact(#[serde(with = "fixed_map_serde")] BTreeMap<String, Fixed>),
    /// Bribe demand: pay, or refuse and lose integrity.
    Bribe {
        /// Amount paid when accepting.
        pay: Money,
        /// Integrity delta when refusing (usually negative).
        #[serde(with = "fixed_serde")]
        refuse_integrity: Fixed,
    },
}

impl EventEffect {
    /// Where this effect sits in the application order.
    #[must_use]
    pub const fn stage(&self) -> EffectStage {
        match self {
            Self::Visual(_) => EffectStage::Visual,
            Self::CropYield(_) | Self::SellPrice(_) | Self::LivestockYield(_) => {
                EffectStage::Multipliers
            }
            Self::CropFailure { .. } => EffectStage::CropFailure,
            Self::AnimalLoss(_) => EffectStage::AnimalLoss,
            Self::SpecificMultipliers(_) => EffectStage::SpecificOverride,
            Self::Integrity(_) => EffectStage::Integrity,
            Self::CashLoss(_) | Self::CashGain(_) => EffectStage::Cash,
            Self::TilesLost(_) => EffectStage::TileLoss,
            Self::MarketImpact(_) => EffectStage::Market,
            Self::Bribe { .. } => EffectStage::Decision,
        }
    }
}

/// Immutable catalog entry for a random event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Unique string identifier.
    pub id: String,
    /// Category.
    pub kind: EventKind,
    /// Display name.
    pub name: String,
    /// Flavor text.
    pub description: String,
    /// Chance of firing in a given year.
    #[serde(with = "fixed_serde")]
    pub probability: Fixed,
    /// Effects in application order.
    pub effects: Vec<EventEffect>,
}

impl GameEvent {
    /// Iterate over effects belonging to one stage.
    pub fn effects_in(&self, stage: EffectStage) -> impl Iterator<Item = &EventEffect> {
        self.effects.iter().filter(move |e| e.stage() == stage)
    }

    /// Whether this event asks the player for a decision.
    #[must_use]
    pub fn requires_decision(&self) -> bool {
        self.effects_in(EffectStage::Decision).next().is_some()
    }
}

/// The event catalog; order defines cumulative resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCatalog {
    events: Vec<GameEvent>,
}

impl EventCatalog {
    /// Build a catalog from already-parsed events.
    #[must_use]
    pub fn new(events: Vec<GameEvent>) -> Self {
        Self { events }
    }

    /// An empty catalog: no event ever fires.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the JSON event array.
    ///
    /// `source` names the document in error messages.
    pub fn from_json_str(text: &str, source: &str) -> Result<Self> {
        let parse_error = |message: String| GameError::DataParseError {
            path: source.to_string(),
            message,
        };
        let raw: Vec<RawEvent> = serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;
        let events = raw
            .into_iter()
            .map(|event| event.into_event().map_err(&parse_error))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { events })
    }

    /// All events in resolution order.
    #[must_use]
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Find an event by its ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GameEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of all event probabilities.
    #[must_use]
    pub fn total_probability(&self) -> Fixed {
        self.events.iter().map(|e| e.probability).sum()
    }
}

/// Event record as written in the JSON file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    kind: EventKind,
    name: String,
    #[serde(default)]
    description: String,
    probability: f64,
    #[serde(default)]
    effects: RawEffects,
}

/// Sparse effect record as written in the JSON file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEffects {
    visual_feedback: Option<String>,
    crop_yield_multiplier: Option<f64>,
    sell_price_multiplier: Option<f64>,
    livestock_multiplier: Option<f64>,
    crop_failure: Option<String>,
    #[serde(default)]
    insurance_protected: bool,
    animal_loss: Option<Vec<String>>,
    specific_crop_multiplier: Option<BTreeMap<String, f64>>,
    integrity: Option<f64>,
    cash_loss: Option<f64>,
    cash_gain: Option<f64>,
    tiles_lost: Option<u32>,
    market_impact: Option<BTreeMap<String, f64>>,
    pay_amount: Option<f64>,
    refuse_integrity_loss: Option<f64>,
}

impl RawEvent {
    fn into_event(self) -> std::result::Result<GameEvent, String> {
        let id = self.id;
        let number = |field: &str, value: f64| {
            decimal(value).ok_or_else(|| format!("event '{id}': {field} out of range ({value})"))
        };
        let map = |field: &str, values: BTreeMap<String, f64>| {
            values
                .into_iter()
                .map(|(key, v)| number(field, v).map(|f| (key, f)))
                .collect::<std::result::Result<BTreeMap<_, _>, _>>()
        };

        let probability = number("probability", self.probability)?;
        if probability < Fixed::ZERO {
            return Err(format!("event '{id}': negative probability"));
        }

        let raw = self.effects;
        let mut effects = Vec::new();
        if let Some(cue) = raw.visual_feedback {
            effects.push(EventEffect::Visual(VisualCue::parse(&cue)));
        }
        if let Some(v) = raw.crop_yield_multiplier {
            effects.push(EventEffect::CropYield(number("cropYieldMultiplier", v)?));
        }
        if let Some(v) = raw.sell_price_multiplier {
            effects.push(EventEffect::SellPrice(number("sellPriceMultiplier", v)?));
        }
        if let Some(v) = raw.livestock_multiplier {
            effects.push(EventEffect::LivestockYield(number("livestockMultiplier", v)?));
        }
        if let Some(crop) = raw.crop_failure {
            effects.push(EventEffect::CropFailure {
                crop,
                insurance_protected: raw.insurance_protected,
            });
        }
        if let Some(animals) = raw.animal_loss {
            effects.push(EventEffect::AnimalLoss(animals));
        }
        if let Some(values) = raw.specific_crop_multiplier {
            effects.push(EventEffect::SpecificMultipliers(map("specificCropMultiplier", values)?));
        }
        if let Some(v) = raw.integrity {
            effects.push(EventEffect::Integrity(number("integrity", v)?));
        }
        if let Some(v) = raw.cash_loss {
            effects.push(EventEffect::CashLoss(dollars(v).floor_zero()));
        }
        if let Some(v) = raw.cash_gain {
            effects.push(EventEffect::CashGain(dollars(v).floor_zero()));
        }
        if let Some(count) = raw.tiles_lost {
            effects.push(EventEffect::TilesLost(count));
        }
        if let Some(values) = raw.market_impact {
            effects.push(EventEffect::MarketImpact(map("marketImpact", values)?));
        }
        if let Some(pay) = raw.pay_amount {
            let refuse = raw.refuse_integrity_loss.unwrap_or_default();
            effects.push(EventEffect::Bribe {
                pay: dollars(pay).floor_zero(),
                refuse_integrity: number("refuseIntegrityLoss", refuse)?,
            });
        }
        effects.sort_by_key(EventEffect::stage);

        Ok(GameEvent {
            id,
            kind: self.kind,
            name: self.name,
            description: self.description,
            probability,
            effects,
        })
    }
}
