//! Event resolution and effect application.
//!
//! One event is drawn per year from a weighted catalog: the first entry whose
//! cumulative probability exceeds the draw fires. Probabilities need not sum
//! to one; a draw past the total means a quiet year.
//!
//! Effects of the chosen event are applied in [`EffectStage`](crate::data::EffectStage)
//! order, whatever order they were listed in.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{EconomyCatalog, EventCatalog, EventEffect, GameEvent, VisualCue};
use crate::grid::Occupant;
use crate::ledger::{EventSummary, PendingBribe};
use crate::math::{Fixed, Money};
use crate::random::RandomSource;
use crate::simulation::SimulationContext;

/// What applying an event actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectReport {
    /// Crop tiles cleared by a crop failure.
    pub crops_destroyed: u32,
    /// Crops whose failure was absorbed by insurance.
    pub crops_protected: Vec<String>,
    /// Livestock tiles cleared by an animal loss.
    pub livestock_lost: u32,
    /// Occupied tiles lost.
    pub tiles_lost: u32,
    /// Cash actually removed (after clamping).
    pub cash_lost: Money,
    /// Cash added.
    pub cash_gained: Money,
    /// Market impacts naming unknown instruments.
    pub unknown_instruments: Vec<String>,
    /// Whether a bribe decision is now pending.
    pub decision_pending: bool,
}

/// Weighted event catalog with resolution and validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSystem {
    catalog: EventCatalog,
}

impl EventSystem {
    /// Wrap a catalog.
    #[must_use]
    pub const fn new(catalog: EventCatalog) -> Self {
        Self { catalog }
    }

    /// The underlying catalog.
    #[must_use]
    pub const fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Event selected by a draw `r` in `[0, 1)`, if any.
    #[must_use]
    pub fn pick(&self, r: Fixed) -> Option<&GameEvent> {
        let mut cumulative = Fixed::ZERO;
        for event in self.catalog.events() {
            cumulative = cumulative.saturating_add(event.probability);
            if r < cumulative {
                return Some(event);
            }
        }
        None
    }

    /// Draw once and pick an event.
    pub fn resolve<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Option<&GameEvent> {
        let r = rng.next_unit();
        self.pick(r)
    }

    /// Find an event by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GameEvent> {
        self.catalog.get(id)
    }

    /// Check the catalog against an economy.
    ///
    /// Reports references to unknown crops, animals or instruments and a total
    /// probability above one. Returns an empty list if the catalog is sound.
    #[must_use]
    pub fn validate(&self, economy: &EconomyCatalog) -> Vec<String> {
        let mut problems = Vec::new();

        for event in self.catalog.events() {
            let id = &event.id;
            for effect in &event.effects {
                match effect {
                    EventEffect::CropFailure { crop, .. } if economy.crop(crop).is_none() => {
                        problems.push(format!("event '{id}': unknown crop '{crop}'"));
                    }
                    EventEffect::AnimalLoss(animals) => {
                        for animal in animals.iter().filter(|a| economy.animal(a).is_none()) {
                            problems.push(format!("event '{id}': unknown animal '{animal}'"));
                        }
                    }
                    EventEffect::SpecificMultipliers(values) => {
                        for asset in values
                            .keys()
                            .filter(|k| economy.crop(k).is_none() && economy.animal(k).is_none())
                        {
                            problems.push(format!("event '{id}': unknown asset '{asset}'"));
                        }
                    }
                    EventEffect::MarketImpact(values) => {
                        for instrument in values.keys().filter(|k| economy.instrument(k).is_none()) {
                            problems.push(format!("event '{id}': unknown instrument '{instrument}'"));
                        }
                    }
                    _ => {}
                }
            }
        }

        let total = self.catalog.total_probability();
        if total > Fixed::ONE {
            problems.push(format!("total event probability {total} exceeds 1"));
        }

        problems
    }
}

/// Short reference to an event.
#[must_use]
pub fn summarize(event: &GameEvent) -> EventSummary {
    EventSummary {
        id: event.id.clone(),
        name: event.name.clone(),
    }
}

/// Apply every effect of `event` to the simulation, in stage order.
pub fn apply_event(
    event: &GameEvent,
    ctx: &mut SimulationContext,
    catalog: &EconomyCatalog,
) -> EffectReport {
    let mut report = EffectReport::default();
    let mut ordered: Vec<&EventEffect> = event.effects.iter().collect();
    ordered.sort_by_key(|e| e.stage());

    for effect in ordered {
        apply_effect(effect, event, ctx, catalog, &mut report);
    }

    debug!(
        event = %event.id,
        crops_destroyed = report.crops_destroyed,
        livestock_lost = report.livestock_lost,
        tiles_lost = report.tiles_lost,
        "Event applied"
    );
    report
}

fn apply_effect(
    effect: &EventEffect,
    event: &GameEvent,
    ctx: &mut SimulationContext,
    catalog: &EconomyCatalog,
    report: &mut EffectReport,
) {
    let ledger = &mut ctx.ledger;
    match effect {
        EventEffect::Visual(cue) => match cue {
            VisualCue::Drought => ledger.drought = true,
            VisualCue::Rain | VisualCue::Sunshine => ledger.drought = false,
            VisualCue::Other(_) => {}
        },
        EventEffect::CropYield(value) => ledger.modifiers.crop_yield = *value,
        EventEffect::SellPrice(value) => ledger.modifiers.sell_price = *value,
        EventEffect::LivestockYield(value) => ledger.modifiers.livestock = *value,
        EventEffect::CropFailure {
            crop,
            insurance_protected,
        } => {
            if !*insurance_protected {
                debug!(event = %event.id, %crop, "Crop failure without insurance gate ignored");
            } else if ledger.is_insured() {
                ledger.modifiers.specific.insert(crop.clone(), Fixed::ONE);
                report.crops_protected.push(crop.clone());
            } else {
                let cleared = ctx.grid.clear_matching(
                    |o| matches!(o, Occupant::Crop { crop: c } if c == crop),
                );
                report.crops_destroyed += cleared.len() as u32;
            }
        }
        EventEffect::AnimalLoss(animals) => {
            let cleared = ctx.grid.clear_matching(
                |o| matches!(o, Occupant::Livestock { animal, .. } if animals.contains(animal)),
            );
            report.livestock_lost += cleared.len() as u32;
        }
        EventEffect::SpecificMultipliers(values) => {
            for (asset, multiplier) in values {
                ledger.modifiers.specific.insert(asset.clone(), *multiplier);
            }
        }
        EventEffect::Integrity(delta) => ledger.adjust_integrity(*delta),
        EventEffect::CashLoss(amount) => report.cash_lost += ledger.deduct(*amount),
        EventEffect::CashGain(amount) => {
            ledger.credit(*amount);
            report.cash_gained += *amount;
        }
        EventEffect::TilesLost(count) => {
            let removed = ctx.grid.remove_first_occupied(*count);
            for occupant in &removed {
                if matches!(occupant, Occupant::Structure { .. }) {
                    ledger.write_down_buildings(occupant.base_value(catalog));
                }
            }
            report.tiles_lost += removed.len() as u32;
        }
        EventEffect::MarketImpact(impacts) => {
            report
                .unknown_instruments
                .extend(ctx.market.apply_event_impacts(impacts));
        }
        EventEffect::Bribe {
            pay,
            refuse_integrity,
        } => {
            ledger.pending_bribe = Some(PendingBribe {
                event_id: event.id.clone(),
                pay: *pay,
                refuse_integrity: *refuse_integrity,
            });
            report.decision_pending = true;
        }
    }
}
