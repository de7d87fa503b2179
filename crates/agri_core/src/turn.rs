//! Year-end turn processor.
//!
//! A turn runs eight stages in a fixed order against one
//! [`SimulationContext`]:
//!
//! 1. Event roll (and forecast, with a comms structure)
//! 2. Depreciation of integrity and building value
//! 3. Property tax
//! 4. Interest on the post-tax balance
//! 5. Harvest
//! 6. Integrity bonus for a profitable year
//! 7. Annual insurance renewal
//! 8. Market random walk
//!
//! The whole pipeline completes or it does not start: the only refusal is
//! [`GameError::GameOver`], checked before any state is touched.
//!
//! # Randomness
//!
//! Draws happen in this order and nowhere else: the event draw (skipped when
//! last year's forecast is used), the forecast draw (only with a comms
//! structure), then one draw per instrument in the market step.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::balance::BalanceSheet;
use crate::data::{EconomyCatalog, StructureClass};
use crate::error::{GameError, Result};
use crate::events::{apply_event, summarize, EffectReport, EventSystem};
use crate::grid::Occupant;
use crate::ledger::{EventSummary, InsuranceKind, YearRecord};
use crate::math::{Fixed, Money};
use crate::random::RandomSource;
use crate::simulation::{Forecast, SimulationContext};

/// Income and costs of the harvest stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HarvestReport {
    /// Revenue from crop tiles.
    pub crop_income: Money,
    /// Revenue from livestock tiles.
    pub livestock_income: Money,
    /// Crop tiles harvested (and cleared).
    pub crops_harvested: u32,
    /// Tractor fuel charged.
    pub fuel_cost: Money,
    /// Whether an unirrigated drought cut crop income.
    pub drought_penalized: bool,
}

impl HarvestReport {
    /// Crop plus livestock income.
    #[must_use]
    pub fn income(&self) -> Money {
        self.crop_income + self.livestock_income
    }
}

/// Everything that happened during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Year that closed.
    pub year: u32,
    /// Event that fired, if any.
    pub event: Option<EventSummary>,
    /// What the event changed.
    pub effects: EffectReport,
    /// Forecast for next year, when a comms structure stands.
    pub forecast: Option<Forecast>,
    /// Property tax assessed.
    pub property_tax: Money,
    /// Interest earned.
    pub interest: Money,
    /// Harvest results.
    pub harvest: HarvestReport,
    /// Whether the profitable-year bonus was granted.
    pub integrity_bonus: bool,
    /// Annual insurance premium charged.
    pub insurance_fee: Money,
    /// Record appended to the ledger history.
    pub record: YearRecord,
}

/// Run one complete year-end pipeline.
///
/// # Errors
///
/// [`GameError::GameOver`] if the game already ended or integrity is
/// exhausted at the start of the turn. Nothing is mutated in that case
/// except the terminal game-over flag.
pub fn process_turn<R: RandomSource + ?Sized>(
    ctx: &mut SimulationContext,
    catalog: &EconomyCatalog,
    events: &EventSystem,
    rng: &mut R,
) -> Result<TurnReport> {
    if ctx.game_over || ctx.ledger.is_bankrupt_of_integrity() {
        ctx.game_over = true;
        warn!(year = ctx.year, "Turn refused: game over");
        return Err(GameError::GameOver);
    }

    let rules = &catalog.rules;
    let year = ctx.year;
    let opening_cash = ctx.ledger.cash;
    if ctx.ledger.pending_bribe.take().is_some() {
        debug!(year, "Unanswered bribe lapsed");
    }

    // 1. Event roll
    let event = match ctx.forecast.take() {
        Some(forecast) => forecast.event.and_then(|e| events.get(&e.id)),
        None => events.resolve(rng),
    };
    let effects = event
        .map(|e| apply_event(e, ctx, catalog))
        .unwrap_or_default();
    if ctx.grid.has_structure_class(StructureClass::Comms, catalog) {
        let next = events.resolve(rng);
        ctx.forecast = Some(Forecast {
            event: next.map(summarize),
        });
    }
    debug!(year, event = ?event.map(|e| e.id.as_str()), "Stage 1: event roll");

    // 2. Depreciation
    let factor = if ctx.grid.has_structure_class(StructureClass::Storage, catalog) {
        rules.depreciation_with_storage
    } else {
        rules.depreciation_without_storage
    };
    ctx.ledger.scale_integrity(factor);
    ctx.ledger.building_value = ctx.ledger.building_value.scale(factor).floor_zero();
    debug!(year, factor = %factor, integrity = %ctx.ledger.integrity, "Stage 2: depreciation");

    // 3. Property tax
    let property_tax = rules.property_tax(ctx.grid.size());
    ctx.ledger.deduct(property_tax);
    ctx.ledger.yearly_tax_liability = property_tax;
    debug!(year, tax = %property_tax, "Stage 3: property tax");

    // 4. Interest
    let interest = ctx.ledger.cash.scale(rules.interest_rate);
    ctx.ledger.credit(interest);
    debug!(year, interest = %interest, "Stage 4: interest");

    // 5. Harvest
    let harvest = run_harvest(ctx, catalog);
    debug!(
        year,
        income = %harvest.income(),
        fuel = %harvest.fuel_cost,
        drought = harvest.drought_penalized,
        "Stage 5: harvest"
    );

    // 6. Integrity bonus, judged against cash before the event.
    let integrity_bonus = ctx.ledger.cash > opening_cash;
    if integrity_bonus {
        ctx.ledger.adjust_integrity(rules.integrity_profit_bonus);
    }

    // 7. Insurance renewal
    let mut insurance_fee = Money::ZERO;
    if ctx.ledger.insurance.kind == InsuranceKind::Annual {
        insurance_fee = ctx.ledger.deduct(rules.annual_insurance_cost);
        ctx.ledger.insurance.active = true;
    }

    // 8. Market fluctuation
    ctx.market.step_random_walk(rng);

    let balance_sheet =
        BalanceSheet::compute(&ctx.grid, &ctx.ledger, &ctx.market, rules);
    let record = YearRecord {
        year,
        balance_sheet,
        event: event.map(summarize),
        revenue: harvest.income() + interest,
        expenses: property_tax + harvest.fuel_cost,
    };
    ctx.ledger.history.push(record.clone());
    ctx.year += 1;

    info!(
        year,
        cash = %ctx.ledger.cash,
        integrity = %ctx.ledger.integrity,
        net_worth = %balance_sheet.equity.net_worth,
        "Year closed"
    );

    #[cfg(debug_assertions)]
    {
        let hash = ctx.state_hash();
        debug!(year, state_hash = hash, "Simulation state hash");
    }

    #[cfg(feature = "debug-validation")]
    validate_invariants(ctx, &balance_sheet)?;

    Ok(TurnReport {
        year,
        event: record.event.clone(),
        effects,
        forecast: ctx.forecast.clone(),
        property_tax,
        interest,
        harvest,
        integrity_bonus,
        insurance_fee,
        record,
    })
}

/// Harvest every crop and livestock tile.
///
/// Crops are single-harvest and cleared. Livestock stays. Event multipliers
/// are reset afterwards.
fn run_harvest(ctx: &mut SimulationContext, catalog: &EconomyCatalog) -> HarvestReport {
    let rules = &catalog.rules;
    let mut report = HarvestReport::default();

    // Irrigation is checked now, not when the drought started.
    if ctx.ledger.drought && ctx.grid.has_structure_class(StructureClass::Water, catalog) {
        ctx.ledger.drought = false;
    }
    report.drought_penalized = ctx.ledger.drought;
    let drought = if ctx.ledger.drought {
        rules.drought_penalty
    } else {
        Fixed::ONE
    };

    let tools = ctx
        .ledger
        .tools
        .yield_multiplier(&rules.tools, ctx.grid.has_living_livestock());
    let modifiers = &ctx.ledger.modifiers;
    let crop_factor = modifiers
        .crop_yield
        .saturating_mul(tools)
        .saturating_mul(drought)
        .saturating_mul(modifiers.sell_price);

    for tile in ctx.grid.tiles_mut() {
        let harvested = match &tile.occupant {
            Occupant::Crop { crop } => {
                let base = catalog
                    .crop(crop)
                    .map_or(rules.fallback_crop_yield, |c| c.earn);
                let factor = crop_factor.saturating_mul(modifiers.specific_for(crop));
                report.crop_income += base.scale(factor);
                report.crops_harvested += 1;
                true
            }
            Occupant::Livestock { animal, count } if *count > 0 => {
                let per_head = catalog
                    .animal(animal)
                    .map_or(rules.fallback_livestock_yield, |a| a.earn);
                let factor = modifiers.livestock.saturating_mul(modifiers.specific_for(animal));
                report.livestock_income += per_head.times(*count).scale(factor);
                false
            }
            _ => false,
        };
        if harvested {
            tile.clear();
        }
    }

    report.fuel_cost = ctx.ledger.tools.fuel_cost(rules);
    ctx.ledger.credit(report.income());
    ctx.ledger.deduct(report.fuel_cost);
    ctx.ledger.modifiers.reset();
    report
}

#[cfg(feature = "debug-validation")]
fn validate_invariants(ctx: &SimulationContext, sheet: &BalanceSheet) -> Result<()> {
    if !sheet.is_balanced() {
        return Err(GameError::InvalidState(format!(
            "balance sheet does not balance: {sheet:?}"
        )));
    }
    if ctx.ledger.cash.is_negative() {
        return Err(GameError::InvalidState("negative cash".to_string()));
    }
    let max = Fixed::from_num(crate::ledger::MAX_INTEGRITY);
    if ctx.ledger.integrity < Fixed::ZERO || ctx.ledger.integrity > max {
        return Err(GameError::InvalidState(format!(
            "integrity out of range: {}",
            ctx.ledger.integrity
        )));
    }
    for asset in ctx.market.assets() {
        if asset.current_price.cents() <= 0 {
            return Err(GameError::InvalidState(format!(
                "non-positive price for {}",
                asset.id
            )));
        }
    }
    Ok(())
}
