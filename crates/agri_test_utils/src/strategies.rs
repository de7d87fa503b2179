//! Proptest strategies for generating test data.
//!
//! Strategies produce player actions over the shipped catalog. Coordinates
//! and quantities deliberately overshoot what is valid so that refusals are
//! exercised alongside successes.

use agri_core::ledger::{InsuranceKind, Tool};
use agri_core::replay::FarmAction;
use proptest::prelude::*;

/// Every buildable asset ID in the shipped catalog.
pub const ASSET_IDS: &[&str] = &[
    "paddyRice",
    "sugarcane",
    "dragonFruit",
    "durian",
    "duck",
    "fish",
    "pig",
    "shrimp",
    "pond",
    "barn",
    "well",
    "waterAerator",
    "fence",
    "silo",
    "comm_tower",
    "paved_road",
];

/// Every instrument ID in the shipped catalog.
pub const INSTRUMENT_IDS: &[&str] = &["gold", "usd", "stocks"];

/// Generate a coordinate, sometimes just outside a starting grid.
pub fn arb_coordinate() -> impl Strategy<Value = u32> {
    0u32..6u32
}

/// Generate a catalog asset ID.
pub fn arb_asset_id() -> impl Strategy<Value = String> {
    proptest::sample::select(ASSET_IDS).prop_map(str::to_string)
}

/// Generate an instrument ID.
pub fn arb_instrument_id() -> impl Strategy<Value = String> {
    proptest::sample::select(INSTRUMENT_IDS).prop_map(str::to_string)
}

/// Generate a tool.
pub fn arb_tool() -> impl Strategy<Value = Tool> {
    prop_oneof![
        Just(Tool::HandTools),
        Just(Tool::AnimalPlow),
        Just(Tool::Tractor),
        Just(Tool::TractorRenovated),
        Just(Tool::Harvester),
    ]
}

/// Generate an insurance plan, including the invalid `None`.
pub fn arb_insurance_kind() -> impl Strategy<Value = InsuranceKind> {
    prop_oneof![
        Just(InsuranceKind::None),
        Just(InsuranceKind::OneTime),
        Just(InsuranceKind::Annual),
    ]
}

/// Generate a placement.
pub fn arb_place() -> impl Strategy<Value = FarmAction> {
    (arb_coordinate(), arb_coordinate(), arb_asset_id())
        .prop_map(|(x, z, asset)| FarmAction::Place { x, z, asset })
}

/// Generate a trade, buy or sell.
pub fn arb_trade() -> impl Strategy<Value = FarmAction> {
    (any::<bool>(), arb_instrument_id(), 0u32..4u32).prop_map(|(buy, instrument, quantity)| {
        if buy {
            FarmAction::BuyInstrument {
                instrument,
                quantity,
            }
        } else {
            FarmAction::SellInstrument {
                instrument,
                quantity,
            }
        }
    })
}

/// Generate any action except ending the turn.
pub fn arb_farm_action() -> impl Strategy<Value = FarmAction> {
    prop_oneof![
        4 => arb_place(),
        2 => (arb_coordinate(), arb_coordinate())
            .prop_map(|(x, z)| FarmAction::Liquidate { x, z }),
        1 => (arb_coordinate(), arb_coordinate())
            .prop_map(|(x, z)| FarmAction::Renovate { x, z }),
        2 => arb_trade(),
        1 => arb_insurance_kind().prop_map(FarmAction::BuyInsurance),
        1 => Just(FarmAction::ExpandGrid),
        1 => (arb_tool(), any::<bool>())
            .prop_map(|(tool, active)| FarmAction::SetTool { tool, active }),
        1 => any::<bool>().prop_map(|accept| FarmAction::ResolveBribe { accept }),
    ]
}

/// Generate a game: years of up to `max_per_year` actions, each year closed
/// by an [`FarmAction::EndTurn`].
pub fn arb_game(years: usize, max_per_year: usize) -> impl Strategy<Value = Vec<FarmAction>> {
    proptest::collection::vec(
        proptest::collection::vec(arb_farm_action(), 0..max_per_year),
        1..=years,
    )
    .prop_map(|years| {
        years
            .into_iter()
            .flat_map(|mut actions| {
                actions.push(FarmAction::EndTurn);
                actions
            })
            .collect()
    })
}
