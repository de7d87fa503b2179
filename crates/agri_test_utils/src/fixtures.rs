//! Test fixtures and helpers.
//!
//! Pre-built catalogs, random sources and farms for consistent testing.

use agri_core::data::{EconomyCatalog, EventCatalog};
use agri_core::math::Fixed;
use agri_core::random::ScriptedRandom;
use agri_core::simulation::Farm;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Whether two fixed-point values agree to within one millionth.
///
/// Percent factors such as 0.9 are not exact in binary fixed point, so
/// integrity after depreciation is compared with this.
#[must_use]
pub fn near(actual: Fixed, expected: Fixed) -> bool {
    (actual - expected).abs() < fixed(1) / fixed(1_000_000)
}

/// The shipped economy catalog.
///
/// # Panics
///
/// Panics if the embedded catalog fails to parse.
#[must_use]
pub fn economy() -> EconomyCatalog {
    EconomyCatalog::builtin().expect("built-in economy catalog parses")
}

/// The shipped event catalog.
///
/// # Panics
///
/// Panics if the embedded catalog fails to parse.
#[must_use]
pub fn events() -> EventCatalog {
    EventCatalog::builtin().expect("built-in event catalog parses")
}

/// A catalog holding one event with probability 1.
///
/// `effects` is the JSON body of the event's `effects` object.
///
/// # Panics
///
/// Panics if the JSON is invalid.
#[must_use]
pub fn single_event(kind: &str, effects: &str) -> EventCatalog {
    let text = format!(
        r#"[{{ "id": "scripted", "type": "{kind}", "name": "Scripted", "probability": 1,
              "effects": {effects} }}]"#
    );
    EventCatalog::from_json_str(&text, "fixture").expect("fixture event parses")
}

/// A random source returning one half forever: no event in a catalog whose
/// probabilities sum to at most one half, and a neutral market walk for
/// currency and equity instruments.
#[must_use]
pub fn neutral_rng() -> ScriptedRandom {
    ScriptedRandom::constant(fixed(1) / fixed(2))
}

/// A farm on the shipped economy with no events and a neutral market.
#[must_use]
pub fn quiet_farm() -> Farm<ScriptedRandom> {
    Farm::new(economy(), EventCatalog::empty(), neutral_rng())
}

/// A farm on the shipped economy with the given events and draws.
#[must_use]
pub fn scripted_farm(events: EventCatalog, rng: ScriptedRandom) -> Farm<ScriptedRandom> {
    Farm::new(economy(), events, rng)
}

/// A farm on the shipped catalogs with a seeded generator.
///
/// # Panics
///
/// Panics if the embedded catalogs fail to parse.
#[must_use]
pub fn seeded_farm(seed: u64) -> Farm {
    Farm::builtin(seed).expect("built-in catalogs parse")
}
