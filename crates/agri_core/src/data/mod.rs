//! Data structures for the economy and event catalogs.
//!
//! This module contains pure data structures that define crops, animals,
//! structures, instruments, pipeline rules and random events. Catalogs are
//! parsed from in-memory text (RON for the economy, JSON for events).
//!
//! **Note:** This module contains no file IO. The built-in catalogs are
//! embedded at compile time; loading from disk is handled by `agri_tools`.

mod asset_data;
mod economy_data;
mod event_data;
mod instrument_data;
mod rules_data;

pub use asset_data::{
    AnimalData, AssetKind, AssetRef, CropData, RiskLevel, StructureClass, StructureData,
    UpgradePath,
};
pub use economy_data::EconomyCatalog;
pub use event_data::{EffectStage, EventCatalog, EventEffect, EventKind, GameEvent, VisualCue};
pub use instrument_data::{InstrumentClass, InstrumentData};
pub use rules_data::{EconomyRules, ToolMultipliers};

use crate::error::Result;

/// Embedded default economy catalog.
pub const BUILTIN_ECONOMY_RON: &str = include_str!("../../../../assets/data/economy.ron");

/// Embedded default event catalog.
pub const BUILTIN_EVENTS_JSON: &str = include_str!("../../../../assets/data/events.json");

impl EconomyCatalog {
    /// The economy catalog shipped with the game.
    pub fn builtin() -> Result<Self> {
        Self::from_ron_str(BUILTIN_ECONOMY_RON, "assets/data/economy.ron")
    }
}

impl EventCatalog {
    /// The event catalog shipped with the game.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_EVENTS_JSON, "assets/data/events.json")
    }
}
