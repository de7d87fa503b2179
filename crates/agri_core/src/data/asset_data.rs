//! Placeable asset definitions: crops, animals and structures.

use serde::{Deserialize, Serialize};

use crate::math::{dollars_serde, Money};

/// How risky a crop is, as advertised in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Staple crop, rarely targeted.
    Low,
    /// Cash crop.
    Moderate,
    /// Specialty crop.
    High,
    /// Luxury crop with extreme upside.
    ExtremelyHigh,
}

/// Data-driven crop definition.
///
/// # Example RON
///
/// ```ron
/// "paddyRice": (
///     name: "Paddy Rice",
///     cost: 20,
///     earn: 40,
///     risk: Low,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropData {
    /// Display name.
    pub name: String,

    /// Planting cost.
    #[serde(with = "dollars_serde")]
    pub cost: Money,

    /// Base harvest revenue per tile.
    #[serde(with = "dollars_serde")]
    pub earn: Money,

    /// Advertised risk level.
    pub risk: RiskLevel,
}

/// Data-driven livestock definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalData {
    /// Display name.
    pub name: String,

    /// Purchase cost per head.
    #[serde(with = "dollars_serde")]
    pub cost: Money,

    /// Yearly revenue per head.
    #[serde(with = "dollars_serde")]
    pub earn: Money,

    /// Structure IDs that must be on the grid before placement.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl AnimalData {
    /// Check if this animal needs the given structure.
    #[must_use]
    pub fn requires_structure(&self, structure_id: &str) -> bool {
        self.requires.iter().any(|s| s == structure_id)
    }
}

/// Functional class of a structure; drives pipeline bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StructureClass {
    /// Barn-class storage: softens depreciation.
    Storage,
    /// Well-class irrigation: waives the drought penalty.
    Water,
    /// Road-class infrastructure: raises the liquidation refund rate.
    Road,
    /// Communications: forecasts next year's event.
    Comms,
    /// No pipeline effect.
    #[default]
    General,
}

/// Renovation path from one structure tier to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePath {
    /// Structure ID after renovation.
    pub to: String,

    /// Renovation cost, added to building value.
    #[serde(with = "dollars_serde")]
    pub cost: Money,
}

/// Data-driven structure definition.
///
/// # Example RON
///
/// ```ron
/// "well": (
///     name: "Well",
///     cost: 800,
///     class: Water,
///     upgrade: Some((to: "well_upgraded", cost: 400)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureData {
    /// Display name.
    pub name: String,

    /// Construction cost; also the value used for liquidation.
    #[serde(with = "dollars_serde")]
    pub cost: Money,

    /// Functional class.
    #[serde(default)]
    pub class: StructureClass,

    /// Renovation path, if any.
    #[serde(default)]
    pub upgrade: Option<UpgradePath>,

    /// Base structure this tier was renovated from.
    #[serde(default)]
    pub upgrade_of: Option<String>,

    /// Whether the shop sells this structure directly.
    #[serde(default = "default_true")]
    pub buildable: bool,
}

/// Default to true for buildable.
const fn default_true() -> bool {
    true
}

impl StructureData {
    /// Check if this structure can be renovated.
    #[must_use]
    pub const fn is_upgradable(&self) -> bool {
        self.upgrade.is_some()
    }
}

/// Which grid occupancy an asset produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Single-harvest crop.
    Crop,
    /// Persistent livestock.
    Livestock,
    /// Building.
    Structure,
}

/// Borrowed view of any catalog asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRef<'a> {
    /// A crop entry.
    Crop(&'a CropData),
    /// An animal entry.
    Animal(&'a AnimalData),
    /// A structure entry.
    Structure(&'a StructureData),
}

impl AssetRef<'_> {
    /// Grid occupancy this asset produces.
    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        match self {
            Self::Crop(_) => AssetKind::Crop,
            Self::Animal(_) => AssetKind::Livestock,
            Self::Structure(_) => AssetKind::Structure,
        }
    }

    /// Purchase price.
    #[must_use]
    pub const fn cost(&self) -> Money {
        match self {
            Self::Crop(c) => c.cost,
            Self::Animal(a) => a.cost,
            Self::Structure(s) => s.cost,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Crop(c) => &c.name,
            Self::Animal(a) => &a.name,
            Self::Structure(s) => &s.name,
        }
    }
}
