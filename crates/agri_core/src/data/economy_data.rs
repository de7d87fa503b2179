//! Economy catalog combining every static lookup table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::asset_data::{AnimalData, AssetRef, CropData, StructureClass, StructureData};
use super::instrument_data::InstrumentData;
use super::rules_data::EconomyRules;
use crate::error::{GameError, Result};

/// Complete economy definition.
///
/// Pure data: crop, animal and structure tables, tradable instruments, and the
/// numeric rules of the pipeline. Loaded from a RON document.
///
/// # Example RON
///
/// ```ron
/// EconomyCatalog(
///     crops: { "paddyRice": (name: "Paddy Rice", cost: 20, earn: 40, risk: Low) },
///     animals: { "duck": (name: "Duck", cost: 70, earn: 100, requires: ["barn"]) },
///     structures: { "barn": (name: "Barn", cost: 1000, class: Storage) },
///     instruments: [...],
///     rules: (),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyCatalog {
    /// Crop ID to definition.
    #[serde(default)]
    pub crops: BTreeMap<String, CropData>,

    /// Animal ID to definition.
    #[serde(default)]
    pub animals: BTreeMap<String, AnimalData>,

    /// Structure ID to definition.
    #[serde(default)]
    pub structures: BTreeMap<String, StructureData>,

    /// Tradable instruments, in market order.
    #[serde(default)]
    pub instruments: Vec<InstrumentData>,

    /// Pipeline constants.
    #[serde(default)]
    pub rules: EconomyRules,
}

impl EconomyCatalog {
    /// Parse a catalog from RON text.
    ///
    /// `source` names the document in error messages.
    pub fn from_ron_str(text: &str, source: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    /// Find a crop by its ID.
    #[must_use]
    pub fn crop(&self, id: &str) -> Option<&CropData> {
        self.crops.get(id)
    }

    /// Find an animal by its ID.
    #[must_use]
    pub fn animal(&self, id: &str) -> Option<&AnimalData> {
        self.animals.get(id)
    }

    /// Find a structure by its ID.
    #[must_use]
    pub fn structure(&self, id: &str) -> Option<&StructureData> {
        self.structures.get(id)
    }

    /// Find an instrument by its ID.
    #[must_use]
    pub fn instrument(&self, id: &str) -> Option<&InstrumentData> {
        self.instruments.iter().find(|i| i.id == id)
    }

    /// Look up any asset by ID. Crops win over animals, animals over structures.
    #[must_use]
    pub fn asset(&self, id: &str) -> Option<AssetRef<'_>> {
        self.crop(id)
            .map(AssetRef::Crop)
            .or_else(|| self.animal(id).map(AssetRef::Animal))
            .or_else(|| self.structure(id).map(AssetRef::Structure))
    }

    /// Class of a structure; unknown structures are [`StructureClass::General`].
    #[must_use]
    pub fn structure_class(&self, id: &str) -> StructureClass {
        self.structure(id).map_or(StructureClass::General, |s| s.class)
    }

    /// Base structure ID of a (possibly renovated) structure.
    #[must_use]
    pub fn base_structure<'a>(&'a self, id: &'a str) -> &'a str {
        self.structure(id)
            .and_then(|s| s.upgrade_of.as_deref())
            .unwrap_or(id)
    }

    /// Validate internal consistency of the catalog.
    ///
    /// Checks for:
    /// - Animal prerequisites referencing unknown structures
    /// - Upgrade paths pointing at unknown or mismatched structures
    /// - Duplicate instrument IDs and inverted price bounds
    /// - IDs shared between asset tables
    ///
    /// Returns a list of human-readable problems (empty if valid).
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (id, animal) in &self.animals {
            for req in &animal.requires {
                if !self.structures.contains_key(req) {
                    problems.push(format!("animal '{id}' requires unknown structure '{req}'"));
                }
            }
        }

        for (id, structure) in &self.structures {
            if let Some(upgrade) = &structure.upgrade {
                match self.structure(&upgrade.to) {
                    None => problems.push(format!(
                        "structure '{id}' upgrades to unknown structure '{}'",
                        upgrade.to
                    )),
                    Some(target) if target.upgrade_of.as_deref() != Some(id.as_str()) => {
                        problems.push(format!(
                            "structure '{}' does not declare upgrade_of '{id}'",
                            upgrade.to
                        ));
                    }
                    Some(_) => {}
                }
            }
        }

        for (index, instrument) in self.instruments.iter().enumerate() {
            if self.instruments[..index].iter().any(|i| i.id == instrument.id) {
                problems.push(format!("duplicate instrument '{}'", instrument.id));
            }
            if instrument.floor > instrument.ceiling {
                problems.push(format!("instrument '{}' has floor above ceiling", instrument.id));
            }
        }

        for id in self.crops.keys() {
            if self.animals.contains_key(id) || self.structures.contains_key(id) {
                problems.push(format!("asset id '{id}' is defined more than once"));
            }
        }
        for id in self.animals.keys() {
            if self.structures.contains_key(id) {
                problems.push(format!("asset id '{id}' is defined more than once"));
            }
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::asset_data::{RiskLevel, UpgradePath};
    use crate::math::Money;

    fn create_test_catalog() -> EconomyCatalog {
        let mut catalog = EconomyCatalog {
            crops: BTreeMap::new(),
            animals: BTreeMap::new(),
            structures: BTreeMap::new(),
            instruments: Vec::new(),
            rules: EconomyRules::default(),
        };
        catalog.crops.insert(
            "paddyRice".to_string(),
            CropData {
                name: "Paddy Rice".to_string(),
                cost: Money::from_dollars(20),
                earn: Money::from_dollars(40),
                risk: RiskLevel::Low,
            },
        );
        catalog.animals.insert(
            "duck".to_string(),
            AnimalData {
                name: "Duck".to_string(),
                cost: Money::from_dollars(70),
                earn: Money::from_dollars(100),
                requires: vec!["barn".to_string()],
            },
        );
        catalog.structures.insert(
            "well".to_string(),
            StructureData {
                name: "Well".to_string(),
                cost: Money::from_dollars(800),
                class: StructureClass::Water,
                upgrade: Some(UpgradePath {
                    to: "well_upgraded".to_string(),
                    cost: Money::from_dollars(400),
                }),
                upgrade_of: None,
                buildable: true,
            },
        );
        catalog.structures.insert(
            "well_upgraded".to_string(),
            StructureData {
                name: "Deep Well".to_string(),
                cost: Money::from_dollars(1200),
                class: StructureClass::Water,
                upgrade: None,
                upgrade_of: Some("well".to_string()),
                buildable: false,
            },
        );
        catalog
    }

    #[test]
    fn test_asset_lookup() {
        let catalog = create_test_catalog();
        assert!(matches!(catalog.asset("paddyRice"), Some(AssetRef::Crop(_))));
        assert!(matches!(catalog.asset("duck"), Some(AssetRef::Animal(_))));
        assert!(matches!(catalog.asset("well"), Some(AssetRef::Structure(_))));
        assert!(catalog.asset("tractor").is_none());
    }

    #[test]
    fn test_base_structure_follows_upgrade() {
        let catalog = create_test_catalog();
        assert_eq!(catalog.base_structure("well_upgraded"), "well");
        assert_eq!(catalog.base_structure("well"), "well");
        assert_eq!(catalog.base_structure("mystery"), "mystery");
        assert_eq!(catalog.structure_class("well_upgraded"), StructureClass::Water);
        assert_eq!(catalog.structure_class("mystery"), StructureClass::General);
    }

    #[test]
    fn test_validate_reports_missing_prerequisite() {
        let catalog = create_test_catalog();
        let problems = catalog.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("barn"));
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = EconomyCatalog::from_ron_str("(crops: 5)", "economy.ron").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { ref path, .. } if path == "economy.ron"));
    }
}
