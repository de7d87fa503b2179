//! The farm grid.
//!
//! Tiles live in a flat arena and are mutated in place. The starting square
//! is laid out column by column (`x * size + z`); each expansion appends one
//! ring: the new row `(0..n, n)` followed by the new column `(n, 0..=n)`.
//! Arena order is the order events walk when they take "the first" tiles.
//!
//! Grid operations validate and mutate tiles only. Paying for a placement and
//! crediting a refund is the caller's job, so each operation returns an
//! outcome describing the money involved.

use serde::{Deserialize, Serialize};

use crate::data::{AssetKind, AssetRef, EconomyCatalog, StructureClass};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Money};

/// Tile health after placement or renovation.
pub const FULL_HEALTH: u8 = 100;

/// What a tile holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Occupant {
    /// Nothing.
    #[default]
    Empty,
    /// A single-harvest crop.
    Crop {
        /// Crop ID.
        crop: String,
    },
    /// A herd of animals.
    Livestock {
        /// Animal ID.
        animal: String,
        /// Number of head.
        count: u32,
    },
    /// A building.
    Structure {
        /// Structure ID (possibly a renovated tier).
        structure: String,
    },
}

impl Occupant {
    /// Content identifier, `None` for empty tiles.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Crop { crop } => Some(crop),
            Self::Livestock { animal, .. } => Some(animal),
            Self::Structure { structure } => Some(structure),
        }
    }

    /// Occupancy kind, `None` for empty tiles.
    #[must_use]
    pub const fn kind(&self) -> Option<AssetKind> {
        match self {
            Self::Empty => None,
            Self::Crop { .. } => Some(AssetKind::Crop),
            Self::Livestock { .. } => Some(AssetKind::Livestock),
            Self::Structure { .. } => Some(AssetKind::Structure),
        }
    }

    /// Head count; zero for anything but livestock.
    #[must_use]
    pub const fn livestock_count(&self) -> u32 {
        match self {
            Self::Livestock { count, .. } => *count,
            _ => 0,
        }
    }

    /// Catalog value of this occupant before any refund rate.
    ///
    /// Unknown IDs are worth nothing.
    #[must_use]
    pub fn base_value(&self, catalog: &EconomyCatalog) -> Money {
        match self {
            Self::Empty => Money::ZERO,
            Self::Crop { crop } => catalog.crop(crop).map_or(Money::ZERO, |c| c.cost),
            Self::Livestock { animal, count } => catalog
                .animal(animal)
                .map_or(Money::ZERO, |a| a.cost.times(*count)),
            Self::Structure { structure } => {
                catalog.structure(structure).map_or(Money::ZERO, |s| s.cost)
            }
        }
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Column.
    pub x: u32,
    /// Row.
    pub z: u32,
    /// Condition, 0..=100.
    pub health: u8,
    /// Content.
    pub occupant: Occupant,
}

impl Tile {
    /// Create an empty tile.
    #[must_use]
    pub const fn empty(x: u32, z: u32) -> Self {
        Self {
            x,
            z,
            health: FULL_HEALTH,
            occupant: Occupant::Empty,
        }
    }

    /// Stable identifier derived from the coordinates.
    #[must_use]
    pub fn id(&self) -> String {
        format!("tile-{}-{}", self.x, self.z)
    }

    /// Check if nothing occupies this tile.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupant == Occupant::Empty
    }

    /// Reset to empty, returning what was here.
    pub fn clear(&mut self) -> Occupant {
        self.health = FULL_HEALTH;
        std::mem::take(&mut self.occupant)
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// What kind of occupancy was created.
    pub kind: AssetKind,
    /// Price the caller must charge.
    pub cost: Money,
}

/// Result of a successful liquidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Liquidation {
    /// What was removed.
    pub occupant: Occupant,
    /// Catalog value before the refund rate.
    pub base_value: Money,
    /// Rate applied to the base value.
    pub refund_rate: Fixed,
    /// Cash returned to the player.
    pub refund: Money,
}

/// Result of a successful renovation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renovation {
    /// Structure ID before renovation.
    pub from: String,
    /// Structure ID after renovation.
    pub to: String,
    /// Price the caller must charge.
    pub cost: Money,
}

/// Square grid of tiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmGrid {
    size: u32,
    /// Side length before any expansion.
    base: u32,
    tiles: Vec<Tile>,
}

impl FarmGrid {
    /// Create an all-empty grid.
    #[must_use]
    pub fn new(size: u32) -> Self {
        let mut tiles = Vec::with_capacity((size * size) as usize);
        for x in 0..size {
            for z in 0..size {
                tiles.push(Tile::empty(x, z));
            }
        }
        Self {
            size,
            base: size,
            tiles,
        }
    }

    /// Side length.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Total number of tiles.
    #[must_use]
    pub const fn tile_count(&self) -> u32 {
        self.size * self.size
    }

    /// All tiles in arena order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Arena index of a coordinate pair.
    fn index(&self, x: u32, z: u32) -> Result<usize> {
        if x >= self.size || z >= self.size {
            return Err(GameError::OutOfBounds {
                x,
                z,
                size: self.size,
            });
        }
        let ring = x.max(z);
        let index = if ring < self.base {
            x * self.base + z
        } else if x < ring {
            ring * ring + x
        } else {
            ring * ring + ring + z
        };
        Ok(index as usize)
    }

    /// Tile at the given coordinates.
    #[must_use]
    pub fn tile(&self, x: u32, z: u32) -> Option<&Tile> {
        self.index(x, z).ok().map(|i| &self.tiles[i])
    }

    /// Number of non-empty tiles.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_empty()).count()
    }

    /// Check if a structure with this ID (or renovated from it) stands anywhere.
    #[must_use]
    pub fn has_structure(&self, id: &str, catalog: &EconomyCatalog) -> bool {
        self.tiles.iter().any(|tile| match &tile.occupant {
            Occupant::Structure { structure } => {
                structure == id || catalog.base_structure(structure) == id
            }
            _ => false,
        })
    }

    /// Check if any structure of the given class stands anywhere.
    #[must_use]
    pub fn has_structure_class(&self, class: StructureClass, catalog: &EconomyCatalog) -> bool {
        self.tiles.iter().any(|tile| match &tile.occupant {
            Occupant::Structure { structure } => catalog.structure_class(structure) == class,
            _ => false,
        })
    }

    /// Check if any livestock tile holds at least one head.
    #[must_use]
    pub fn has_living_livestock(&self) -> bool {
        self.tiles.iter().any(|t| t.occupant.livestock_count() > 0)
    }

    /// Total livestock heads on the grid.
    #[must_use]
    pub fn livestock_heads(&self) -> u32 {
        self.tiles
            .iter()
            .map(|t| t.occupant.livestock_count())
            .fold(0u32, u32::saturating_add)
    }

    /// Structures an animal needs that are not on the grid.
    #[must_use]
    pub fn missing_prerequisites(&self, requires: &[String], catalog: &EconomyCatalog) -> Vec<String> {
        requires
            .iter()
            .filter(|id| !self.has_structure(id, catalog))
            .cloned()
            .collect()
    }

    /// Place a catalog asset on an empty tile.
    ///
    /// # Errors
    ///
    /// - [`GameError::OutOfBounds`] for coordinates outside the grid
    /// - [`GameError::TileOccupied`] if the tile is not empty
    /// - [`GameError::UnknownAsset`] for unknown or non-buildable IDs
    /// - [`GameError::InsufficientFunds`] if the price exceeds `available`
    /// - [`GameError::MissingPrerequisite`] for livestock without its structures
    pub fn place(
        &mut self,
        x: u32,
        z: u32,
        asset_id: &str,
        catalog: &EconomyCatalog,
        available: Money,
    ) -> Result<Placement> {
        let index = self.index(x, z)?;
        if !self.tiles[index].is_empty() {
            return Err(GameError::TileOccupied { x, z });
        }

        let asset = catalog
            .asset(asset_id)
            .ok_or_else(|| GameError::UnknownAsset(asset_id.to_string()))?;
        if let AssetRef::Structure(structure) = asset {
            if !structure.buildable {
                return Err(GameError::UnknownAsset(asset_id.to_string()));
            }
        }

        let cost = asset.cost();
        if cost > available {
            return Err(GameError::insufficient_funds(cost, available));
        }

        if let AssetRef::Animal(animal) = asset {
            let missing = self.missing_prerequisites(&animal.requires, catalog);
            if !missing.is_empty() {
                return Err(GameError::MissingPrerequisite {
                    asset: asset_id.to_string(),
                    missing,
                });
            }
        }

        let occupant = match asset.kind() {
            AssetKind::Crop => Occupant::Crop {
                crop: asset_id.to_string(),
            },
            AssetKind::Livestock => Occupant::Livestock {
                animal: asset_id.to_string(),
                count: 1,
            },
            AssetKind::Structure => Occupant::Structure {
                structure: asset_id.to_string(),
            },
        };
        let tile = &mut self.tiles[index];
        tile.occupant = occupant;
        tile.health = FULL_HEALTH;

        Ok(Placement {
            kind: asset.kind(),
            cost,
        })
    }

    /// Refund rate currently in force for liquidations.
    #[must_use]
    pub fn refund_rate(&self, catalog: &EconomyCatalog) -> Fixed {
        if self.has_structure_class(StructureClass::Road, catalog) {
            catalog.rules.road_refund_rate
        } else {
            catalog.rules.refund_rate
        }
    }

    /// Clear an occupied tile and compute its refund.
    ///
    /// The refund rate is decided before the tile is cleared, so selling the
    /// last road still earns the road rate.
    ///
    /// # Errors
    ///
    /// [`GameError::OutOfBounds`] or [`GameError::TileEmpty`].
    pub fn liquidate(&mut self, x: u32, z: u32, catalog: &EconomyCatalog) -> Result<Liquidation> {
        let index = self.index(x, z)?;
        if self.tiles[index].is_empty() {
            return Err(GameError::TileEmpty { x, z });
        }

        let refund_rate = self.refund_rate(catalog);
        let occupant = self.tiles[index].clear();
        let base_value = occupant.base_value(catalog);

        Ok(Liquidation {
            refund: base_value.scale(refund_rate),
            occupant,
            base_value,
            refund_rate,
        })
    }

    /// Upgrade a structure to its next tier.
    ///
    /// # Errors
    ///
    /// - [`GameError::OutOfBounds`] or [`GameError::TileEmpty`]
    /// - [`GameError::NoUpgradePath`] for non-structures, already-renovated
    ///   structures, and structures without a path
    /// - [`GameError::InsufficientFunds`] if the cost exceeds `available`
    pub fn renovate(
        &mut self,
        x: u32,
        z: u32,
        catalog: &EconomyCatalog,
        available: Money,
    ) -> Result<Renovation> {
        let index = self.index(x, z)?;
        let tile = &mut self.tiles[index];
        let current = match &tile.occupant {
            Occupant::Empty => return Err(GameError::TileEmpty { x, z }),
            Occupant::Structure { structure } => structure.clone(),
            other => {
                return Err(GameError::NoUpgradePath(
                    other.content_id().unwrap_or_default().to_string(),
                ))
            }
        };

        let upgrade = catalog
            .structure(&current)
            .and_then(|s| s.upgrade.as_ref())
            .ok_or_else(|| GameError::NoUpgradePath(current.clone()))?;
        if upgrade.cost > available {
            return Err(GameError::insufficient_funds(upgrade.cost, available));
        }

        tile.occupant = Occupant::Structure {
            structure: upgrade.to.clone(),
        };
        tile.health = FULL_HEALTH;

        Ok(Renovation {
            from: current,
            to: upgrade.to.clone(),
            cost: upgrade.cost,
        })
    }

    /// Grow the grid by one row and one column.
    ///
    /// Existing tiles keep their coordinates, content and arena position.
    pub fn expand(&mut self) {
        let ring = self.size;
        self.tiles.reserve((2 * ring + 1) as usize);
        self.tiles.extend((0..ring).map(|x| Tile::empty(x, ring)));
        self.tiles.extend((0..=ring).map(|z| Tile::empty(ring, z)));
        self.size = ring + 1;
    }

    /// Clear every tile whose occupant matches, returning what was removed.
    pub fn clear_matching<F>(&mut self, mut predicate: F) -> Vec<Occupant>
    where
        F: FnMut(&Occupant) -> bool,
    {
        self.tiles
            .iter_mut()
            .filter(|t| !t.is_empty() && predicate(&t.occupant))
            .map(Tile::clear)
            .collect()
    }

    /// Clear up to `count` occupied tiles in arena order.
    ///
    /// On the starting square that means `(0, 1)` goes before `(1, 0)`.
    pub fn remove_first_occupied(&mut self, count: u32) -> Vec<Occupant> {
        self.tiles
            .iter_mut()
            .filter(|t| !t.is_empty())
            .take(count as usize)
            .map(Tile::clear)
            .collect()
    }

    /// Mutable access to all tiles, for the harvest stage.
    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EconomyCatalog {
        EconomyCatalog::builtin().unwrap()
    }

    #[test]
    fn test_new_grid_is_empty() {
        let grid = FarmGrid::new(5);
        assert_eq!(grid.tile_count(), 25);
        assert_eq!(grid.tiles().len(), 25);
        assert_eq!(grid.occupied_count(), 0);
        let tile = grid.tile(3, 4).unwrap();
        assert_eq!((tile.x, tile.z), (3, 4));
        assert_eq!(tile.id(), "tile-3-4");
        assert!(grid.tile(5, 0).is_none());
    }

    #[test]
    fn test_place_crop_and_reject_occupied() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let placed = grid
            .place(1, 2, "paddyRice", &catalog, Money::from_dollars(100))
            .unwrap();
        assert_eq!(placed.kind, AssetKind::Crop);
        assert_eq!(placed.cost, Money::from_dollars(20));

        let err = grid
            .place(1, 2, "sugarcane", &catalog, Money::from_dollars(100))
            .unwrap_err();
        assert_eq!(err, GameError::TileOccupied { x: 1, z: 2 });
    }

    #[test]
    fn test_place_rejections_leave_tile_empty() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);

        let err = grid.place(0, 0, "barn", &catalog, Money::from_dollars(999)).unwrap_err();
        assert!(matches!(err, GameError::InsufficientFunds { .. }));

        let err = grid.place(0, 0, "duck", &catalog, Money::from_dollars(999)).unwrap_err();
        assert_eq!(
            err,
            GameError::MissingPrerequisite {
                asset: "duck".to_string(),
                missing: vec!["barn".to_string()],
            }
        );

        let err = grid
            .place(0, 0, "well_upgraded", &catalog, Money::from_dollars(9999))
            .unwrap_err();
        assert_eq!(err, GameError::UnknownAsset("well_upgraded".to_string()));

        let err = grid.place(9, 0, "pond", &catalog, Money::from_dollars(999)).unwrap_err();
        assert!(matches!(err, GameError::OutOfBounds { size: 5, .. }));

        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_livestock_starts_with_one_head() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let cash = Money::from_dollars(5000);
        grid.place(0, 0, "barn", &catalog, cash).unwrap();
        let placed = grid.place(1, 0, "duck", &catalog, cash).unwrap();
        assert_eq!(placed.kind, AssetKind::Livestock);
        assert_eq!(grid.tile(1, 0).unwrap().occupant.livestock_count(), 1);
        assert!(grid.has_living_livestock());
        assert_eq!(grid.livestock_heads(), 1);
    }

    #[test]
    fn test_renovated_structure_counts_as_base() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let cash = Money::from_dollars(5000);
        grid.place(0, 0, "well", &catalog, cash).unwrap();
        grid.renovate(0, 0, &catalog, cash).unwrap();
        assert!(grid.has_structure("well", &catalog));
        assert!(grid.has_structure("well_upgraded", &catalog));
        assert!(grid.has_structure_class(StructureClass::Water, &catalog));
        assert!(grid.missing_prerequisites(&["well".to_string()], &catalog).is_empty());
    }

    #[test]
    fn test_liquidate_well_refund_rates() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let cash = Money::from_dollars(5000);

        grid.place(0, 0, "well", &catalog, cash).unwrap();
        let sold = grid.liquidate(0, 0, &catalog).unwrap();
        assert_eq!(sold.refund, Money::from_dollars(560));
        assert_eq!(sold.base_value, Money::from_dollars(800));
        assert!(grid.tile(0, 0).unwrap().is_empty());

        grid.place(0, 0, "well", &catalog, cash).unwrap();
        grid.place(4, 4, "paved_road", &catalog, cash).unwrap();
        let sold = grid.liquidate(0, 0, &catalog).unwrap();
        assert_eq!(sold.refund, Money::from_dollars(680));
    }

    #[test]
    fn test_liquidate_empty_tile_fails() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        assert_eq!(
            grid.liquidate(2, 2, &catalog).unwrap_err(),
            GameError::TileEmpty { x: 2, z: 2 }
        );
    }

    #[test]
    fn test_renovate_paths() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let cash = Money::from_dollars(5000);
        grid.place(0, 0, "silo", &catalog, cash).unwrap();
        grid.place(1, 0, "pond", &catalog, cash).unwrap();
        grid.place(2, 0, "paddyRice", &catalog, cash).unwrap();

        let err = grid.renovate(0, 0, &catalog, Money::from_dollars(100)).unwrap_err();
        assert!(matches!(err, GameError::InsufficientFunds { .. }));

        let done = grid.renovate(0, 0, &catalog, cash).unwrap();
        assert_eq!(done.to, "silo_upgraded");
        assert_eq!(done.cost, Money::from_dollars(600));

        assert_eq!(
            grid.renovate(0, 0, &catalog, cash).unwrap_err(),
            GameError::NoUpgradePath("silo_upgraded".to_string())
        );
        assert_eq!(
            grid.renovate(1, 0, &catalog, cash).unwrap_err(),
            GameError::NoUpgradePath("pond".to_string())
        );
        assert_eq!(
            grid.renovate(2, 0, &catalog, cash).unwrap_err(),
            GameError::NoUpgradePath("paddyRice".to_string())
        );
    }

    #[test]
    fn test_expand_keeps_coordinates() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        grid.place(4, 4, "pond", &catalog, Money::from_dollars(500)).unwrap();
        grid.expand();
        assert_eq!(grid.size(), 6);
        assert_eq!(grid.tiles().len(), 36);
        for tile in grid.tiles() {
            assert_eq!(grid.tile(tile.x, tile.z), Some(tile));
        }
        let appended: Vec<(u32, u32)> = grid.tiles()[25..].iter().map(|t| (t.x, t.z)).collect();
        assert_eq!(
            appended,
            vec![
                (0, 5), (1, 5), (2, 5), (3, 5), (4, 5),
                (5, 0), (5, 1), (5, 2), (5, 3), (5, 4), (5, 5),
            ]
        );
        assert!(grid.has_structure("pond", &catalog));
        assert!(!grid.tile(4, 4).unwrap().is_empty());
        assert!(grid.tile(5, 5).unwrap().is_empty());
    }

    #[test]
    fn test_remove_first_occupied_in_order() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let cash = Money::from_dollars(5000);
        grid.place(3, 0, "paddyRice", &catalog, cash).unwrap();
        grid.place(0, 1, "pond", &catalog, cash).unwrap();
        grid.place(2, 2, "sugarcane", &catalog, cash).unwrap();

        let removed = grid.remove_first_occupied(2);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].content_id(), Some("pond"));
        assert_eq!(removed[1].content_id(), Some("sugarcane"));
        assert!(!grid.tile(3, 0).unwrap().is_empty());
        assert_eq!(grid.occupied_count(), 1);

        assert_eq!(grid.remove_first_occupied(10).len(), 1);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_remove_first_occupied_walks_columns_first() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let cash = Money::from_dollars(5000);
        grid.place(1, 0, "pond", &catalog, cash).unwrap();
        grid.place(0, 1, "fence", &catalog, cash).unwrap();

        let removed = grid.remove_first_occupied(1);
        assert_eq!(removed[0].content_id(), Some("fence"));
        assert!(grid.tile(0, 1).unwrap().is_empty());
        assert!(!grid.tile(1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_expanded_ring_comes_after_original_tiles() {
        let catalog = catalog();
        let mut grid = FarmGrid::new(5);
        let cash = Money::from_dollars(5000);
        grid.expand();
        grid.expand();
        grid.place(0, 6, "pond", &catalog, cash).unwrap();
        grid.place(5, 0, "fence", &catalog, cash).unwrap();
        grid.place(4, 4, "paddyRice", &catalog, cash).unwrap();
        assert_eq!(grid.tiles().len(), 49);

        let order: Vec<_> = grid
            .remove_first_occupied(3)
            .iter()
            .map(|o| o.content_id().map(str::to_string))
            .collect();
        assert_eq!(
            order,
            vec![
                Some("paddyRice".to_string()),
                Some("fence".to_string()),
                Some("pond".to_string()),
            ]
        );
    }
}
