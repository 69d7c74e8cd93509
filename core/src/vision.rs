//! Vision sources, static vision terrain and the tree occlusion seam.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{BuildingId, Team, VisionCell, WorldPoint, VISION_CELL_SIZE, VISION_GRID_DIMENSION};

/// Seconds an observer ward stays on the map.
pub const OBSERVER_DURATION: f64 = 360.0;
/// Remaining seconds below which a ward counts as expiring.
pub const WARD_EXPIRY_WARNING: f64 = 30.0;
/// Radius inside which a sentry ward reveals invisible units.
pub const SENTRY_TRUE_SIGHT_RADIUS: f32 = 1050.0;

/// Tier of a defensive tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerTier {
    /// Outermost lane tower.
    One,
    /// Second lane tower.
    Two,
    /// Base entrance tower.
    Three,
    /// Ancient guard tower.
    Four,
}

/// Kinds of static structures placed on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Defensive tower of the given tier.
    Tower(TowerTier),
    /// Team ancient.
    Ancient,
}

impl BuildingKind {
    /// Collision radius of the structure.
    #[must_use]
    pub const fn collision_radius(self) -> f32 {
        match self {
            Self::Tower(_) => 144.0,
            Self::Ancient => 288.0,
        }
    }

    /// Vision source kind the structure provides.
    #[must_use]
    pub const fn vision_source(self) -> VisionSourceKind {
        match self {
            Self::Tower(tier) => VisionSourceKind::Tower(tier),
            Self::Ancient => VisionSourceKind::Ancient,
        }
    }
}

/// Every kind of entity that grants vision on the fog overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisionSourceKind {
    /// Observer ward, grants vision for a limited time.
    ObserverWard,
    /// Sentry ward, grants true sight and a tiny vision radius.
    SentryWard,
    /// Defensive tower.
    Tower(TowerTier),
    /// Team ancient.
    Ancient,
}

impl VisionSourceKind {
    /// Vision radius in world units for the given time of day.
    #[must_use]
    pub const fn radius(self, is_day: bool) -> f32 {
        match self {
            Self::ObserverWard => 1600.0,
            Self::SentryWard => 150.0,
            Self::Tower(TowerTier::One) => {
                if is_day {
                    1900.0
                } else {
                    600.0 + BuildingKind::Tower(TowerTier::One).collision_radius()
                }
            }
            Self::Tower(_) => {
                if is_day {
                    1900.0
                } else {
                    1100.0
                }
            }
            Self::Ancient => 2600.0,
        }
    }

    /// Vision radius expressed in vision cells, rounded up.
    #[must_use]
    pub fn grid_radius(self, is_day: bool) -> i32 {
        (self.radius(is_day) / VISION_CELL_SIZE).ceil() as i32
    }

    /// Seconds the source lasts after placement, `None` when permanent.
    #[must_use]
    pub const fn lifetime(self) -> Option<f64> {
        match self {
            Self::ObserverWard => Some(OBSERVER_DURATION),
            _ => None,
        }
    }
}

/// Which teams contribute to a combined visibility query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamView {
    /// Radiant sources only.
    Radiant,
    /// Dire sources only.
    Dire,
    /// Sources of both teams.
    Both,
}

impl TeamView {
    /// Whether sources of the team are part of the view.
    #[must_use]
    pub const fn includes(self, team: Team) -> bool {
        matches!(
            (self, team),
            (Self::Both, _) | (Self::Radiant, Team::Radiant) | (Self::Dire, Team::Dire)
        )
    }
}

/// Immutable representation of a static structure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingSnapshot {
    /// Identity of the structure.
    pub id: BuildingId,
    /// Kind of structure.
    pub kind: BuildingKind,
    /// Owning team.
    pub team: Team,
    /// World position of the structure's center.
    pub position: WorldPoint,
}

/// Tree loaded from static map data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeRecord {
    /// World position of the trunk.
    pub position: WorldPoint,
    /// Vision cell holding the trunk.
    pub cell: VisionCell,
    /// Height of the tree; it occludes eyes strictly below this value.
    pub elevation: i32,
}

/// Static per-cell data consumed by the vision simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct VisionTerrain {
    width: i32,
    height: i32,
    elevation: HashMap<VisionCell, i32>,
    elevation_levels: Vec<i32>,
    nav_blocked: HashSet<VisionCell>,
    opaque: HashSet<VisionCell>,
    no_wards: HashSet<VisionCell>,
}

impl Default for VisionTerrain {
    fn default() -> Self {
        Self::new(VISION_GRID_DIMENSION, VISION_GRID_DIMENSION)
    }
}

impl VisionTerrain {
    /// Creates terrain with no data for a grid of the given size.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            elevation: HashMap::new(),
            elevation_levels: Vec::new(),
            nav_blocked: HashSet::new(),
            opaque: HashSet::new(),
            no_wards: HashSet::new(),
        }
    }

    /// Creates terrain where every cell has the same elevation.
    #[must_use]
    pub fn flat(width: i32, height: i32, elevation: i32) -> Self {
        let mut terrain = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                terrain.set_elevation(VisionCell::new(x, y), elevation);
            }
        }
        terrain
    }

    /// Grid dimensions as `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: VisionCell) -> bool {
        cell.is_within(self.width, self.height)
    }

    /// Records the elevation of a cell and registers the level.
    pub fn set_elevation(&mut self, cell: VisionCell, elevation: i32) {
        let _ = self.elevation.insert(cell, elevation);
        self.add_elevation_level(elevation);
    }

    /// Registers an elevation level present on the map.
    pub fn add_elevation_level(&mut self, elevation: i32) {
        if let Err(index) = self.elevation_levels.binary_search(&elevation) {
            self.elevation_levels.insert(index, elevation);
        }
    }

    /// Marks a cell as blocked for ground navigation.
    pub fn mark_nav_blocked(&mut self, cell: VisionCell) {
        let _ = self.nav_blocked.insert(cell);
    }

    /// Marks a cell as an opaque vision blocker.
    pub fn mark_opaque(&mut self, cell: VisionCell) {
        let _ = self.opaque.insert(cell);
    }

    /// Marks a cell as forbidden for ward placement.
    pub fn mark_no_ward(&mut self, cell: VisionCell) {
        let _ = self.no_wards.insert(cell);
    }

    /// Elevation of a cell, `None` when the data has no entry.
    #[must_use]
    pub fn elevation(&self, cell: VisionCell) -> Option<i32> {
        self.elevation.get(&cell).copied()
    }

    /// Sorted distinct elevation levels present on the map.
    #[must_use]
    pub fn elevation_levels(&self) -> &[i32] {
        &self.elevation_levels
    }

    /// Whether the cell is blocked for ground navigation.
    #[must_use]
    pub fn is_nav_blocked(&self, cell: VisionCell) -> bool {
        self.nav_blocked.contains(&cell)
    }

    /// Whether the cell blocks light.
    #[must_use]
    pub fn is_opaque(&self, cell: VisionCell) -> bool {
        self.opaque.contains(&cell)
    }

    /// Whether wards may not be placed in the cell.
    #[must_use]
    pub fn is_no_ward(&self, cell: VisionCell) -> bool {
        self.no_wards.contains(&cell)
    }
}

/// Read access to dynamic tree occlusion on the vision grid.
pub trait TreeOcclusion {
    /// Whether an alive tree taller than `eye_elevation` covers the cell.
    fn blocks_light(&self, cell: VisionCell, eye_elevation: i32) -> bool;

    /// Whether any alive tree footprint covers the cell.
    fn is_covered(&self, cell: VisionCell) -> bool;
}
