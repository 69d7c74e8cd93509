#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lanewatch tactical simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems read immutable snapshots
//! such as [`UnitView`] and respond with [`Command`] batches; the world
//! executes those commands through its `apply` entry point and reports the
//! outcome as [`Event`] values. Coordinate spaces and their conversions live
//! in this crate as well so every component speaks the same geometry.

mod coords;
mod lanes;
mod navigation;
mod units;
mod vision;

use serde::{Deserialize, Serialize};

pub use coords::{
    CanvasPoint, CoordinateTransform, NavCell, VisionCell, WorldPoint, DEFAULT_NAV_DIMENSION,
    NAV_CELL_SIZE, VISION_CELL_SIZE, VISION_GRID_DIMENSION, WORLD_MAX, WORLD_MIN, WORLD_SIZE,
};
pub use lanes::{LanePath, LanePaths, TeamLanes};
pub use navigation::{WalkOptions, Walkability};
pub use units::{
    AttackState, CombatStats, CreepBehavior, CreepKind, CreepState, Health, PathPlan, UnitRole,
    UnitSnapshot, UnitView, VisionStats, Waypoint, CREEP_MAX_UPGRADES, CREEP_MOVE_SPEED,
    CREEP_UPGRADE_INTERVAL, CREEP_VISION_RANGE, HERO_COLLISION_RADIUS, NEVER,
};
pub use vision::{
    BuildingKind, BuildingSnapshot, TeamView, TowerTier, TreeOcclusion, TreeRecord,
    VisionSourceKind, VisionTerrain, OBSERVER_DURATION, SENTRY_TRUE_SIGHT_RADIUS,
    WARD_EXPIRY_WARNING,
};

/// Collision radius of a tree trunk in world units.
pub const TREE_COLLISION_RADIUS: f32 = 64.0;

/// Unique identifier assigned to every unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to every static structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to every placed ward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WardId(u32);

impl WardId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to every tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeId(u32);

impl TreeId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// The two opposing sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// South-west team.
    Radiant,
    /// North-east team.
    Dire,
}

impl Team {
    /// Both teams in spawn order.
    pub const ALL: [Team; 2] = [Team::Radiant, Team::Dire];

    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Radiant => Self::Dire,
            Self::Dire => Self::Radiant,
        }
    }
}

/// The three lanes creeps walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    /// Top lane.
    Top,
    /// Middle lane.
    Mid,
    /// Bottom lane.
    Bot,
}

impl Lane {
    /// All lanes in spawn order.
    pub const ALL: [Lane; 3] = [Lane::Top, Lane::Mid, Lane::Bot];
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock.
    AdvanceClock {
        /// Simulated seconds that elapsed.
        dt: f64,
    },
    /// Moves the simulation clock to an absolute time.
    SetClock {
        /// Simulated seconds since the horn.
        seconds: f64,
    },
    /// Replaces the lane polylines walked by creeps.
    ConfigureLanes {
        /// Lane paths of both teams.
        paths: LanePaths,
    },
    /// Creates a lane creep.
    SpawnCreep {
        /// Team the creep fights for.
        team: Team,
        /// Lane the creep walks.
        lane: Lane,
        /// Archetype of the creep.
        kind: CreepKind,
        /// Wave number the creep belongs to.
        wave: u32,
        /// Game time of the wave, used to apply stat upgrades.
        spawn_time: f64,
        /// Initial world position.
        position: WorldPoint,
    },
    /// Creates a player-controlled hero with default attributes.
    CreateHero {
        /// Team the hero fights for.
        team: Team,
        /// Initial world position.
        position: WorldPoint,
        /// Display name.
        name: String,
    },
    /// Places a static structure.
    PlaceBuilding {
        /// Kind of structure.
        kind: BuildingKind,
        /// Owning team.
        team: Team,
        /// World position of the structure's center.
        position: WorldPoint,
    },
    /// Removes a unit from the registry.
    RemoveUnit {
        /// Unit to remove.
        unit: UnitId,
    },
    /// Moves a unit to a new position.
    MoveUnit {
        /// Unit to move.
        unit: UnitId,
        /// Destination in world units.
        position: WorldPoint,
    },
    /// Stores the AI state computed for a creep.
    UpdateCreep {
        /// Creep to update.
        unit: UnitId,
        /// New behavior state.
        state: CreepState,
    },
    /// Deals damage to a unit.
    ApplyDamage {
        /// Attacking unit, if any.
        source: Option<UnitId>,
        /// Unit receiving the damage.
        target: UnitId,
        /// Damage after reductions.
        amount: f32,
    },
    /// Replaces the movement plan of a unit.
    ReplacePathPlan {
        /// Unit whose plan changes.
        unit: UnitId,
        /// New plan.
        plan: PathPlan,
    },
    /// Toggles alive state of every tree covering the vision cell.
    ToggleTree {
        /// Cell inside the footprint of the trees to toggle.
        cell: VisionCell,
    },
    /// Removes every dead unit from the registry.
    PurgeDead,
    /// Removes every creep from the registry.
    ClearCreeps,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Simulated seconds that elapsed.
        dt: f64,
        /// Game time after the advance.
        now: f64,
    },
    /// Indicates that the simulation clock jumped.
    ClockSet {
        /// Game time after the jump.
        seconds: f64,
    },
    /// Confirms that lane paths were replaced.
    LanesConfigured,
    /// Confirms that a unit joined the registry.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Team of the unit.
        team: Team,
    },
    /// Confirms that a structure was placed.
    BuildingPlaced {
        /// Identifier assigned to the structure.
        building: BuildingId,
        /// Kind of structure.
        kind: BuildingKind,
    },
    /// Reports damage dealt to a unit.
    UnitDamaged {
        /// Attacking unit, if any.
        source: Option<UnitId>,
        /// Unit that took the damage.
        target: UnitId,
        /// Damage dealt.
        amount: f32,
        /// Hit points left after the hit.
        remaining: f32,
    },
    /// Reports that a unit ran out of hit points.
    UnitDied {
        /// Unit that died.
        unit: UnitId,
    },
    /// Confirms that a unit left the registry.
    UnitRemoved {
        /// Unit that was removed.
        unit: UnitId,
    },
    /// Confirms that a unit's movement plan changed.
    PathPlanChanged {
        /// Unit whose plan changed.
        unit: UnitId,
    },
    /// Confirms that trees changed alive state.
    TreesToggled {
        /// Cell the toggle was requested for.
        cell: VisionCell,
        /// Number of trees whose state flipped.
        count: usize,
    },
    /// Reports that a unit command could not be executed.
    CommandRejected {
        /// Unit named by the command.
        unit: UnitId,
        /// Reason for the rejection.
        reason: CommandRejection,
    },
    /// Reports that no tree covers the requested cell.
    TreeToggleRejected {
        /// Cell named by the command.
        cell: VisionCell,
    },
}

/// Reasons a unit command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandRejection {
    /// No unit with the provided identifier exists.
    UnknownUnit,
    /// The unit is dead and no longer accepts orders.
    DeadUnit,
    /// The command only applies to creeps.
    NotACreep,
}

/// Reasons a ward placement may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The cell lies outside the vision grid.
    #[error("cell lies outside the map")]
    OutOfBounds,
    /// The cell is blocked terrain.
    #[error("cell is blocked terrain")]
    NavigationBlocked,
    /// The cell lies inside a no-ward zone.
    #[error("cell lies inside a no-ward zone")]
    NoWardZone,
    /// An alive tree covers the cell.
    #[error("cell is covered by a tree")]
    TreeOccupied,
    /// No ward with the provided identifier exists.
    #[error("ward does not exist")]
    UnknownWard,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let decoded: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&decoded, value);
    }

    #[test]
    fn opponent_is_symmetric() {
        for team in Team::ALL {
            assert_eq!(team.opponent().opponent(), team);
            assert_ne!(team.opponent(), team);
        }
    }

    #[test]
    fn placement_error_round_trips_through_bincode() {
        assert_round_trip(&PlacementError::NoWardZone);
    }

    #[test]
    fn creep_state_round_trips_through_bincode() {
        assert_round_trip(&CreepState::new(CreepKind::Flagbearer, Lane::Bot, 4));
    }

    #[test]
    fn placement_errors_describe_themselves() {
        assert_eq!(PlacementError::TreeOccupied.to_string(), "cell is covered by a tree");
    }
}
