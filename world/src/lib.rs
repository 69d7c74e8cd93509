#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for Lanewatch.
//!
//! The [`World`] owns the unit registry, static structures, lane paths, the
//! navigation grid with its tree table, and the simulated clock. Every
//! mutation goes through [`apply`]; systems observe the state through the
//! read-only functions in [`query`].

mod loader;
mod navigation;
mod trees;

use std::collections::BTreeMap;

use lanewatch_core::{
    BuildingId, BuildingKind, CombatStats, Command, CommandRejection, CoordinateTransform,
    CreepBehavior, CreepState, Event, LanePaths, PathPlan, Team, UnitId, UnitRole, UnitSnapshot,
    VisionStats, WorldPoint, HERO_COLLISION_RADIUS,
};
use tracing::{debug, trace, warn};

pub use loader::{parse_lane_paths, parse_vision_data, LoadError, VisionData};
pub use navigation::{NavigationGrid, WalkabilityField};
pub use trees::TreeTable;

#[derive(Clone, Debug)]
struct Unit {
    id: UnitId,
    team: Team,
    position: WorldPoint,
    alive: bool,
    collision_radius: f32,
    stats: CombatStats,
    vision: VisionStats,
    path_plan: PathPlan,
    role: UnitRole,
}

impl Unit {
    fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            team: self.team,
            position: self.position,
            alive: self.alive,
            collision_radius: self.collision_radius,
            stats: self.stats,
            vision: self.vision,
            path_plan: self.path_plan.clone(),
            role: self.role.clone(),
        }
    }

    fn is_creep(&self) -> bool {
        matches!(self.role, UnitRole::Creep(_))
    }
}

#[derive(Clone, Copy, Debug)]
struct Building {
    kind: BuildingKind,
    team: Team,
    position: WorldPoint,
}

/// Represents the authoritative Lanewatch world state.
#[derive(Debug)]
pub struct World {
    navigation: NavigationGrid,
    lanes: LanePaths,
    units: BTreeMap<UnitId, Unit>,
    buildings: BTreeMap<BuildingId, Building>,
    game_time: f64,
    next_unit_id: u32,
    next_building_id: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a world over a fully walkable map without trees or lanes.
    #[must_use]
    pub fn new() -> Self {
        let (width, height) = CoordinateTransform::default().nav_dimensions();
        Self::with_navigation(NavigationGrid::open(width, height))
    }

    /// Creates a world over the provided navigation grid.
    #[must_use]
    pub fn with_navigation(navigation: NavigationGrid) -> Self {
        Self {
            navigation,
            lanes: LanePaths::default(),
            units: BTreeMap::new(),
            buildings: BTreeMap::new(),
            game_time: 0.0,
            next_unit_id: 1,
            next_building_id: 1,
        }
    }

    fn allocate_unit_id(&mut self) -> UnitId {
        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.wrapping_add(1);
        id
    }

    fn insert_unit(&mut self, unit: Unit, out_events: &mut Vec<Event>) {
        let (id, team) = (unit.id, unit.team);
        let _ = self.units.insert(id, unit);
        out_events.push(Event::UnitSpawned { unit: id, team });
    }

    fn live_unit_mut(
        &mut self,
        id: UnitId,
        out_events: &mut Vec<Event>,
    ) -> Option<&mut Unit> {
        let reason = match self.units.get(&id).map(|unit| unit.alive) {
            Some(true) => return self.units.get_mut(&id),
            Some(false) => CommandRejection::DeadUnit,
            None => CommandRejection::UnknownUnit,
        };
        if reason == CommandRejection::UnknownUnit {
            warn!(unit = id.get(), "command names an unknown unit");
        } else {
            debug!(unit = id.get(), ?reason, "unit command rejected");
        }
        out_events.push(Event::CommandRejected { unit: id, reason });
        None
    }

    fn remove_where(&mut self, out_events: &mut Vec<Event>, predicate: impl Fn(&Unit) -> bool) {
        let doomed: Vec<UnitId> = self
            .units
            .values()
            .filter(|unit| predicate(unit))
            .map(|unit| unit.id)
            .collect();
        for id in doomed {
            let _ = self.units.remove(&id);
            out_events.push(Event::UnitRemoved { unit: id });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AdvanceClock { dt } => {
            if !dt.is_finite() || dt < 0.0 {
                return;
            }
            world.game_time += dt;
            out_events.push(Event::TimeAdvanced {
                dt,
                now: world.game_time,
            });
        }
        Command::SetClock { seconds } => {
            if !seconds.is_finite() {
                return;
            }
            world.game_time = seconds.max(0.0);
            out_events.push(Event::ClockSet {
                seconds: world.game_time,
            });
        }
        Command::ConfigureLanes { paths } => {
            world.lanes = paths;
            out_events.push(Event::LanesConfigured);
        }
        Command::SpawnCreep {
            team,
            lane,
            kind,
            wave,
            spawn_time,
            position,
        } => {
            let id = world.allocate_unit_id();
            trace!(unit = id.get(), ?team, ?lane, ?kind, wave, "creep spawned");
            world.insert_unit(
                Unit {
                    id,
                    team,
                    position: CoordinateTransform::clamp_to_world(position),
                    alive: true,
                    collision_radius: kind.collision_radius(),
                    stats: kind.stats_at(spawn_time),
                    vision: VisionStats::CREEP,
                    path_plan: PathPlan::default(),
                    role: UnitRole::Creep(CreepState::new(kind, lane, wave)),
                },
                out_events,
            );
        }
        Command::CreateHero {
            team,
            position,
            name,
        } => {
            let id = world.allocate_unit_id();
            debug!(unit = id.get(), ?team, name = name.as_str(), "hero created");
            world.insert_unit(
                Unit {
                    id,
                    team,
                    position: CoordinateTransform::clamp_to_world(position),
                    alive: true,
                    collision_radius: HERO_COLLISION_RADIUS,
                    stats: CombatStats::hero_default(),
                    vision: VisionStats::HERO,
                    path_plan: PathPlan::default(),
                    role: UnitRole::Hero { name },
                },
                out_events,
            );
        }
        Command::PlaceBuilding {
            kind,
            team,
            position,
        } => {
            let building = BuildingId::new(world.next_building_id);
            world.next_building_id = world.next_building_id.wrapping_add(1);
            let _ = world.buildings.insert(
                building,
                Building {
                    kind,
                    team,
                    position,
                },
            );
            out_events.push(Event::BuildingPlaced { building, kind });
        }
        Command::RemoveUnit { unit } => {
            if world.units.remove(&unit).is_some() {
                out_events.push(Event::UnitRemoved { unit });
            } else {
                out_events.push(Event::CommandRejected {
                    unit,
                    reason: CommandRejection::UnknownUnit,
                });
            }
        }
        Command::MoveUnit { unit, position } => {
            if let Some(entry) = world.live_unit_mut(unit, out_events) {
                entry.position = CoordinateTransform::clamp_to_world(position);
            }
        }
        Command::UpdateCreep { unit, state } => {
            let Some(entry) = world.live_unit_mut(unit, out_events) else {
                return;
            };
            match &mut entry.role {
                UnitRole::Creep(current) => *current = state,
                UnitRole::Hero { .. } => out_events.push(Event::CommandRejected {
                    unit,
                    reason: CommandRejection::NotACreep,
                }),
            }
        }
        Command::ApplyDamage {
            source,
            target,
            amount,
        } => {
            let Some(entry) = world.live_unit_mut(target, out_events) else {
                return;
            };
            let remaining = entry.stats.health.damage(amount);
            out_events.push(Event::UnitDamaged {
                source,
                target,
                amount,
                remaining,
            });
            if entry.stats.health.is_depleted() {
                entry.alive = false;
                if let UnitRole::Creep(state) = &mut entry.role {
                    state.behavior = CreepBehavior::Dead;
                }
                debug!(unit = target.get(), killer = ?source.map(|id| id.get()), "unit died");
                out_events.push(Event::UnitDied { unit: target });
            }
        }
        Command::ReplacePathPlan { unit, plan } => {
            if let Some(entry) = world.live_unit_mut(unit, out_events) {
                entry.path_plan = plan;
                out_events.push(Event::PathPlanChanged { unit });
            }
        }
        Command::ToggleTree { cell } => {
            let count = world.navigation.toggle_tree(cell);
            if count == 0 {
                out_events.push(Event::TreeToggleRejected { cell });
            } else {
                debug!(x = cell.x(), y = cell.y(), count, "trees toggled");
                out_events.push(Event::TreesToggled { cell, count });
            }
        }
        Command::PurgeDead => world.remove_where(out_events, |unit| !unit.alive),
        Command::ClearCreeps => world.remove_where(out_events, Unit::is_creep),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use lanewatch_core::{
        BuildingSnapshot, LanePaths, Team, UnitId, UnitRole, UnitSnapshot, UnitView, WorldPoint,
    };

    use super::{NavigationGrid, TreeTable, World};

    /// Simulated seconds since the horn.
    #[must_use]
    pub fn game_time(world: &World) -> f64 {
        world.game_time
    }

    /// Captures a read-only view of every unit in the registry.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.values().map(|unit| unit.snapshot()).collect())
    }

    /// Snapshot of a single unit.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<UnitSnapshot> {
        world.units.get(&id).map(|unit| unit.snapshot())
    }

    /// Static structures sorted by identifier.
    #[must_use]
    pub fn buildings(world: &World) -> Vec<BuildingSnapshot> {
        world
            .buildings
            .iter()
            .map(|(&id, building)| BuildingSnapshot {
                id,
                kind: building.kind,
                team: building.team,
                position: building.position,
            })
            .collect()
    }

    /// Lane paths walked by creeps.
    #[must_use]
    pub fn lanes(world: &World) -> &LanePaths {
        &world.lanes
    }

    /// Navigation grid including the tree table.
    #[must_use]
    pub fn navigation(world: &World) -> &NavigationGrid {
        &world.navigation
    }

    /// Tree table owned by the navigation grid.
    #[must_use]
    pub fn trees(world: &World) -> &TreeTable {
        world.navigation.trees()
    }

    /// First alive unit, in identifier order, within `radius` of the point.
    #[must_use]
    pub fn hit_test(world: &World, point: WorldPoint, radius: f32) -> Option<UnitId> {
        world
            .units
            .values()
            .find(|unit| unit.alive && unit.position.distance(point) <= radius)
            .map(|unit| unit.id)
    }

    /// Alive unit counts for presentation.
    #[must_use]
    pub fn population(world: &World) -> Population {
        let mut population = Population::default();
        for unit in world.units.values().filter(|unit| unit.alive) {
            match (&unit.role, unit.team) {
                (UnitRole::Creep(_), Team::Radiant) => population.radiant_creeps += 1,
                (UnitRole::Creep(_), Team::Dire) => population.dire_creeps += 1,
                (UnitRole::Hero { .. }, _) => population.heroes += 1,
            }
        }
        population
    }

    /// Alive unit counts grouped by role and team.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Population {
        /// Alive Radiant creeps.
        pub radiant_creeps: usize,
        /// Alive Dire creeps.
        pub dire_creeps: usize,
        /// Alive heroes of both teams.
        pub heroes: usize,
    }

    impl Population {
        /// Alive creeps of both teams.
        #[must_use]
        pub const fn creeps(&self) -> usize {
            self.radiant_creeps + self.dire_creeps
        }
    }
}
