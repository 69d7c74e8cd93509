//! Host-facing control surface over the world, the loop and the fog of war.

use std::collections::BTreeSet;
use std::time::Instant;

use lanewatch_core::{
    BuildingId, BuildingKind, Command, Event, PathPlan, PlacementError, Team, TeamView, UnitId,
    VisionCell, VisionTerrain, WalkOptions, WardId, Waypoint, WorldPoint,
};
use lanewatch_system_vision::{FogOfWar, VisionSimulator, Ward, WardKind};
use lanewatch_world::{self as world, query, World};
use tracing::debug;

use crate::{heroes::plan_route, CombatLoop, SimulationConfig};

/// Distance within which a click selects a unit.
pub const HIT_TEST_RADIUS: f32 = 30.0;

/// Failures of host control operations. A failed operation changes nothing.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ControlError {
    /// No alive unit with the identifier exists.
    #[error("unit {} does not exist", .0.get())]
    UnknownUnit(UnitId),
    /// The operation only applies to heroes.
    #[error("unit {} is not a hero", .0.get())]
    NotAHero(UnitId),
    /// The search could not connect two consecutive route points.
    #[error("no path from {from:?} to {to:?}")]
    Unreachable {
        /// Start of the failing leg.
        from: WorldPoint,
        /// End of the failing leg.
        to: WorldPoint,
    },
    /// A ward could not be placed, moved or removed.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// No tree covers the cell.
    #[error("no tree covers vision cell ({}, {})", .0.x(), .0.y())]
    NoTree(VisionCell),
}

/// Counters for presentation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationStats {
    /// Simulated seconds since the horn.
    pub game_time: f64,
    /// Wave due at the current time.
    pub wave_number: u32,
    /// Alive Radiant creeps.
    pub radiant_creeps: usize,
    /// Alive Dire creeps.
    pub dire_creeps: usize,
    /// Alive heroes.
    pub heroes: usize,
    /// Wards on the map.
    pub wards: usize,
    /// Wards close to expiring.
    pub expiring_wards: usize,
}

/// World, combat loop and fog of war driven as one simulation.
///
/// Every call that changes observable state raises a dirty flag which the
/// host collects with [`Simulation::take_dirty`] to decide when to redraw.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    combat: CombatLoop,
    fog: FogOfWar,
    events: Vec<Event>,
    dirty: bool,
}

impl Simulation {
    /// Creates a paused simulation over the world and vision terrain.
    #[must_use]
    pub fn new(config: &SimulationConfig, world: World, terrain: VisionTerrain) -> Self {
        Self {
            world,
            combat: config.combat_loop(),
            fog: FogOfWar::new(VisionSimulator::new(terrain)),
            events: Vec::new(),
            dirty: true,
        }
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Tick orchestrator.
    #[must_use]
    pub fn combat(&self) -> &CombatLoop {
        &self.combat
    }

    /// Ward and building vision overlay.
    #[must_use]
    pub fn fog(&self) -> &FogOfWar {
        &self.fog
    }

    /// Events produced by the most recent mutating call.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.events
    }

    /// Returns whether state changed since the previous call and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Whether wall-clock ticks are currently ignored.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.combat.is_paused()
    }

    /// Resumes wall-clock ticking.
    pub fn play(&mut self) {
        self.combat.play();
        self.dirty = true;
    }

    /// Suspends wall-clock ticking.
    pub fn pause(&mut self) {
        self.combat.pause();
        self.dirty = true;
    }

    /// Switches between playing and paused.
    pub fn toggle(&mut self) {
        self.combat.toggle();
        self.dirty = true;
    }

    /// Rewinds to the horn, removing creeps and wards.
    pub fn reset(&mut self) {
        self.events.clear();
        self.combat.reset(&mut self.world, &mut self.events);
        self.fog.clear_wards();
        let _ = self.fog.set_game_time(0.0);
        self.dirty = true;
    }

    /// Advances by a wall-clock delta whether paused or not.
    pub fn update(&mut self, dt: f64) {
        self.events.clear();
        self.combat.update(&mut self.world, dt, &mut self.events);
        self.sync_clock();
    }

    /// Ticks from the wall clock; a no-op while paused.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Ticks as if the wall clock read `now`.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.events.clear();
        let simulated = self.combat.tick_at(&mut self.world, now, &mut self.events);
        if simulated > 0.0 {
            self.sync_clock();
        }
        simulated
    }

    /// Moves the clock, replaying waves on large jumps.
    pub fn set_game_time(&mut self, seconds: f64) {
        self.events.clear();
        self.combat.set_game_time(&mut self.world, seconds, &mut self.events);
        self.sync_clock();
    }

    /// Creates a hero with default attributes.
    pub fn create_hero(&mut self, team: Team, position: WorldPoint, name: &str) -> Option<UnitId> {
        self.events.clear();
        world::apply(
            &mut self.world,
            Command::CreateHero {
                team,
                position,
                name: name.to_owned(),
            },
            &mut self.events,
        );
        self.dirty = true;
        self.spawned_unit()
    }

    /// Places a static structure and drops cached building vision.
    pub fn place_building(
        &mut self,
        kind: BuildingKind,
        team: Team,
        position: WorldPoint,
    ) -> Option<BuildingId> {
        self.events.clear();
        world::apply(
            &mut self.world,
            Command::PlaceBuilding {
                kind,
                team,
                position,
            },
            &mut self.events,
        );
        self.fog.invalidate_building_cache();
        self.dirty = true;
        self.events.iter().find_map(|event| match event {
            Event::BuildingPlaced { building, .. } => Some(*building),
            _ => None,
        })
    }

    /// Appends a waypoint to a hero's plan and replans the whole route.
    ///
    /// The route runs from the hero's position through every waypoint. When
    /// any leg is unreachable the waypoint is rejected and the plan is kept.
    pub fn add_waypoint(
        &mut self,
        hero: UnitId,
        position: WorldPoint,
    ) -> Result<Waypoint, ControlError> {
        let (from, radius, mut plan) = self.hero_plan(hero)?;
        let waypoint = Waypoint {
            id: u32::try_from(plan.waypoints.len())
                .map_or(u32::MAX, |count| count.saturating_add(1)),
            position,
        };
        plan.waypoints.push(waypoint);
        let route = plan_route(
            self.combat.pathfinder(),
            query::navigation(&self.world),
            from,
            &plan.waypoints,
            &WalkOptions::ground(radius),
        )
        .map_err(|error| {
            debug!(hero = hero.get(), %error, "waypoint rejected");
            error
        })?;

        plan.current_path = route;
        plan.path_index = 0;
        self.store_plan(hero, plan);
        Ok(waypoint)
    }

    /// Removes the newest waypoint and replans the remaining route.
    pub fn remove_last_waypoint(&mut self, hero: UnitId) -> Result<Option<Waypoint>, ControlError> {
        let (from, radius, mut plan) = self.hero_plan(hero)?;
        let Some(removed) = plan.waypoints.pop() else {
            return Ok(None);
        };
        match plan_route(
            self.combat.pathfinder(),
            query::navigation(&self.world),
            from,
            &plan.waypoints,
            &WalkOptions::ground(radius),
        ) {
            Ok(route) if !route.is_empty() => {
                plan.current_path = route;
                plan.path_index = 0;
            }
            _ => plan.clear_path(),
        }
        self.store_plan(hero, plan);
        Ok(Some(removed))
    }

    /// Drops every waypoint and the computed path of a hero.
    pub fn clear_waypoints(&mut self, hero: UnitId) -> Result<(), ControlError> {
        let _ = self.hero_plan(hero)?;
        self.store_plan(hero, PathPlan::default());
        Ok(())
    }

    /// Starts walking the computed route. Returns `false` for an empty route.
    pub fn start_moving(&mut self, hero: UnitId) -> Result<bool, ControlError> {
        let (_, _, mut plan) = self.hero_plan(hero)?;
        if plan.current_path.is_empty() {
            return Ok(false);
        }
        plan.is_moving = true;
        self.store_plan(hero, plan);
        Ok(true)
    }

    /// Stops a hero in place, keeping its route.
    pub fn stop_moving(&mut self, hero: UnitId) -> Result<(), ControlError> {
        let (_, _, mut plan) = self.hero_plan(hero)?;
        plan.is_moving = false;
        self.store_plan(hero, plan);
        Ok(())
    }

    /// Pulls enemy creeps near the hero into a chase, returning how many answered.
    pub fn draw_aggro(&mut self, hero: UnitId) -> usize {
        self.events.clear();
        let pulled = self.combat.draw_aggro(&mut self.world, hero, &mut self.events);
        self.dirty |= pulled > 0;
        pulled
    }

    /// First alive unit within [`HIT_TEST_RADIUS`] of the point.
    #[must_use]
    pub fn hit_test(&self, point: WorldPoint) -> Option<UnitId> {
        query::hit_test(&self.world, point, HIT_TEST_RADIUS)
    }

    /// Places a ward at the current game time.
    pub fn place_ward(
        &mut self,
        team: Team,
        kind: WardKind,
        position: WorldPoint,
    ) -> Result<WardId, ControlError> {
        let id = self
            .fog
            .place_ward(query::trees(&self.world), team, kind, position)?;
        self.dirty = true;
        Ok(id)
    }

    /// Moves a ward; an invalid target leaves it where it was.
    pub fn move_ward(&mut self, id: WardId, position: WorldPoint) -> Result<(), ControlError> {
        self.fog.move_ward(query::trees(&self.world), id, position)?;
        self.dirty = true;
        Ok(())
    }

    /// Removes a ward.
    pub fn remove_ward(&mut self, id: WardId) -> Result<Ward, ControlError> {
        let ward = self.fog.remove_ward(id)?;
        self.dirty = true;
        Ok(ward)
    }

    /// Removes every ward.
    pub fn clear_wards(&mut self) {
        self.fog.clear_wards();
        self.dirty = true;
    }

    /// Ward near the point, if any.
    #[must_use]
    pub fn ward_at(&self, point: WorldPoint) -> Option<WardId> {
        self.fog.hit_test_ward(point)
    }

    /// Flips every tree covering the cell, returning how many changed.
    pub fn toggle_tree(&mut self, cell: VisionCell) -> Result<usize, ControlError> {
        self.events.clear();
        world::apply(&mut self.world, Command::ToggleTree { cell }, &mut self.events);
        let toggled = self.events.iter().find_map(|event| match event {
            Event::TreesToggled { count, .. } => Some(*count),
            _ => None,
        });
        let count = toggled.ok_or(ControlError::NoTree(cell))?;
        self.fog.invalidate_building_cache();
        self.dirty = true;
        Ok(count)
    }

    /// Switches between day and night vision.
    pub fn set_daytime(&mut self, is_day: bool) {
        if self.fog.is_day() != is_day {
            self.fog.set_daytime(is_day);
            self.dirty = true;
        }
    }

    /// Cells seen by buildings and observer wards of the view's teams.
    pub fn visibility(&mut self, view: TeamView) -> BTreeSet<VisionCell> {
        let buildings = query::buildings(&self.world);
        self.fog
            .combined_visibility(query::trees(&self.world), &buildings, view)
    }

    /// Cells seen by a single ward.
    pub fn ward_vision(&mut self, id: WardId) -> BTreeSet<VisionCell> {
        self.fog.ward_vision(query::trees(&self.world), id)
    }

    /// Counters for presentation.
    #[must_use]
    pub fn stats(&self) -> SimulationStats {
        let game_time = query::game_time(&self.world);
        let population = query::population(&self.world);
        SimulationStats {
            game_time,
            wave_number: self
                .combat
                .waves()
                .schedule()
                .wave_number(game_time)
                .unwrap_or(0),
            radiant_creeps: population.radiant_creeps,
            dire_creeps: population.dire_creeps,
            heroes: population.heroes,
            wards: self.fog.wards().count(),
            expiring_wards: self
                .fog
                .wards()
                .filter(|ward| ward.is_expiring(self.fog.game_time()))
                .count(),
        }
    }

    fn sync_clock(&mut self) {
        let _ = self.fog.set_game_time(query::game_time(&self.world));
        self.dirty = true;
    }

    fn spawned_unit(&self) -> Option<UnitId> {
        self.events.iter().find_map(|event| match event {
            Event::UnitSpawned { unit, .. } => Some(*unit),
            _ => None,
        })
    }

    fn hero_plan(&self, hero: UnitId) -> Result<(WorldPoint, f32, PathPlan), ControlError> {
        let unit = query::unit(&self.world, hero)
            .filter(|unit| unit.alive)
            .ok_or(ControlError::UnknownUnit(hero))?;
        if !unit.is_hero() {
            return Err(ControlError::NotAHero(hero));
        }
        Ok((unit.position, unit.collision_radius, unit.path_plan))
    }

    fn store_plan(&mut self, hero: UnitId, plan: PathPlan) {
        self.events.clear();
        world::apply(
            &mut self.world,
            Command::ReplacePathPlan { unit: hero, plan },
            &mut self.events,
        );
        self.dirty = true;
    }
}
