#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative tick orchestration for the Lanewatch simulation.
//!
//! [`CombatLoop`] owns the pure systems and runs them against the [`World`]
//! in a fixed order: the clock advances, due waves spawn, every creep and
//! hero decides from one snapshot, creeps are separated from obstacles and
//! dead units are purged. [`Simulation`] wraps the loop, the world and the
//! fog of war into the control surface a host application drives.

mod config;
mod heroes;
mod simulation;

use std::time::Instant;

use lanewatch_core::{Command, Event, UnitId};
use lanewatch_system_creep_ai::{separation_pass, CreepAi, Frame};
use lanewatch_system_lane_waves::LaneWaveManager;
use lanewatch_system_pathfinding::Pathfinder;
use lanewatch_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

pub use config::{ConfigError, CreepSection, PathfindingSection, SimulationConfig};
pub use heroes::{plan_route, walk_plan, WAYPOINT_REACHED};
pub use simulation::{ControlError, Simulation, SimulationStats, HIT_TEST_RADIUS};

/// Longest wall-clock step a single tick may simulate, in seconds.
pub const MAX_FRAME_DELTA: f64 = 0.1;

/// Clock differences below this many seconds are treated as frame advances
/// by [`CombatLoop::set_game_time`]; larger ones reset and replay.
pub const SCRUB_THRESHOLD: f64 = 1.0;

/// Configuration parameters of the combat loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    time_scale: f64,
    max_frame_delta: f64,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration from the time multiplier, the wall-clock
    /// clamp applied by [`CombatLoop::tick`] and the damage roll seed.
    #[must_use]
    pub const fn new(time_scale: f64, max_frame_delta: f64, rng_seed: u64) -> Self {
        Self {
            time_scale,
            max_frame_delta,
            rng_seed,
        }
    }

    /// Multiplier applied to every simulated delta.
    #[must_use]
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Longest wall-clock delta a tick accepts.
    #[must_use]
    pub const fn max_frame_delta(&self) -> f64 {
        self.max_frame_delta
    }

    /// Seed of the damage roll generator.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(1.0, MAX_FRAME_DELTA, 0)
    }
}

/// Runs the per-tick pipeline over a world.
#[derive(Debug)]
pub struct CombatLoop {
    config: Config,
    waves: LaneWaveManager,
    creeps: CreepAi,
    pathfinder: Pathfinder,
    rng: ChaCha8Rng,
    paused: bool,
    last_tick: Option<Instant>,
}

impl CombatLoop {
    /// Creates a paused loop with default systems.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_systems(
            config,
            LaneWaveManager::default(),
            CreepAi::default(),
            Pathfinder::default(),
        )
    }

    /// Creates a paused loop around the provided systems.
    #[must_use]
    pub fn with_systems(
        config: Config,
        waves: LaneWaveManager,
        creeps: CreepAi,
        pathfinder: Pathfinder,
    ) -> Self {
        Self {
            config,
            waves,
            creeps,
            pathfinder,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            paused: true,
            last_tick: None,
        }
    }

    /// Configuration the loop runs with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Wave manager driven by the loop.
    #[must_use]
    pub fn waves(&self) -> &LaneWaveManager {
        &self.waves
    }

    /// Creep state machine driven by the loop.
    #[must_use]
    pub fn creeps(&self) -> &CreepAi {
        &self.creeps
    }

    /// Search shared by creep detours and hero orders.
    #[must_use]
    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    /// Whether [`CombatLoop::tick`] currently does nothing.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Resumes ticking; the first tick afterwards only anchors the clock.
    pub fn play(&mut self) {
        self.paused = false;
        self.last_tick = None;
    }

    /// Suspends ticking.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Switches between playing and paused.
    pub fn toggle(&mut self) {
        if self.paused {
            self.play();
        } else {
            self.pause();
        }
    }

    /// Pauses, removes every creep and rewinds the clock to the horn.
    ///
    /// Heroes and buildings stay. The damage generator is reseeded so a
    /// replay after a reset rolls the same damage.
    pub fn reset(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        self.pause();
        self.waves.reset();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed);
        world::apply(world, Command::ClearCreeps, out_events);
        world::apply(world, Command::SetClock { seconds: 0.0 }, out_events);
        debug!("combat loop reset");
    }

    /// Advances the simulation by `dt` wall seconds scaled by the time multiplier.
    pub fn update(&mut self, world: &mut World, dt: f64, out_events: &mut Vec<Event>) {
        let dt = dt * self.config.time_scale;
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        world::apply(world, Command::AdvanceClock { dt }, out_events);
        let now = query::game_time(world);

        let mut commands = Vec::new();
        let spawned = self.waves.handle(now, query::lanes(world), &mut commands);
        flush(world, &mut commands, out_events);

        // Creeps spawned above already act in this tick.
        let view = query::unit_view(world);
        {
            let frame = Frame {
                view: &view,
                lanes: query::lanes(world),
                navigation: query::navigation(world),
                pathfinder: &self.pathfinder,
                now,
                dt,
            };
            self.creeps.handle(&frame, &mut self.rng, &mut commands);
        }
        heroes::advance_heroes(&view, dt as f32, &mut commands);
        let decisions = commands.len();
        flush(world, &mut commands, out_events);

        let settled = query::unit_view(world);
        separation_pass(&settled, &query::buildings(world), &mut commands);
        flush(world, &mut commands, out_events);
        world::apply(world, Command::PurgeDead, out_events);

        trace!(now, dt, spawned, decisions, units = settled.len(), "tick");
    }

    /// Ticks from the wall clock. See [`CombatLoop::tick_at`].
    pub fn tick(&mut self, world: &mut World, out_events: &mut Vec<Event>) -> f64 {
        self.tick_at(world, Instant::now(), out_events)
    }

    /// Simulates the wall time elapsed since the previous tick.
    ///
    /// Paused loops do nothing. Deltas above the configured maximum are
    /// clamped so a stalled host never produces a burst of simulated time.
    /// Returns the wall seconds that were simulated before scaling.
    pub fn tick_at(
        &mut self,
        world: &mut World,
        now: Instant,
        out_events: &mut Vec<Event>,
    ) -> f64 {
        if self.paused {
            return 0.0;
        }
        let Some(previous) = self.last_tick.replace(now) else {
            return 0.0;
        };

        let elapsed = now.saturating_duration_since(previous).as_secs_f64();
        let delta = if elapsed > self.config.max_frame_delta {
            warn!(
                elapsed,
                max = self.config.max_frame_delta,
                "frame delta clamped"
            );
            self.config.max_frame_delta
        } else {
            elapsed
        };
        self.update(world, delta, out_events);
        delta
    }

    /// Moves the clock to `seconds`, e.g. when the host scrubs a timeline.
    ///
    /// Differences below [`SCRUB_THRESHOLD`] only set the clock and spawn
    /// newly due waves. Larger jumps clear every creep and replay all waves
    /// from the horn up to the new time.
    pub fn set_game_time(&mut self, world: &mut World, seconds: f64, out_events: &mut Vec<Event>) {
        if !seconds.is_finite() {
            return;
        }
        let seconds = seconds.max(0.0);
        let jump = (seconds - query::game_time(world)).abs();
        if jump >= SCRUB_THRESHOLD {
            debug!(from = query::game_time(world), to = seconds, "replaying waves after time jump");
            self.waves.reset();
            world::apply(world, Command::ClearCreeps, out_events);
        }
        world::apply(world, Command::SetClock { seconds }, out_events);

        let mut commands = Vec::new();
        let _ = self.waves.handle(seconds, query::lanes(world), &mut commands);
        flush(world, &mut commands, out_events);
    }

    /// Pulls enemy creeps near `hero` into a chase. See [`CreepAi::draw_aggro`].
    pub fn draw_aggro(
        &self,
        world: &mut World,
        hero: UnitId,
        out_events: &mut Vec<Event>,
    ) -> usize {
        let mut commands = Vec::new();
        let pulled = self.creeps.draw_aggro(
            &query::unit_view(world),
            hero,
            query::game_time(world),
            &mut commands,
        );
        flush(world, &mut commands, out_events);
        pulled
    }
}

impl Default for CombatLoop {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn flush(world: &mut World, commands: &mut Vec<Command>, out_events: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, out_events);
    }
}
