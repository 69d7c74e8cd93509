#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-keyed lane creep wave scheduling.
//!
//! [`WaveSchedule`] answers which creeps a wave holds at a given game time;
//! [`LaneWaveManager`] turns elapsed waves into spawn commands exactly once.

use lanewatch_core::{Command, CreepKind, Lane, LanePaths, Team, WorldPoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distance between consecutive creeps of a freshly spawned wave.
pub const CREEP_SPACING: f32 = 50.0;

/// Number of creeps of each basic kind in a wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    /// Melee creeps, including the flagbearer when one is due.
    pub melee: u32,
    /// Ranged creeps.
    pub ranged: u32,
    /// Siege creeps sent on siege waves.
    #[serde(default)]
    pub siege: u32,
}

impl Composition {
    /// Creates a composition.
    #[must_use]
    pub const fn new(melee: u32, ranged: u32, siege: u32) -> Self {
        Self {
            melee,
            ranged,
            siege,
        }
    }
}

/// Composition that applies from `time` onwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Game time at which the composition takes effect.
    pub time: f64,
    /// Composition of waves from then on.
    #[serde(flatten)]
    pub composition: Composition,
}

/// Timing and composition rules of lane waves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSchedule {
    /// Seconds between two waves.
    pub interval: f64,
    /// Composition steps; the latest one at or before a wave's time applies.
    pub breakpoints: Vec<Breakpoint>,
    /// Game time of the first flagbearer.
    pub flagbearer_start: f64,
    /// Length of the alternating on/off flagbearer periods.
    pub flagbearer_interval: f64,
    /// Game time before which no siege creep spawns.
    pub siege_start: f64,
    /// First wave carrying siege creeps.
    pub siege_first_wave: u32,
    /// Waves between two siege waves.
    pub siege_wave_period: u32,
}

impl Default for WaveSchedule {
    fn default() -> Self {
        let step = |time, melee, ranged, siege| Breakpoint {
            time,
            composition: Composition::new(melee, ranged, siege),
        };
        Self {
            interval: 30.0,
            breakpoints: vec![
                step(0.0, 3, 1, 0),
                step(900.0, 4, 1, 0),
                step(1_800.0, 5, 1, 0),
                step(2_100.0, 5, 1, 2),
                step(2_400.0, 5, 2, 2),
                step(2_700.0, 6, 2, 2),
            ],
            flagbearer_start: 120.0,
            flagbearer_interval: 60.0,
            siege_start: 300.0,
            siege_first_wave: 10,
            siege_wave_period: 10,
        }
    }
}

impl WaveSchedule {
    /// Wave due at `now`, `None` before the horn or for a broken interval.
    #[must_use]
    pub fn wave_number(&self, now: f64) -> Option<u32> {
        if !now.is_finite() || now < 0.0 || !self.interval.is_finite() || self.interval <= 0.0 {
            return None;
        }
        let wave = (now / self.interval).floor();
        (wave <= f64::from(u32::MAX)).then_some(wave as u32)
    }

    /// Scheduled game time of a wave.
    #[must_use]
    pub fn spawn_time(&self, wave: u32) -> f64 {
        f64::from(wave) * self.interval
    }

    /// Composition in effect at `now`.
    #[must_use]
    pub fn composition_at(&self, now: f64) -> Composition {
        self.breakpoints
            .iter()
            .filter(|breakpoint| breakpoint.time <= now)
            .max_by(|a, b| a.time.total_cmp(&b.time))
            .map(|breakpoint| breakpoint.composition)
            .unwrap_or_default()
    }

    /// Whether a wave spawned at `now` carries a flagbearer.
    #[must_use]
    pub fn has_flagbearer(&self, now: f64) -> bool {
        if now < self.flagbearer_start || self.flagbearer_interval <= 0.0 {
            return false;
        }
        let period = ((now - self.flagbearer_start) / self.flagbearer_interval).floor() as u64;
        period % 2 == 0
    }

    /// Whether a wave spawned at `now` carries siege creeps.
    #[must_use]
    pub fn has_siege(&self, now: f64) -> bool {
        if now < self.siege_start {
            return false;
        }
        let Some(wave) = self.wave_number(now) else {
            return false;
        };
        wave >= self.siege_first_wave
            && (self.siege_wave_period == 0
                || (wave - self.siege_first_wave) % self.siege_wave_period == 0)
    }

    /// Creeps of one lane for a wave spawned at `now`, front to back.
    ///
    /// The flagbearer takes one melee slot and walks behind the melee line,
    /// ranged creeps follow, siege creeps close the wave.
    #[must_use]
    pub fn roster(&self, now: f64) -> Vec<CreepKind> {
        let composition = self.composition_at(now);
        let flagbearer = self.has_flagbearer(now) && composition.melee > 0;
        let melee = if flagbearer {
            composition.melee - 1
        } else {
            composition.melee
        };
        let siege = if self.has_siege(now) {
            composition.siege.max(1)
        } else {
            0
        };

        let total = composition.melee + composition.ranged + siege;
        let mut roster = Vec::with_capacity(total as usize);
        roster.extend(std::iter::repeat(CreepKind::Melee).take(melee as usize));
        if flagbearer {
            roster.push(CreepKind::Flagbearer);
        }
        roster.extend(std::iter::repeat(CreepKind::Ranged).take(composition.ranged as usize));
        roster.extend(std::iter::repeat(CreepKind::Siege).take(siege as usize));
        roster
    }
}

/// Configuration parameters required to construct the wave manager.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    schedule: WaveSchedule,
}

impl Config {
    /// Creates a configuration using the provided schedule.
    #[must_use]
    pub const fn new(schedule: WaveSchedule) -> Self {
        Self { schedule }
    }
}

/// Emits spawn commands for every wave whose time has come.
#[derive(Clone, Debug, Default)]
pub struct LaneWaveManager {
    schedule: WaveSchedule,
    last_spawned_wave: Option<u32>,
}

impl LaneWaveManager {
    /// Creates a manager that has not spawned any wave yet.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            schedule: config.schedule,
            last_spawned_wave: None,
        }
    }

    /// Schedule the manager follows.
    #[must_use]
    pub fn schedule(&self) -> &WaveSchedule {
        &self.schedule
    }

    /// Most recent wave that was spawned.
    #[must_use]
    pub const fn last_spawned_wave(&self) -> Option<u32> {
        self.last_spawned_wave
    }

    /// Spawns, in order, every wave due by `now` that has not spawned yet.
    ///
    /// Returns how many waves were spawned. Calls with a time that does not
    /// reach a new wave emit nothing. Lanes without waypoints are skipped.
    pub fn handle(&mut self, now: f64, lanes: &LanePaths, out: &mut Vec<Command>) -> u32 {
        let Some(due) = self.schedule.wave_number(now) else {
            return 0;
        };
        let first = self.last_spawned_wave.map_or(0, |wave| wave.saturating_add(1));
        if self.last_spawned_wave.is_some_and(|wave| wave >= due) {
            return 0;
        }

        for wave in first..=due {
            self.spawn_wave(wave, lanes, out);
        }
        self.last_spawned_wave = Some(due);
        due - first + 1
    }

    /// Forgets spawned waves so the next call replays from wave zero.
    ///
    /// Live creeps are owned by the world; callers clear them separately.
    pub fn reset(&mut self) {
        self.last_spawned_wave = None;
    }

    fn spawn_wave(&self, wave: u32, lanes: &LanePaths, out: &mut Vec<Command>) {
        let spawn_time = self.schedule.spawn_time(wave);
        let roster = self.schedule.roster(spawn_time);
        debug!(wave, spawn_time, creeps_per_lane = roster.len(), "wave spawned");

        for team in Team::ALL {
            for lane in Lane::ALL {
                let path = lanes.get(team, lane);
                if path.waypoints.is_empty() {
                    continue;
                }
                let (heading_x, heading_y) = path.heading();
                for (slot, &kind) in roster.iter().enumerate() {
                    let offset = slot as f32 * CREEP_SPACING;
                    out.push(Command::SpawnCreep {
                        team,
                        lane,
                        kind,
                        wave,
                        spawn_time,
                        position: WorldPoint::new(
                            path.spawner.x() - heading_x * offset,
                            path.spawner.y() - heading_y * offset,
                        ),
                    });
                }
            }
        }
    }
}
