//! Aggregate simulation configuration loaded from TOML.

use lanewatch_system_creep_ai as creep_ai;
use lanewatch_system_lane_waves::{self as lane_waves, LaneWaveManager, WaveSchedule};
use lanewatch_system_pathfinding::{self as pathfinding, Pathfinder, DEFAULT_MAX_ITERATIONS};
use serde::{Deserialize, Serialize};

use crate::{CombatLoop, Config, MAX_FRAME_DELTA};

/// Failures raised while loading or validating a [`SimulationConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid TOML or holds unknown keys.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// Time must move forwards.
    #[error("time scale must be positive, got {0}")]
    NonPositiveTimeScale(f64),
    /// The tick clamp must allow some progress.
    #[error("maximum frame delta must be positive, got {0}")]
    NonPositiveFrameDelta(f64),
    /// A search without expansions can never succeed.
    #[error("pathfinding iteration cap must be at least one")]
    ZeroIterationCap,
    /// Waves need a positive spacing.
    #[error("wave interval must be positive, got {0}")]
    NonPositiveWaveInterval(f64),
}

/// Search settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathfindingSection {
    /// Expansion cap of a single search.
    pub max_iterations: usize,
}

impl Default for PathfindingSection {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Creep behavior settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreepSection {
    /// Distance at which a waypoint counts as reached.
    pub arrival_threshold: f32,
    /// Seconds a blocked creep waits before walking around an ally.
    pub collision_wait: f32,
}

impl Default for CreepSection {
    fn default() -> Self {
        let defaults = creep_ai::Config::default();
        Self {
            arrival_threshold: defaults.arrival_threshold(),
            collision_wait: defaults.collision_wait(),
        }
    }
}

/// Everything needed to build a [`CombatLoop`]. Missing keys use defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Multiplier applied to every simulated delta.
    pub time_scale: f64,
    /// Longest wall-clock delta a tick simulates.
    pub max_frame_delta: f64,
    /// Seed of the damage roll generator.
    pub rng_seed: u64,
    /// Search settings.
    pub pathfinding: PathfindingSection,
    /// Creep behavior settings.
    pub creeps: CreepSection,
    /// Wave timing and composition.
    pub waves: WaveSchedule,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_frame_delta: MAX_FRAME_DELTA,
            rng_seed: 0,
            pathfinding: PathfindingSection::default(),
            creeps: CreepSection::default(),
            waves: WaveSchedule::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_scale.is_finite() && self.time_scale > 0.0) {
            return Err(ConfigError::NonPositiveTimeScale(self.time_scale));
        }
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            return Err(ConfigError::NonPositiveFrameDelta(self.max_frame_delta));
        }
        if self.pathfinding.max_iterations == 0 {
            return Err(ConfigError::ZeroIterationCap);
        }
        if !(self.waves.interval.is_finite() && self.waves.interval > 0.0) {
            return Err(ConfigError::NonPositiveWaveInterval(self.waves.interval));
        }
        Ok(())
    }

    /// Builds a paused combat loop with the configured systems.
    #[must_use]
    pub fn combat_loop(&self) -> CombatLoop {
        CombatLoop::with_systems(
            Config::new(self.time_scale, self.max_frame_delta, self.rng_seed),
            LaneWaveManager::new(lane_waves::Config::new(self.waves.clone())),
            creep_ai::CreepAi::new(creep_ai::Config::new(
                self.creeps.arrival_threshold,
                self.creeps.collision_wait,
            )),
            Pathfinder::new(pathfinding::Config::new(self.pathfinding.max_iterations)),
        )
    }
}
