//! Unit data model shared by the world and the systems.

use serde::{Deserialize, Serialize};

use crate::{Lane, Team, UnitId, WorldPoint};

/// Movement speed shared by every lane creep.
pub const CREEP_MOVE_SPEED: f32 = 325.0;
/// Day and night vision range of lane creeps.
pub const CREEP_VISION_RANGE: f32 = 750.0;
/// Seconds between two creep stat upgrades.
pub const CREEP_UPGRADE_INTERVAL: f64 = 450.0;
/// Upper bound on accumulated creep upgrades.
pub const CREEP_MAX_UPGRADES: u32 = 30;
/// Collision radius of heroes.
pub const HERO_COLLISION_RADIUS: f32 = 24.0;
/// Sentinel timestamp meaning "long ago" for cooldown bookkeeping.
pub const NEVER: f64 = -999.0;

/// Hit points of a unit. The current value never exceeds the maximum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Creates full health with the given maximum.
    #[must_use]
    pub fn full(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Whether the unit has no hit points left.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Subtracts damage, stopping at zero, and returns the remaining hit points.
    pub fn damage(&mut self, amount: f32) -> f32 {
        self.current = (self.current - amount.max(0.0)).max(0.0);
        self.current
    }

    /// Adds hit points without exceeding the maximum.
    pub fn heal(&mut self, amount: f32) -> f32 {
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current
    }
}

/// Combat attributes of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Current and maximum hit points.
    pub health: Health,
    /// Hit points recovered per second.
    pub hp_regen: f32,
    /// Current mana.
    pub mana: f32,
    /// Maximum mana.
    pub max_mana: f32,
    /// Lowest damage of a single attack.
    pub damage_min: f32,
    /// Highest damage of a single attack.
    pub damage_max: f32,
    /// Seconds between attacks.
    pub attack_rate: f64,
    /// Center distance at which attacks connect.
    pub attack_range: f32,
    /// Distance at which an enemy is acquired as a target.
    pub acquisition_range: f32,
    /// Physical armor.
    pub armor: f32,
    /// Magic resistance percentage.
    pub magic_resist: f32,
    /// World units travelled per second.
    pub move_speed: f32,
}

impl CombatStats {
    /// Default attributes assigned to freshly created heroes.
    #[must_use]
    pub fn hero_default() -> Self {
        Self {
            health: Health::full(600.0),
            hp_regen: 0.0,
            mana: 300.0,
            max_mana: 300.0,
            damage_min: 50.0,
            damage_max: 50.0,
            attack_rate: 1.7,
            attack_range: 150.0,
            acquisition_range: 800.0,
            armor: 2.0,
            magic_resist: 25.0,
            move_speed: 300.0,
        }
    }
}

/// Day and night vision ranges of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisionStats {
    /// Vision range while it is day.
    pub day: f32,
    /// Vision range while it is night.
    pub night: f32,
}

impl VisionStats {
    /// Default vision assigned to heroes.
    pub const HERO: Self = Self {
        day: 1800.0,
        night: 800.0,
    };

    /// Vision shared by lane creeps.
    pub const CREEP: Self = Self {
        day: CREEP_VISION_RANGE,
        night: CREEP_VISION_RANGE,
    };

    /// Range that applies for the given time of day.
    #[must_use]
    pub const fn range(&self, is_day: bool) -> f32 {
        if is_day {
            self.day
        } else {
            self.night
        }
    }
}

/// Lane creep archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreepKind {
    /// Close-combat creep forming the bulk of every wave.
    Melee,
    /// Ranged creep trailing the melee line.
    Ranged,
    /// Slow-firing long-range siege creep.
    Siege,
    /// Melee creep carrying the wave banner.
    Flagbearer,
}

impl CreepKind {
    /// Collision radius of the archetype.
    #[must_use]
    pub const fn collision_radius(self) -> f32 {
        match self {
            Self::Melee | Self::Flagbearer => 64.0,
            Self::Ranged => 40.0,
            Self::Siege => 80.0,
        }
    }

    /// Hit points and damage gained per upgrade cycle.
    #[must_use]
    pub const fn upgrade_step(self) -> (f32, f32) {
        match self {
            Self::Melee | Self::Flagbearer => (12.0, 1.0),
            Self::Ranged => (12.0, 2.0),
            Self::Siege => (0.0, 0.0),
        }
    }

    /// Attributes of the archetype before any upgrade.
    #[must_use]
    pub fn base_stats(self) -> CombatStats {
        let (
            hp,
            hp_regen,
            damage_min,
            damage_max,
            attack_rate,
            attack_range,
            acquisition,
            armor,
            resist,
        ) = match self {
            Self::Melee => (550.0, 0.5, 19.0, 23.0, 1.0, 100.0, 500.0, 2.0, 0.0),
            Self::Ranged => (300.0, 2.0, 21.0, 26.0, 1.0, 500.0, 600.0, 0.0, 0.0),
            Self::Siege => (1300.0, 0.0, 35.0, 46.0, 2.7, 690.0, 800.0, 0.0, 80.0),
            Self::Flagbearer => (550.0, 0.5, 19.0, 23.0, 1.0, 100.0, 500.0, 2.0, 25.0),
        };
        CombatStats {
            health: Health::full(hp),
            hp_regen,
            mana: 0.0,
            max_mana: 0.0,
            damage_min,
            damage_max,
            attack_rate,
            attack_range,
            acquisition_range: acquisition,
            armor,
            magic_resist: resist,
            move_speed: CREEP_MOVE_SPEED,
        }
    }

    /// Attributes of a creep spawned at the given game time, upgrades applied.
    #[must_use]
    pub fn stats_at(self, spawn_time: f64) -> CombatStats {
        let mut stats = self.base_stats();
        let upgrades = upgrade_count(spawn_time) as f32;
        let (hp_step, damage_step) = self.upgrade_step();
        stats.health = Health::full(stats.health.max() + hp_step * upgrades);
        stats.damage_min += damage_step * upgrades;
        stats.damage_max += damage_step * upgrades;
        stats
    }
}

fn upgrade_count(spawn_time: f64) -> u32 {
    if spawn_time <= 0.0 {
        return 0;
    }
    let cycles = (spawn_time / CREEP_UPGRADE_INTERVAL).floor();
    (cycles as u32).min(CREEP_MAX_UPGRADES)
}

/// Behavior states of the creep state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreepBehavior {
    /// Standing still at the end of the lane or between decisions.
    Idle,
    /// Walking the lane polyline.
    LaneMove,
    /// Forced pursuit of an aggro target.
    Chase,
    /// Engaging an acquired target.
    Attack,
    /// Walking to where a lost target was last seen.
    SeekLast,
    /// Rejoining the lane after combat.
    Return,
    /// Terminal state of a killed creep.
    Dead,
}

/// Attack bookkeeping of a creep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackState {
    /// Unit struck by the most recent attack.
    pub target: Option<UnitId>,
    /// Game time of the most recent attack.
    pub last_attack_time: f64,
    /// Progress of the attack animation in `[0, 1]`.
    pub animation: f32,
}

impl Default for AttackState {
    fn default() -> Self {
        Self {
            target: None,
            last_attack_time: NEVER,
            animation: 0.0,
        }
    }
}

/// Per-creep state driven by the creep AI.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreepState {
    /// Archetype of the creep.
    pub kind: CreepKind,
    /// Lane the creep walks.
    pub lane: Lane,
    /// Wave the creep was spawned with.
    pub wave: u32,
    /// Current behavior state.
    pub behavior: CreepBehavior,
    /// Index of the next lane waypoint to reach.
    pub lane_path_index: usize,
    /// Position the creep held before leaving the lane.
    pub remembered_position: Option<WorldPoint>,
    /// Unit the creep is focused on.
    pub aggro_target: Option<UnitId>,
    /// Game time at which aggro was last drawn.
    pub last_aggro_time: f64,
    /// Game time at which the current chase began.
    pub chase_started_at: Option<f64>,
    /// Last known position of a target that left vision.
    pub last_seen: Option<WorldPoint>,
    /// Attack bookkeeping.
    pub attack: AttackState,
    /// Seconds spent waiting behind a blocking ally.
    pub collision_wait: f32,
}

impl CreepState {
    /// Initial state of a freshly spawned creep.
    #[must_use]
    pub fn new(kind: CreepKind, lane: Lane, wave: u32) -> Self {
        Self {
            kind,
            lane,
            wave,
            behavior: CreepBehavior::LaneMove,
            lane_path_index: 1,
            remembered_position: None,
            aggro_target: None,
            last_aggro_time: NEVER,
            chase_started_at: None,
            last_seen: None,
            attack: AttackState::default(),
            collision_wait: 0.0,
        }
    }
}

/// User-placed movement target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Sequence number of the waypoint within its plan.
    pub id: u32,
    /// Target position.
    pub position: WorldPoint,
}

/// Movement intent of a unit plus the path computed from it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPlan {
    /// Waypoints the unit should visit in order.
    pub waypoints: Vec<Waypoint>,
    /// Path computed through the waypoints.
    pub current_path: Vec<WorldPoint>,
    /// Index of the next point of `current_path` to reach.
    pub path_index: usize,
    /// Whether the unit is following `current_path`.
    pub is_moving: bool,
}

impl PathPlan {
    /// Point of the computed path the unit is heading to, if any.
    #[must_use]
    pub fn next_point(&self) -> Option<WorldPoint> {
        self.current_path.get(self.path_index).copied()
    }

    /// Drops the computed path while keeping the waypoints.
    pub fn clear_path(&mut self) {
        self.current_path.clear();
        self.path_index = 0;
        self.is_moving = false;
    }

    /// Whether every point of the computed path has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.path_index >= self.current_path.len()
    }

    /// Walks up to `distance` world units along the computed path from `from`.
    ///
    /// Reached points advance the cursor; the returned position never passes
    /// the point the cursor rests on.
    pub fn advance(&mut self, from: WorldPoint, distance: f32) -> WorldPoint {
        let mut position = from;
        let mut budget = distance.max(0.0);
        while let Some(target) = self.next_point() {
            let gap = position.distance(target);
            if gap <= budget {
                position = target;
                budget -= gap;
                self.path_index += 1;
                continue;
            }
            let ratio = budget / gap;
            return WorldPoint::new(
                position.x() + (target.x() - position.x()) * ratio,
                position.y() + (target.y() - position.y()) * ratio,
            );
        }
        position
    }
}

/// Variant-specific data of a unit.
#[derive(Clone, Debug, PartialEq)]
pub enum UnitRole {
    /// Player-controlled unit.
    Hero {
        /// Display name of the hero.
        name: String,
    },
    /// AI-controlled lane creep.
    Creep(CreepState),
}

/// Immutable representation of a unit used by systems.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identity of the unit.
    pub id: UnitId,
    /// Team the unit fights for.
    pub team: Team,
    /// Current world position.
    pub position: WorldPoint,
    /// Whether the unit is alive.
    pub alive: bool,
    /// Collision radius in world units.
    pub collision_radius: f32,
    /// Combat attributes.
    pub stats: CombatStats,
    /// Vision ranges.
    pub vision: VisionStats,
    /// Movement plan.
    pub path_plan: PathPlan,
    /// Variant-specific data.
    pub role: UnitRole,
}

impl UnitSnapshot {
    /// Creep state of the unit, if it is a creep.
    #[must_use]
    pub fn creep(&self) -> Option<&CreepState> {
        match &self.role {
            UnitRole::Creep(state) => Some(state),
            UnitRole::Hero { .. } => None,
        }
    }

    /// Whether the unit is a player-controlled hero.
    #[must_use]
    pub fn is_hero(&self) -> bool {
        matches!(self.role, UnitRole::Hero { .. })
    }
}

/// Read-only collection of unit snapshots sorted by identity.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a view from unsorted snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over every snapshot in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over units that are still alive.
    pub fn alive(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.alive)
    }

    /// Looks up a unit by identity.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of snapshots in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the view holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, returning the sorted snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}
