#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Lane creep behavior state machine.
//!
//! [`CreepAi`] reads one [`UnitView`] snapshot per tick and emits movement,
//! state and damage commands for every alive creep. Every creep decides from
//! the same snapshot, so the order in which creeps think only matters for
//! target tie-breaks, which prefer the nearer unit and then the smaller id.

mod combat;
mod steering;

use lanewatch_core::{
    Command, CreepBehavior, CreepState, LanePath, LanePaths, PathPlan, UnitId, UnitSnapshot,
    UnitView, WalkOptions, Walkability, WorldPoint,
};
use lanewatch_system_pathfinding::Pathfinder;
use rand::Rng;
use tracing::{debug, trace};

pub use combat::{
    armor_multiplier, can_attack, effective_range, physical_damage, roll_damage, ATTACK_ANIMATION,
};
pub use steering::{
    separation_pass, steer, Steer, AVOIDANCE_LOOKAHEAD, SEPARATION_RANGE, SEPARATION_STRENGTH,
};

/// Distance at which a lane waypoint or a last seen position counts as reached.
pub const ARRIVAL_THRESHOLD: f32 = 50.0;
/// Seconds a creep waits behind an ally before walking around it.
pub const COLLISION_WAIT_THRESHOLD: f32 = 0.3;
/// Seconds before a creep can be pulled by a hero again.
pub const AGGRO_COOLDOWN: f64 = 3.0;
/// Seconds a forced chase lasts.
pub const CHASE_DURATION: f64 = 2.3;
/// Distance from the hero within which creeps answer an attack order.
pub const AGGRO_TRIGGER_RANGE: f32 = 500.0;
/// Game time before which creeps ignore attack orders.
pub const AGGRO_IMMUNITY_END: f64 = 300.0;

const FORWARD_SEARCH_SLACK: f32 = 100.0;
const RANGE_SLACK: f32 = 1.0;

/// Configuration parameters of the creep AI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    arrival_threshold: f32,
    collision_wait: f32,
}

impl Config {
    /// Creates a configuration from the waypoint arrival distance and the
    /// seconds a blocked creep waits before detouring.
    #[must_use]
    pub const fn new(arrival_threshold: f32, collision_wait: f32) -> Self {
        Self {
            arrival_threshold,
            collision_wait,
        }
    }

    /// Distance at which a waypoint counts as reached.
    #[must_use]
    pub const fn arrival_threshold(&self) -> f32 {
        self.arrival_threshold
    }

    /// Seconds a blocked creep waits before detouring.
    #[must_use]
    pub const fn collision_wait(&self) -> f32 {
        self.collision_wait
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(ARRIVAL_THRESHOLD, COLLISION_WAIT_THRESHOLD)
    }
}

/// Everything a creep may look at while thinking during one tick.
#[derive(Debug)]
pub struct Frame<'a, W: ?Sized> {
    /// Units as they stood when the tick began.
    pub view: &'a UnitView,
    /// Lane polylines of both teams.
    pub lanes: &'a LanePaths,
    /// Walkability used to validate steps and plan detours.
    pub navigation: &'a W,
    /// Search used when the direct step is blocked.
    pub pathfinder: &'a Pathfinder,
    /// Game time of the tick.
    pub now: f64,
    /// Simulated seconds covered by the tick.
    pub dt: f64,
}

/// Creep state machine emitting commands from a unit snapshot.
#[derive(Debug, Default)]
pub struct CreepAi {
    config: Config,
}

impl CreepAi {
    /// Creates the AI with the provided configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the AI runs with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Runs one decision for every alive creep in the frame's view.
    pub fn handle<W, R>(&mut self, frame: &Frame<'_, W>, rng: &mut R, out: &mut Vec<Command>)
    where
        W: Walkability + ?Sized,
        R: Rng + ?Sized,
    {
        for unit in frame.view.alive() {
            let Some(&state) = unit.creep() else {
                continue;
            };
            if state.behavior == CreepBehavior::Dead {
                continue;
            }

            let lane = frame.lanes.get(unit.team, state.lane);
            let mut decision = Decision::new(unit, state);
            self.think(frame, lane, &mut decision, rng);
            decision.emit(state, out);
        }
    }

    /// Pulls every enemy creep near the hero into a forced chase.
    ///
    /// Creeps ignore the order before [`AGGRO_IMMUNITY_END`], while their
    /// aggro cooldown runs, or beyond [`AGGRO_TRIGGER_RANGE`]. Returns the
    /// number of creeps that answered.
    pub fn draw_aggro(
        &self,
        view: &UnitView,
        hero: UnitId,
        now: f64,
        out: &mut Vec<Command>,
    ) -> usize {
        let Some(hero) = view.get(hero).filter(|unit| unit.alive && unit.is_hero()) else {
            return 0;
        };
        if now < AGGRO_IMMUNITY_END {
            debug!(hero = hero.id.get(), now, "creeps are immune to aggro this early");
            return 0;
        }

        let mut pulled = 0;
        for creep in view.alive().filter(|unit| unit.team != hero.team) {
            let Some(&state) = creep.creep() else {
                continue;
            };
            if state.behavior == CreepBehavior::Dead
                || now - state.last_aggro_time < AGGRO_COOLDOWN
                || creep.position.distance(hero.position) > AGGRO_TRIGGER_RANGE
            {
                continue;
            }
            out.push(Command::UpdateCreep {
                unit: creep.id,
                state: CreepState {
                    behavior: CreepBehavior::Chase,
                    aggro_target: Some(hero.id),
                    last_aggro_time: now,
                    chase_started_at: Some(now),
                    remembered_position: Some(creep.position),
                    ..state
                },
            });
            pulled += 1;
        }
        debug!(hero = hero.id.get(), pulled, "aggro drawn");
        pulled
    }

    fn think<W, R>(&self, frame: &Frame<'_, W>, lane: &LanePath, d: &mut Decision<'_>, rng: &mut R)
    where
        W: Walkability + ?Sized,
        R: Rng + ?Sized,
    {
        match d.state.behavior {
            CreepBehavior::Idle => self.idle(frame, lane, d),
            CreepBehavior::LaneMove => self.lane_move(frame, lane, d),
            CreepBehavior::Attack => self.attack(frame, d, rng),
            CreepBehavior::Chase => self.chase(frame, d),
            CreepBehavior::SeekLast => self.seek_last(frame, d),
            CreepBehavior::Return => self.rejoin_lane(frame, lane, d),
            CreepBehavior::Dead => {}
        }
    }

    fn idle<W>(&self, frame: &Frame<'_, W>, lane: &LanePath, d: &mut Decision<'_>)
    where
        W: Walkability + ?Sized,
    {
        if let Some(target) = acquire(frame.view, d.unit) {
            d.engage(target);
        } else if d.state.lane_path_index < lane.waypoints.len() {
            d.state.behavior = CreepBehavior::LaneMove;
        }
    }

    fn lane_move<W>(&self, frame: &Frame<'_, W>, lane: &LanePath, d: &mut Decision<'_>)
    where
        W: Walkability + ?Sized,
    {
        let sighted = acquire(frame.view, d.unit)
            .or_else(|| nearest_enemy(frame.view, d.unit, d.unit.vision.day));
        if let Some(target) = sighted {
            d.state.remembered_position = Some(d.unit.position);
            d.engage(target);
            return;
        }

        let Some(&waypoint) = lane.waypoints.get(d.state.lane_path_index) else {
            d.state.behavior = CreepBehavior::Idle;
            return;
        };
        if d.unit.position.distance(waypoint) < self.config.arrival_threshold {
            d.state.lane_path_index += 1;
            if d.state.lane_path_index >= lane.waypoints.len() {
                d.state.behavior = CreepBehavior::Idle;
            }
        } else {
            self.move_toward(frame, d, waypoint, 0.0);
        }
    }

    fn attack<W, R>(&self, frame: &Frame<'_, W>, d: &mut Decision<'_>, rng: &mut R)
    where
        W: Walkability + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(target) = live_target(frame.view, d.state.aggro_target) else {
            d.state.aggro_target = None;
            match acquire(frame.view, d.unit) {
                Some(next) => d.state.aggro_target = Some(next.id),
                None => d.state.behavior = CreepBehavior::Return,
            }
            return;
        };
        if d.lose_sight(target) {
            return;
        }

        let range = effective_range(d.unit, target);
        if d.unit.position.distance(target.position) > range {
            self.move_toward(frame, d, target.position, approach_distance(range));
            return;
        }

        if can_attack(&d.state.attack, &d.unit.stats, frame.now) {
            d.state.attack.last_attack_time = frame.now;
            d.state.attack.animation = 0.0;
            d.state.attack.target = Some(target.id);
            d.strike = Some((target.id, roll_damage(&d.unit.stats, &target.stats, rng)));
        }
        if d.state.attack.animation < 1.0 {
            let progress = frame.dt as f32 / ATTACK_ANIMATION;
            d.state.attack.animation = (d.state.attack.animation + progress).min(1.0);
        }
    }

    fn chase<W>(&self, frame: &Frame<'_, W>, d: &mut Decision<'_>)
    where
        W: Walkability + ?Sized,
    {
        let timed_out = d
            .state
            .chase_started_at
            .is_some_and(|started| frame.now - started >= CHASE_DURATION);
        let target = live_target(frame.view, d.state.aggro_target);
        let Some(target) = target.filter(|_| !timed_out) else {
            d.state.aggro_target = None;
            d.state.chase_started_at = None;
            d.state.behavior = CreepBehavior::Return;
            return;
        };
        if d.lose_sight(target) {
            return;
        }

        let range = effective_range(d.unit, target);
        if d.unit.position.distance(target.position) <= range {
            d.state.chase_started_at = None;
            d.state.behavior = CreepBehavior::Attack;
        } else {
            self.move_toward(frame, d, target.position, approach_distance(range));
        }
    }

    fn seek_last<W>(&self, frame: &Frame<'_, W>, d: &mut Decision<'_>)
    where
        W: Walkability + ?Sized,
    {
        let Some(spot) = d.state.last_seen else {
            d.state.behavior = CreepBehavior::Return;
            return;
        };
        if d.unit.position.distance(spot) >= self.config.arrival_threshold {
            self.move_toward(frame, d, spot, 0.0);
            return;
        }

        d.state.last_seen = None;
        match acquire(frame.view, d.unit) {
            Some(target) => d.engage(target),
            None => d.state.behavior = CreepBehavior::Return,
        }
    }

    fn rejoin_lane<W>(&self, frame: &Frame<'_, W>, lane: &LanePath, d: &mut Decision<'_>)
    where
        W: Walkability + ?Sized,
    {
        if let Some(target) = acquire(frame.view, d.unit) {
            d.engage(target);
            return;
        }
        d.state.lane_path_index =
            nearest_forward_waypoint(lane, d.state.lane_path_index, d.unit.position);
        d.state.remembered_position = None;
        d.state.behavior = CreepBehavior::LaneMove;
    }

    /// Steps towards `goal`, detouring along an A* path when the direct
    /// step would enter terrain the creep does not fit through.
    fn move_toward<W>(
        &self,
        frame: &Frame<'_, W>,
        d: &mut Decision<'_>,
        goal: WorldPoint,
        stop_at: f32,
    ) where
        W: Walkability + ?Sized,
    {
        let unit = d.unit;
        if self.follows_detour_to(unit, goal) {
            self.follow(frame, d, unit.path_plan.clone(), goal, stop_at);
            return;
        }
        if !unit.path_plan.current_path.is_empty() {
            d.plan = Some(PathPlan::default());
        }

        let step = steer(
            unit,
            frame.view,
            goal,
            stop_at,
            frame.dt as f32,
            d.state.collision_wait,
            self.config.collision_wait,
        );
        d.state.collision_wait = step.wait;
        if step.position == unit.position {
            return;
        }

        let options = WalkOptions::ground(unit.collision_radius);
        let cell = frame.navigation.transform().world_to_nav(step.position);
        if frame.navigation.is_walkable(cell, &options) {
            d.position = step.position;
            return;
        }

        let path = frame
            .pathfinder
            .find_path(frame.navigation, unit.position, goal, &options);
        if path.is_empty() {
            trace!(unit = unit.id.get(), "no detour around terrain, holding position");
            return;
        }
        trace!(unit = unit.id.get(), points = path.len(), "detour planned");
        let plan = PathPlan {
            waypoints: Vec::new(),
            current_path: path,
            path_index: 0,
            is_moving: true,
        };
        self.follow(frame, d, plan, goal, stop_at);
    }

    fn follows_detour_to(&self, unit: &UnitSnapshot, goal: WorldPoint) -> bool {
        let plan = &unit.path_plan;
        !plan.is_exhausted()
            && plan
                .current_path
                .last()
                .is_some_and(|end| end.distance(goal) <= self.config.arrival_threshold)
    }

    fn follow<W>(
        &self,
        frame: &Frame<'_, W>,
        d: &mut Decision<'_>,
        mut plan: PathPlan,
        goal: WorldPoint,
        stop_at: f32,
    ) where
        W: Walkability + ?Sized,
    {
        let unit = d.unit;
        let remaining = (unit.position.distance(goal) - stop_at).max(0.0);
        let budget = (unit.stats.move_speed * frame.dt as f32).min(remaining);
        d.position = plan.advance(unit.position, budget);
        if plan.is_exhausted() {
            plan = PathPlan::default();
        }
        d.plan = Some(plan);
    }
}

/// Choices made for one creep during a tick.
struct Decision<'a> {
    unit: &'a UnitSnapshot,
    state: CreepState,
    position: WorldPoint,
    plan: Option<PathPlan>,
    strike: Option<(UnitId, f32)>,
}

impl<'a> Decision<'a> {
    fn new(unit: &'a UnitSnapshot, state: CreepState) -> Self {
        Self {
            unit,
            state,
            position: unit.position,
            plan: None,
            strike: None,
        }
    }

    fn engage(&mut self, target: &UnitSnapshot) {
        self.state.aggro_target = Some(target.id);
        self.state.behavior = CreepBehavior::Attack;
    }

    /// Switches to `SeekLast` when the target walked out of vision.
    fn lose_sight(&mut self, target: &UnitSnapshot) -> bool {
        if self.unit.position.distance(target.position) <= self.unit.vision.day {
            return false;
        }
        self.state.last_seen = Some(target.position);
        self.state.aggro_target = None;
        self.state.chase_started_at = None;
        self.state.behavior = CreepBehavior::SeekLast;
        true
    }

    fn emit(self, before: CreepState, out: &mut Vec<Command>) {
        let unit = self.unit.id;
        if self.position != self.unit.position {
            out.push(Command::MoveUnit {
                unit,
                position: self.position,
            });
        }
        if let Some(plan) = self.plan {
            out.push(Command::ReplacePathPlan { unit, plan });
        }
        if self.state != before {
            if self.state.behavior != before.behavior {
                debug!(
                    unit = unit.get(),
                    from = ?before.behavior,
                    to = ?self.state.behavior,
                    "creep behavior changed"
                );
            }
            out.push(Command::UpdateCreep {
                unit,
                state: self.state,
            });
        }
        if let Some((target, amount)) = self.strike {
            out.push(Command::ApplyDamage {
                source: Some(unit),
                target,
                amount,
            });
        }
    }
}

/// Distance to stop short of a target so rounding leaves the mover inside
/// `range` rather than a hair outside it.
fn approach_distance(range: f32) -> f32 {
    (range - RANGE_SLACK).max(0.0)
}

fn live_target(view: &UnitView, target: Option<UnitId>) -> Option<&UnitSnapshot> {
    target
        .and_then(|id| view.get(id))
        .filter(|unit| unit.alive)
}

fn acquire<'v>(view: &'v UnitView, unit: &UnitSnapshot) -> Option<&'v UnitSnapshot> {
    nearest_enemy(view, unit, unit.stats.acquisition_range)
}

fn nearest_enemy<'v>(
    view: &'v UnitView,
    unit: &UnitSnapshot,
    range: f32,
) -> Option<&'v UnitSnapshot> {
    view.alive()
        .filter(|other| other.team != unit.team)
        .map(|other| (unit.position.distance(other.position), other))
        .filter(|(distance, _)| *distance <= range)
        .min_by(|(a, left), (b, right)| a.total_cmp(b).then(left.id.cmp(&right.id)))
        .map(|(_, other)| other)
}

/// Closest waypoint at or after `from`, scanning forward until the
/// distances clearly grow again.
fn nearest_forward_waypoint(lane: &LanePath, from: usize, position: WorldPoint) -> usize {
    let mut best_index = from;
    let mut best_distance = f32::INFINITY;
    for (index, waypoint) in lane.waypoints.iter().enumerate().skip(from) {
        let distance = position.distance(*waypoint);
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
        if distance > best_distance + FORWARD_SEARCH_SLACK {
            break;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanewatch_core::{
        CombatStats, CoordinateTransform, CreepKind, Lane, NavCell, Team, UnitRole, VisionStats,
        HERO_COLLISION_RADIUS, NEVER,
    };
    use lanewatch_system_pathfinding::Config as PathConfig;
    use pretty_assertions::assert_eq;
    use rand::rngs::mock::StepRng;

    struct Open;

    impl Walkability for Open {
        fn transform(&self) -> CoordinateTransform {
            CoordinateTransform::default()
        }

        fn is_walkable(&self, _cell: NavCell, _options: &WalkOptions) -> bool {
            true
        }
    }

    fn creep(id: u32, team: Team, kind: CreepKind, x: f32, y: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            team,
            position: WorldPoint::new(x, y),
            alive: true,
            collision_radius: kind.collision_radius(),
            stats: kind.base_stats(),
            vision: VisionStats::CREEP,
            path_plan: PathPlan::default(),
            role: UnitRole::Creep(CreepState::new(kind, Lane::Mid, 0)),
        }
    }

    fn with_state(mut unit: UnitSnapshot, edit: impl FnOnce(&mut CreepState)) -> UnitSnapshot {
        if let UnitRole::Creep(state) = &mut unit.role {
            edit(state);
        }
        unit
    }

    fn hero(id: u32, team: Team, x: f32, y: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            team,
            position: WorldPoint::new(x, y),
            alive: true,
            collision_radius: HERO_COLLISION_RADIUS,
            stats: CombatStats::hero_default(),
            vision: VisionStats::HERO,
            path_plan: PathPlan::default(),
            role: UnitRole::Hero {
                name: "pudge".to_owned(),
            },
        }
    }

    fn mid_lane() -> LanePaths {
        let mut lanes = LanePaths::default();
        *lanes.get_mut(Team::Radiant, Lane::Mid) = LanePath::new(
            WorldPoint::new(0.0, -1_000.0),
            vec![
                WorldPoint::new(0.0, -1_000.0),
                WorldPoint::new(0.0, 0.0),
                WorldPoint::new(0.0, 1_000.0),
                WorldPoint::new(0.0, 2_000.0),
            ],
        );
        lanes
    }

    fn run(units: Vec<UnitSnapshot>, lanes: &LanePaths, now: f64) -> Vec<Command> {
        let view = UnitView::from_snapshots(units);
        let pathfinder = Pathfinder::new(PathConfig::default());
        let frame = Frame {
            view: &view,
            lanes,
            navigation: &Open,
            pathfinder: &pathfinder,
            now,
            dt: 0.1,
        };
        let mut ai = CreepAi::default();
        let mut out = Vec::new();
        ai.handle(&frame, &mut StepRng::new(0, 0), &mut out);
        out
    }

    fn updated_state(out: &[Command], id: u32) -> Option<CreepState> {
        out.iter().find_map(|command| match command {
            Command::UpdateCreep { unit, state } if unit.get() == id => Some(*state),
            _ => None,
        })
    }

    #[test]
    fn lane_move_walks_towards_the_next_waypoint() {
        let out = run(
            vec![creep(1, Team::Radiant, CreepKind::Melee, 0.0, -1_000.0)],
            &mid_lane(),
            0.0,
        );

        assert_eq!(
            out,
            vec![Command::MoveUnit {
                unit: UnitId::new(1),
                position: WorldPoint::new(0.0, -967.5),
            }]
        );
    }

    #[test]
    fn reaching_a_waypoint_advances_the_lane_cursor() {
        let unit = creep(1, Team::Radiant, CreepKind::Melee, 0.0, -30.0);
        let out = run(vec![unit], &mid_lane(), 0.0);

        let state = updated_state(&out, 1).expect("cursor moved");
        assert_eq!(state.lane_path_index, 2);
        assert_eq!(state.behavior, CreepBehavior::LaneMove);
    }

    #[test]
    fn the_end_of_the_lane_leaves_the_creep_idle() {
        let unit = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 1_990.0), |state| {
            state.lane_path_index = 3;
        });
        let out = run(vec![unit], &mid_lane(), 0.0);

        assert_eq!(updated_state(&out, 1).map(|state| state.behavior), Some(CreepBehavior::Idle));

        let idle = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 2_000.0), |state| {
            state.lane_path_index = 4;
            state.behavior = CreepBehavior::Idle;
        });
        assert!(run(vec![idle], &mid_lane(), 0.0).is_empty(), "idle without waypoints stays put");
    }

    #[test]
    fn enemies_in_sight_pull_creeps_off_the_lane() {
        let out = run(
            vec![
                creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0),
                creep(2, Team::Dire, CreepKind::Melee, 700.0, 0.0),
            ],
            &mid_lane(),
            0.0,
        );

        let state = updated_state(&out, 1).expect("behavior changed");
        assert_eq!(state.behavior, CreepBehavior::Attack);
        assert_eq!(state.aggro_target, Some(UnitId::new(2)));
        assert_eq!(state.remembered_position, Some(WorldPoint::ORIGIN));
    }

    #[test]
    fn acquisition_prefers_the_nearest_then_the_smallest_id() {
        let lanes = mid_lane();
        let out = run(
            vec![
                creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0),
                creep(5, Team::Dire, CreepKind::Melee, 0.0, 300.0),
                creep(3, Team::Dire, CreepKind::Melee, 300.0, 0.0),
                creep(4, Team::Dire, CreepKind::Melee, 250.0, 0.0),
            ],
            &lanes,
            0.0,
        );
        assert_eq!(
            updated_state(&out, 1).and_then(|state| state.aggro_target),
            Some(UnitId::new(4))
        );

        let out = run(
            vec![
                creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0),
                creep(5, Team::Dire, CreepKind::Melee, 0.0, 300.0),
                creep(3, Team::Dire, CreepKind::Melee, 300.0, 0.0),
            ],
            &lanes,
            0.0,
        );
        assert_eq!(
            updated_state(&out, 1).and_then(|state| state.aggro_target),
            Some(UnitId::new(3))
        );
    }

    #[test]
    fn attacks_in_range_deal_armor_reduced_damage() {
        let attacker = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0), |state| {
            state.behavior = CreepBehavior::Attack;
            state.aggro_target = Some(UnitId::new(2));
        });
        let target = creep(2, Team::Dire, CreepKind::Melee, 150.0, 0.0);
        let out = run(vec![attacker, target], &mid_lane(), 12.0);

        assert!(out.contains(&Command::ApplyDamage {
            source: Some(UnitId::new(1)),
            target: UnitId::new(2),
            amount: 16.0,
        }));
        let state = updated_state(&out, 1).expect("attack bookkeeping");
        assert_eq!(state.attack.last_attack_time, 12.0);
        assert_eq!(state.attack.target, Some(UnitId::new(2)));
        assert!((state.attack.animation - 0.5).abs() < 1e-6);
    }

    #[test]
    fn attacks_respect_the_cooldown() {
        let attacker = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0), |state| {
            state.behavior = CreepBehavior::Attack;
            state.aggro_target = Some(UnitId::new(2));
            state.attack.last_attack_time = 11.5;
            state.attack.animation = 1.0;
        });
        let target = creep(2, Team::Dire, CreepKind::Melee, 150.0, 0.0);
        let out = run(vec![attacker, target], &mid_lane(), 12.0);

        assert!(
            !out.iter().any(|command| matches!(command, Command::ApplyDamage { .. })),
            "no swing while the cooldown runs: {out:?}"
        );
        assert_eq!(updated_state(&out, 1), None);
    }

    #[test]
    fn targets_out_of_reach_are_approached_up_to_effective_range() {
        let attacker = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0), |state| {
            state.behavior = CreepBehavior::Attack;
            state.aggro_target = Some(UnitId::new(2));
        });
        let out = run(vec![attacker, hero(2, Team::Dire, 140.0, 0.0)], &mid_lane(), 0.0);

        assert_eq!(
            out,
            vec![Command::MoveUnit {
                unit: UnitId::new(1),
                position: WorldPoint::new(17.0, 0.0),
            }],
            "stops just inside attack range plus the target radius"
        );
    }

    #[test]
    fn targets_leaving_vision_are_sought_at_their_last_position() {
        let attacker = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0), |state| {
            state.behavior = CreepBehavior::Attack;
            state.aggro_target = Some(UnitId::new(2));
        });
        let out = run(
            vec![attacker, hero(2, Team::Dire, 800.0, 0.0)],
            &mid_lane(),
            0.0,
        );

        let state = updated_state(&out, 1).expect("lost the target");
        assert_eq!(state.behavior, CreepBehavior::SeekLast);
        assert_eq!(state.last_seen, Some(WorldPoint::new(800.0, 0.0)));
        assert_eq!(state.aggro_target, None);
    }

    #[test]
    fn dead_targets_trigger_reacquisition_or_return() {
        let attacker = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0), |state| {
            state.behavior = CreepBehavior::Attack;
            state.aggro_target = Some(UnitId::new(2));
        });
        let mut corpse = creep(2, Team::Dire, CreepKind::Melee, 100.0, 0.0);
        corpse.alive = false;

        let out = run(vec![attacker.clone(), corpse.clone()], &mid_lane(), 0.0);
        let state = updated_state(&out, 1).expect("returned");
        assert_eq!(state.behavior, CreepBehavior::Return);
        assert_eq!(state.aggro_target, None);

        let out = run(
            vec![attacker, corpse, creep(3, Team::Dire, CreepKind::Ranged, 300.0, 0.0)],
            &mid_lane(),
            0.0,
        );
        let state = updated_state(&out, 1).expect("retargeted");
        assert_eq!(state.behavior, CreepBehavior::Attack);
        assert_eq!(state.aggro_target, Some(UnitId::new(3)));
    }

    #[test]
    fn returning_creeps_resume_from_the_nearest_forward_waypoint() {
        let unit = with_state(creep(1, Team::Radiant, CreepKind::Melee, 40.0, 950.0), |state| {
            state.behavior = CreepBehavior::Return;
            state.lane_path_index = 1;
            state.remembered_position = Some(WorldPoint::new(0.0, -200.0));
        });
        let out = run(vec![unit], &mid_lane(), 0.0);

        let state = updated_state(&out, 1).expect("rejoined");
        assert_eq!(state.behavior, CreepBehavior::LaneMove);
        assert_eq!(state.lane_path_index, 2, "skips the waypoint left behind");
        assert_eq!(state.remembered_position, None);
    }

    #[test]
    fn chases_time_out() {
        let chaser = with_state(creep(1, Team::Radiant, CreepKind::Melee, 0.0, 0.0), |state| {
            state.behavior = CreepBehavior::Chase;
            state.aggro_target = Some(UnitId::new(2));
            state.chase_started_at = Some(400.0);
        });
        let out = run(
            vec![chaser, hero(2, Team::Dire, 400.0, 0.0)],
            &mid_lane(),
            402.4,
        );

        let state = updated_state(&out, 1).expect("gave up");
        assert_eq!(state.behavior, CreepBehavior::Return);
        assert_eq!(state.chase_started_at, None);
    }

    #[test]
    fn aggro_pulls_nearby_enemy_creeps_after_the_immunity_window() {
        let view = UnitView::from_snapshots(vec![
            hero(1, Team::Radiant, 0.0, 0.0),
            creep(2, Team::Dire, CreepKind::Melee, 300.0, 0.0),
            creep(3, Team::Dire, CreepKind::Melee, 900.0, 0.0),
            creep(4, Team::Radiant, CreepKind::Melee, 100.0, 0.0),
            with_state(creep(5, Team::Dire, CreepKind::Ranged, 0.0, 200.0), |state| {
                state.last_aggro_time = 599.0;
            }),
        ]);
        let ai = CreepAi::default();
        let mut out = Vec::new();

        assert_eq!(ai.draw_aggro(&view, UnitId::new(1), 120.0, &mut out), 0);
        assert!(out.is_empty());

        assert_eq!(ai.draw_aggro(&view, UnitId::new(1), 600.0, &mut out), 1);
        let state = updated_state(&out, 2).expect("creep 2 answered");
        assert_eq!(state.behavior, CreepBehavior::Chase);
        assert_eq!(state.aggro_target, Some(UnitId::new(1)));
        assert_eq!(state.chase_started_at, Some(600.0));
        assert_eq!(state.last_aggro_time, 600.0);
        assert_ne!(state.last_aggro_time, NEVER);
    }

    #[test]
    fn dead_creeps_do_not_think() {
        let mut corpse = creep(1, Team::Radiant, CreepKind::Melee, 0.0, -1_000.0);
        corpse.alive = false;
        assert!(run(vec![corpse], &mid_lane(), 0.0).is_empty());
    }
}
