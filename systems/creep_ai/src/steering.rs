//! Local steering: ally avoidance while walking and separation from obstacles.

use glam::Vec2;
use lanewatch_core::{BuildingSnapshot, Command, UnitSnapshot, UnitView, WorldPoint};

/// Half edge of the box scanned for allies blocking the way.
pub const AVOIDANCE_LOOKAHEAD: f32 = 150.0;
/// Half edge of the box scanned for obstacles to separate from.
pub const SEPARATION_RANGE: f32 = 200.0;
/// Scale applied to the overlap when pushing a creep out of an obstacle.
pub const SEPARATION_STRENGTH: f32 = 2.0;

const AVOID_WEIGHT: f32 = 0.6;
const INTENT_WEIGHT: f32 = 0.4;

/// Outcome of one steering step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Steer {
    /// Position proposed for the end of the tick.
    pub position: WorldPoint,
    /// Accumulated seconds spent blocked by an ally.
    pub wait: f32,
    /// Whether the step leaves the direct line to the goal.
    pub deflected: bool,
}

/// Steps `mover` towards `goal`, stopping `stop_at` units short of it.
///
/// An overlapping ally ahead first makes the mover wait; once `wait`
/// exceeds `wait_threshold` the mover slides along the perpendicular closest
/// to its heading. Enemies never block.
#[must_use]
pub fn steer(
    mover: &UnitSnapshot,
    view: &UnitView,
    goal: WorldPoint,
    stop_at: f32,
    dt: f32,
    wait: f32,
    wait_threshold: f32,
) -> Steer {
    let from = mover.position.to_vec2();
    let offset = goal.to_vec2() - from;
    let distance = offset.length();
    let hold = Steer {
        position: mover.position,
        wait,
        deflected: false,
    };
    if distance < 1.0 || distance <= stop_at {
        return hold;
    }

    let heading = offset / distance;
    let step = mover.stats.move_speed * dt;
    let Some(blocker) = closest_blocker(mover, view, heading) else {
        let travel = step.min(distance - stop_at);
        return Steer {
            position: WorldPoint::from_vec2(from + heading * travel),
            wait: 0.0,
            deflected: false,
        };
    };

    let wait = wait + dt;
    if wait < wait_threshold {
        return Steer { wait, ..hold };
    }

    let toward = (blocker - from).normalize_or_zero();
    let left = Vec2::new(-toward.y, toward.x);
    let right = -left;
    let side = if left.dot(heading) > right.dot(heading) {
        left
    } else {
        right
    };
    let direction = (side * AVOID_WEIGHT + heading * INTENT_WEIGHT).normalize_or_zero();
    Steer {
        position: WorldPoint::from_vec2(from + direction * step),
        wait,
        deflected: true,
    }
}

fn closest_blocker(mover: &UnitSnapshot, view: &UnitView, heading: Vec2) -> Option<Vec2> {
    let from = mover.position.to_vec2();
    let mut closest: Option<(f32, Vec2)> = None;
    for ally in view.alive() {
        if ally.id == mover.id || ally.team != mover.team {
            continue;
        }
        let to = ally.position.to_vec2() - from;
        if to.x.abs() > AVOIDANCE_LOOKAHEAD || to.y.abs() > AVOIDANCE_LOOKAHEAD {
            continue;
        }
        if to.dot(heading) < 0.0 {
            continue;
        }
        let distance_squared = to.length_squared();
        let reach = mover.collision_radius + ally.collision_radius;
        if distance_squared <= 0.0 || distance_squared >= reach * reach {
            continue;
        }
        if closest.map_or(true, |(best, _)| distance_squared < best) {
            closest = Some((distance_squared, ally.position.to_vec2()));
        }
    }
    closest.map(|(_, position)| position)
}

/// Pushes alive creeps out of heroes and buildings they overlap.
///
/// Creeps never push each other; allies sort themselves out through
/// [`steer`]. Emits one `MoveUnit` per displaced creep.
pub fn separation_pass(view: &UnitView, buildings: &[BuildingSnapshot], out: &mut Vec<Command>) {
    let obstacles: Vec<(Option<&UnitSnapshot>, Vec2, f32)> = view
        .alive()
        .filter(|unit| unit.is_hero())
        .map(|hero| (Some(hero), hero.position.to_vec2(), hero.collision_radius))
        .chain(buildings.iter().map(|building| {
            (None, building.position.to_vec2(), building.kind.collision_radius())
        }))
        .collect();

    for creep in view.alive().filter(|unit| unit.creep().is_some()) {
        let at = creep.position.to_vec2();
        let mut push = Vec2::ZERO;
        for &(owner, position, radius) in &obstacles {
            if owner.is_some_and(|unit| unit.id == creep.id) {
                continue;
            }
            let away = at - position;
            if away.x.abs() > SEPARATION_RANGE || away.y.abs() > SEPARATION_RANGE {
                continue;
            }
            let distance_squared = away.length_squared();
            let reach = creep.collision_radius + radius;
            if distance_squared <= 0.0 || distance_squared >= reach * reach {
                continue;
            }
            let distance = distance_squared.sqrt();
            push += away / distance * (reach - distance) * SEPARATION_STRENGTH;
        }
        if push != Vec2::ZERO {
            out.push(Command::MoveUnit {
                unit: creep.id,
                position: WorldPoint::from_vec2(at + push),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanewatch_core::{
        BuildingId, BuildingKind, CombatStats, CreepKind, CreepState, Lane, PathPlan, Team,
        TowerTier, UnitId, UnitRole, VisionStats, HERO_COLLISION_RADIUS,
    };

    fn creep(id: u32, team: Team, x: f32, y: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            team,
            position: WorldPoint::new(x, y),
            alive: true,
            collision_radius: CreepKind::Melee.collision_radius(),
            stats: CreepKind::Melee.base_stats(),
            vision: VisionStats::CREEP,
            path_plan: PathPlan::default(),
            role: UnitRole::Creep(CreepState::new(CreepKind::Melee, Lane::Mid, 0)),
        }
    }

    fn hero(id: u32, x: f32, y: f32) -> UnitSnapshot {
        UnitSnapshot {
            collision_radius: HERO_COLLISION_RADIUS,
            stats: CombatStats::hero_default(),
            role: UnitRole::Hero {
                name: "hero".to_owned(),
            },
            ..creep(id, Team::Radiant, x, y)
        }
    }

    #[test]
    fn free_steps_stop_short_of_the_goal() {
        let mover = creep(1, Team::Radiant, 0.0, 0.0);
        let view = UnitView::from_snapshots(vec![mover.clone()]);

        let far = steer(&mover, &view, WorldPoint::new(1_000.0, 0.0), 0.0, 0.1, 0.2, 0.3);
        assert_eq!(far.position, WorldPoint::new(32.5, 0.0));
        assert_eq!(far.wait, 0.0, "clear steps reset the wait timer");

        let near = steer(&mover, &view, WorldPoint::new(20.0, 0.0), 0.0, 0.1, 0.0, 0.3);
        assert_eq!(near.position, WorldPoint::new(20.0, 0.0));

        let ranged = steer(&mover, &view, WorldPoint::new(110.0, 0.0), 100.0, 0.1, 0.0, 0.3);
        assert_eq!(ranged.position, WorldPoint::new(10.0, 0.0));
    }

    #[test]
    fn allies_ahead_cause_a_wait_then_a_detour() {
        let mover = creep(1, Team::Radiant, 0.0, 0.0);
        let view =
            UnitView::from_snapshots(vec![mover.clone(), creep(2, Team::Radiant, 0.0, 50.0)]);
        let goal = WorldPoint::new(10.0, 1_000.0);

        let waiting = steer(&mover, &view, goal, 0.0, 0.1, 0.0, 0.3);
        assert_eq!(waiting.position, mover.position);
        assert!((waiting.wait - 0.1).abs() < 1e-6);

        let detour = steer(&mover, &view, goal, 0.0, 0.1, 0.25, 0.3);
        assert!(detour.deflected);
        assert!(detour.position.x() > 0.0, "slides to the side nearer the goal");
        assert!(detour.position.y() > 0.0, "keeps some forward progress");
    }

    #[test]
    fn enemies_and_allies_behind_never_block() {
        let mover = creep(1, Team::Radiant, 0.0, 0.0);
        let view = UnitView::from_snapshots(vec![
            mover.clone(),
            creep(2, Team::Dire, 0.0, 40.0),
            creep(3, Team::Radiant, 0.0, -40.0),
        ]);

        let step = steer(&mover, &view, WorldPoint::new(0.0, 1_000.0), 0.0, 0.1, 0.0, 0.3);
        assert!(!step.deflected);
        assert_eq!(step.position, WorldPoint::new(0.0, 32.5));
    }

    #[test]
    fn separation_pushes_creeps_out_of_heroes_and_towers() {
        let view = UnitView::from_snapshots(vec![
            creep(1, Team::Dire, 0.0, 0.0),
            hero(2, 80.0, 0.0),
            creep(3, Team::Dire, 3_000.0, 100.0),
            creep(4, Team::Dire, 3_000.0, 215.0),
        ]);
        let buildings = [BuildingSnapshot {
            id: BuildingId::new(1),
            kind: BuildingKind::Tower(TowerTier::One),
            team: Team::Radiant,
            position: WorldPoint::new(3_000.0, 0.0),
        }];
        let mut out = Vec::new();

        separation_pass(&view, &buildings, &mut out);

        assert_eq!(
            out,
            vec![
                Command::MoveUnit {
                    unit: UnitId::new(1),
                    position: WorldPoint::new(-16.0, 0.0),
                },
                Command::MoveUnit {
                    unit: UnitId::new(3),
                    position: WorldPoint::new(3_000.0, 316.0),
                },
            ],
            "creeps overlapping each other are left alone"
        );
    }
}
