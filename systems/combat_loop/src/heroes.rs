//! Movement of player-controlled heroes along their planned routes.

use lanewatch_core::{Command, PathPlan, UnitView, WalkOptions, Walkability, Waypoint, WorldPoint};
use lanewatch_system_pathfinding::Pathfinder;

use crate::ControlError;

/// Distance at which a hero counts as having reached a user waypoint.
pub const WAYPOINT_REACHED: f32 = 50.0;

/// Moves every alive hero with an active plan one tick along its path.
pub(crate) fn advance_heroes(view: &UnitView, dt: f32, out: &mut Vec<Command>) {
    for hero in view.alive().filter(|unit| unit.is_hero()) {
        let Some((position, plan)) =
            walk_plan(&hero.path_plan, hero.position, hero.stats.move_speed * dt)
        else {
            continue;
        };
        out.push(Command::MoveUnit {
            unit: hero.id,
            position,
        });
        out.push(Command::ReplacePathPlan {
            unit: hero.id,
            plan,
        });
    }
}

/// Walks `distance` along a moving plan from `from`.
///
/// Returns the new position and the updated plan, or `None` when the plan
/// is not moving. Waypoints are dropped once the hero comes within
/// [`WAYPOINT_REACHED`] of them; reaching the end of the path clears the plan.
#[must_use]
pub fn walk_plan(
    plan: &PathPlan,
    from: WorldPoint,
    distance: f32,
) -> Option<(WorldPoint, PathPlan)> {
    if !plan.is_moving {
        return None;
    }
    let mut next = plan.clone();
    let position = next.advance(from, distance);
    while next
        .waypoints
        .first()
        .is_some_and(|waypoint| waypoint.position.distance(position) < WAYPOINT_REACHED)
    {
        let _ = next.waypoints.remove(0);
    }
    if next.is_exhausted() {
        next = PathPlan::default();
    }
    Some((position, next))
}

/// Computes one continuous path from `from` through every waypoint in order.
///
/// Fails on the first leg the search cannot connect.
pub fn plan_route<W>(
    pathfinder: &Pathfinder,
    grid: &W,
    from: WorldPoint,
    waypoints: &[Waypoint],
    options: &WalkOptions,
) -> Result<Vec<WorldPoint>, ControlError>
where
    W: Walkability + ?Sized,
{
    let mut route: Vec<WorldPoint> = Vec::new();
    let mut start = from;
    for waypoint in waypoints {
        let leg = pathfinder.find_path(grid, start, waypoint.position, options);
        if leg.is_empty() {
            return Err(ControlError::Unreachable {
                from: start,
                to: waypoint.position,
            });
        }
        let skip = usize::from(!route.is_empty());
        route.extend(leg.into_iter().skip(skip));
        start = waypoint.position;
    }
    Ok(route)
}
