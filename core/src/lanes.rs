//! Fixed lane polylines walked by creeps.

use serde::{Deserialize, Serialize};

use crate::{Lane, Team, WorldPoint};

/// Spawn point and waypoint polyline of one lane for one team.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanePath {
    /// Where the lane's creeps appear.
    pub spawner: WorldPoint,
    /// Ordered waypoints from the spawner towards the enemy base.
    pub waypoints: Vec<WorldPoint>,
}

impl LanePath {
    /// Creates a lane path.
    #[must_use]
    pub fn new(spawner: WorldPoint, waypoints: Vec<WorldPoint>) -> Self {
        Self { spawner, waypoints }
    }

    /// Unit vector creeps face when they spawn.
    ///
    /// Points at the second waypoint (falling back to the first) and defaults
    /// to south when the lane has no usable waypoint.
    #[must_use]
    pub fn heading(&self) -> (f32, f32) {
        let target = self.waypoints.get(1).or_else(|| self.waypoints.first());
        if let Some(target) = target {
            let dx = target.x() - self.spawner.x();
            let dy = target.y() - self.spawner.y();
            let length = (dx * dx + dy * dy).sqrt();
            if length > 0.0 {
                return (dx / length, dy / length);
            }
        }
        (0.0, -1.0)
    }
}

/// Lane paths of one team.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamLanes {
    /// Top lane.
    pub top: LanePath,
    /// Middle lane.
    pub mid: LanePath,
    /// Bottom lane.
    pub bot: LanePath,
}

/// Lane paths of both teams.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanePaths {
    /// Radiant lanes.
    pub radiant: TeamLanes,
    /// Dire lanes.
    pub dire: TeamLanes,
}

impl LanePaths {
    /// Path walked by the team's creeps in the lane.
    #[must_use]
    pub fn get(&self, team: Team, lane: Lane) -> &LanePath {
        let lanes = match team {
            Team::Radiant => &self.radiant,
            Team::Dire => &self.dire,
        };
        match lane {
            Lane::Top => &lanes.top,
            Lane::Mid => &lanes.mid,
            Lane::Bot => &lanes.bot,
        }
    }

    /// Mutable access to the team's path in the lane.
    pub fn get_mut(&mut self, team: Team, lane: Lane) -> &mut LanePath {
        let lanes = match team {
            Team::Radiant => &mut self.radiant,
            Team::Dire => &mut self.dire,
        };
        match lane {
            Lane::Top => &mut lanes.top,
            Lane::Mid => &mut lanes.mid,
            Lane::Bot => &mut lanes.bot,
        }
    }
}
