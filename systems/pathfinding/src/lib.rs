#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded A* search over the fine navigation grid.
//!
//! Searches run on any [`Walkability`] implementation, expand at most the
//! configured number of nodes and report failures as [`PathError`]. Callers
//! that only care about the route use [`Pathfinder::find_path`], where an
//! empty result means the movement order failed.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap, HashSet},
};

use lanewatch_core::{NavCell, WalkOptions, Walkability, WorldPoint};
use tracing::{debug, trace};

/// Expansion limit applied when no explicit cap is configured.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

const NEIGHBORS: [(i32, i32, f32); 8] = [
    (1, 0, 1.0),
    (-1, 0, 1.0),
    (0, 1, 1.0),
    (0, -1, 1.0),
    (1, 1, DIAGONAL_COST),
    (1, -1, DIAGONAL_COST),
    (-1, 1, DIAGONAL_COST),
    (-1, -1, DIAGONAL_COST),
];

/// Configuration parameters required to construct the pathfinder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    max_iterations: usize,
}

impl Config {
    /// Creates a configuration that stops searches after `max_iterations` expansions.
    #[must_use]
    pub const fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Expansion cap of a single search.
    #[must_use]
    pub const fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

/// Reasons a search produced no path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The unit cannot stand on the start cell.
    #[error("start cell ({}, {}) is not walkable", .0.x(), .0.y())]
    StartBlocked(NavCell),
    /// The unit cannot stand on the goal cell.
    #[error("goal cell ({}, {}) is not walkable", .0.x(), .0.y())]
    GoalBlocked(NavCell),
    /// Every reachable cell was expanded without reaching the goal.
    #[error("goal is unreachable after {expanded} expansions")]
    Exhausted {
        /// Nodes popped from the open set.
        expanded: usize,
    },
    /// The expansion cap was hit before the search finished.
    #[error("search stopped at the cap of {limit} expansions")]
    IterationCap {
        /// Configured cap.
        limit: usize,
    },
}

/// A* pathfinder with an explicit expansion cap.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pathfinder {
    config: Config,
}

impl Pathfinder {
    /// Creates a pathfinder using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the pathfinder was built with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Finds a path between two world points, or an empty path when none exists.
    pub fn find_path<W>(
        &self,
        grid: &W,
        start: WorldPoint,
        end: WorldPoint,
        options: &WalkOptions,
    ) -> Vec<WorldPoint>
    where
        W: Walkability + ?Sized,
    {
        match self.search(grid, start, end, options) {
            Ok(path) => path,
            Err(error) => {
                debug!(%error, "path search failed");
                Vec::new()
            }
        }
    }

    /// Runs the search and reports why it failed, if it did.
    ///
    /// The result starts on the cell containing `start`, ends on the cell
    /// containing `end` and holds one world point per navigation cell.
    pub fn search<W>(
        &self,
        grid: &W,
        start: WorldPoint,
        end: WorldPoint,
        options: &WalkOptions,
    ) -> Result<Vec<WorldPoint>, PathError>
    where
        W: Walkability + ?Sized,
    {
        let transform = grid.transform();
        let start_cell = transform.world_to_nav(start);
        let goal_cell = transform.world_to_nav(end);

        if !grid.is_walkable(start_cell, options) {
            return Err(PathError::StartBlocked(start_cell));
        }
        if !grid.is_walkable(goal_cell, options) {
            return Err(PathError::GoalBlocked(goal_cell));
        }

        let mut open = BinaryHeap::new();
        let mut closed: HashSet<NavCell> = HashSet::new();
        let mut g_scores: HashMap<NavCell, f32> = HashMap::new();
        let mut came_from: HashMap<NavCell, NavCell> = HashMap::new();

        let _ = g_scores.insert(start_cell, 0.0);
        open.push(OpenNode {
            f_score: heuristic(start_cell, goal_cell),
            cell: start_cell,
        });

        let limit = self.config.max_iterations;
        let mut expanded = 0;
        while let Some(current) = open.peek().copied() {
            if expanded >= limit {
                return Err(PathError::IterationCap { limit });
            }
            let _ = open.pop();
            expanded += 1;

            if current.cell == goal_cell {
                trace!(expanded, "path found");
                return Ok(reconstruct(&came_from, goal_cell)
                    .into_iter()
                    .map(|cell| transform.nav_to_world(cell))
                    .collect());
            }
            if !closed.insert(current.cell) {
                continue;
            }

            let current_g = g_scores.get(&current.cell).copied().unwrap_or(0.0);
            for (dx, dy, cost) in NEIGHBORS {
                let neighbor = current.cell.offset(dx, dy);
                if closed.contains(&neighbor) || !grid.is_walkable(neighbor, options) {
                    continue;
                }
                let tentative = current_g + cost;
                let improves = g_scores
                    .get(&neighbor)
                    .map_or(true, |&known| tentative < known);
                if improves {
                    let _ = came_from.insert(neighbor, current.cell);
                    let _ = g_scores.insert(neighbor, tentative);
                    open.push(OpenNode {
                        f_score: tentative + heuristic(neighbor, goal_cell),
                        cell: neighbor,
                    });
                }
            }
        }

        Err(PathError::Exhausted { expanded })
    }
}

/// Length of a path in world units, rounded to the nearest unit.
#[must_use]
pub fn path_length(path: &[WorldPoint]) -> f32 {
    path.windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum::<f32>()
        .round()
}

/// Seconds a unit moving at `move_speed` needs to walk the path.
///
/// Empty paths and non-positive speeds take no time.
#[must_use]
pub fn travel_time(path: &[WorldPoint], move_speed: f32) -> f32 {
    let length = path_length(path);
    if length == 0.0 || move_speed <= 0.0 {
        return 0.0;
    }
    length / move_speed
}

fn heuristic(from: NavCell, to: NavCell) -> f32 {
    let dx = (from.x() - to.x()) as f32;
    let dy = (from.y() - to.y()) as f32;
    (dx * dx + dy * dy).sqrt()
}

fn reconstruct(came_from: &HashMap<NavCell, NavCell>, goal: NavCell) -> Vec<NavCell> {
    let mut cells = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        cells.push(previous);
        current = previous;
    }
    cells.reverse();
    cells
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f_score: f32,
    cell: NavCell,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // Reversed so the max-heap pops the lowest f-score first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}
