//! Boundary tracing of lit cells for rendering.

use std::collections::{BTreeSet, HashMap, HashSet};

use lanewatch_core::{VisionCell, WorldPoint, VISION_CELL_SIZE, WORLD_MIN};

/// Closed outline of a lit region in vision-grid units.
///
/// Corners sit on cell boundaries, half a cell away from cell centers. The
/// last point repeats the first.
#[derive(Clone, Debug, PartialEq)]
pub struct LightPolygon {
    points: Vec<(f32, f32)>,
}

impl LightPolygon {
    /// Corners in vision-grid units.
    #[must_use]
    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    /// Corners mapped to world coordinates.
    #[must_use]
    pub fn to_world(&self) -> Vec<WorldPoint> {
        let offset = WORLD_MIN + VISION_CELL_SIZE / 2.0;
        self.points
            .iter()
            .map(|&(x, y)| {
                WorldPoint::new(x * VISION_CELL_SIZE + offset, y * VISION_CELL_SIZE + offset)
            })
            .collect()
    }
}

// Corners are stored doubled so that half-cell offsets stay integral.
type Corner = (i32, i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Edge {
    from: Corner,
    to: Corner,
}

/// Traces the outlines of the lit cells.
///
/// Every lit cell contributes a directed edge on each side whose cardinal
/// neighbour is unlit; edges are then chained head to tail into loops. Loops
/// with fewer than three corners are dropped.
#[must_use]
pub fn light_polygons(lights: &BTreeSet<VisionCell>) -> Vec<LightPolygon> {
    let edges = boundary_edges(lights);
    let mut outgoing: HashMap<Corner, Vec<usize>> = HashMap::new();
    for (index, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.from).or_default().push(index);
    }

    let mut visited: HashSet<usize> = HashSet::with_capacity(edges.len());
    let mut polygons = Vec::new();
    for start in 0..edges.len() {
        if visited.contains(&start) {
            continue;
        }
        let mut corners = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            if !visited.insert(index) {
                break;
            }
            let edge = edges[index];
            corners.push(edge.from);
            current = outgoing.get(&edge.to).and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .find(|candidate| !visited.contains(candidate))
            });
        }

        if corners.len() >= 3 {
            corners.push(corners[0]);
            polygons.push(LightPolygon {
                points: corners
                    .into_iter()
                    .map(|(x, y)| (x as f32 / 2.0, y as f32 / 2.0))
                    .collect(),
            });
        }
    }
    polygons
}

/// World-space outlines of the lit cells.
#[must_use]
pub fn light_polygons_world(lights: &BTreeSet<VisionCell>) -> Vec<Vec<WorldPoint>> {
    light_polygons(lights)
        .iter()
        .map(LightPolygon::to_world)
        .collect()
}

fn boundary_edges(lights: &BTreeSet<VisionCell>) -> Vec<Edge> {
    let mut edges = Vec::new();
    for cell in lights {
        let (x, y) = (cell.x() * 2, cell.y() * 2);
        let lit = |dx, dy| lights.contains(&cell.offset(dx, dy));
        if !lit(0, 1) {
            edges.push(Edge {
                from: (x - 1, y + 1),
                to: (x + 1, y + 1),
            });
        }
        if !lit(1, 0) {
            edges.push(Edge {
                from: (x + 1, y + 1),
                to: (x + 1, y - 1),
            });
        }
        if !lit(0, -1) {
            edges.push(Edge {
                from: (x + 1, y - 1),
                to: (x - 1, y - 1),
            });
        }
        if !lit(-1, 0) {
            edges.push(Edge {
                from: (x - 1, y - 1),
                to: (x - 1, y + 1),
            });
        }
    }
    edges
}
