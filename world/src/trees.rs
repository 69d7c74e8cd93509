//! Single owned table of map trees.
//!
//! Trees are indexed twice: by the vision cell holding the trunk, for the
//! movement collision test, and by every vision cell of their 3x3 footprint,
//! for occlusion. Per-elevation occlusion maps are derived from the table and
//! only change through [`TreeTable::toggle`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lanewatch_core::{
    CoordinateTransform, TreeId, TreeOcclusion, TreeRecord, VisionCell, WorldPoint,
    TREE_COLLISION_RADIUS, VISION_GRID_DIMENSION,
};

#[derive(Clone, Debug, PartialEq)]
struct Tree {
    position: WorldPoint,
    elevation: i32,
    footprint: Vec<VisionCell>,
    alive: bool,
}

/// Alive state, footprints and occlusion lookups of every tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeTable {
    trees: Vec<Tree>,
    by_trunk: HashMap<VisionCell, Vec<TreeId>>,
    by_footprint: HashMap<VisionCell, Vec<TreeId>>,
    occlusion: BTreeMap<i32, BTreeMap<VisionCell, BTreeSet<TreeId>>>,
}

impl Default for TreeTable {
    fn default() -> Self {
        Self::new(&[], &[])
    }
}

impl TreeTable {
    /// Builds the table from loaded records for the given elevation levels.
    #[must_use]
    pub fn new(records: &[TreeRecord], elevation_levels: &[i32]) -> Self {
        let mut table = Self {
            trees: Vec::with_capacity(records.len()),
            by_trunk: HashMap::new(),
            by_footprint: HashMap::new(),
            occlusion: elevation_levels
                .iter()
                .map(|&level| (level, BTreeMap::new()))
                .collect(),
        };

        for (index, record) in records.iter().enumerate() {
            let id = TreeId::new(index as u32);
            let footprint = footprint_of(record.cell);
            table.by_trunk.entry(record.cell).or_default().push(id);
            for &cell in &footprint {
                table.by_footprint.entry(cell).or_default().push(id);
            }
            table.trees.push(Tree {
                position: record.position,
                elevation: record.elevation,
                footprint,
                alive: true,
            });
            table.add_occlusion(id);
        }

        table
    }

    /// Number of trees in the table, alive or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether the table holds no trees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Whether the tree is standing.
    #[must_use]
    pub fn is_alive(&self, id: TreeId) -> bool {
        self.tree(id).is_some_and(|tree| tree.alive)
    }

    /// Trees whose footprint covers the cell.
    #[must_use]
    pub fn trees_covering(&self, cell: VisionCell) -> &[TreeId] {
        self.by_footprint.get(&cell).map_or(&[], Vec::as_slice)
    }

    /// Elevation levels with a precomputed occlusion map.
    pub fn occlusion_levels(&self) -> impl Iterator<Item = i32> + '_ {
        self.occlusion.keys().copied()
    }

    /// Cells occluded for an eye at the given precomputed elevation level.
    pub fn occluded_cells(&self, level: i32) -> impl Iterator<Item = VisionCell> + '_ {
        self.occlusion
            .get(&level)
            .into_iter()
            .flat_map(|cells| cells.keys().copied())
    }

    /// Whether an alive tree trunk near the point collides with a unit of the given radius.
    ///
    /// Only trunks in the 3x3 vision-cell neighborhood of the point are considered.
    #[must_use]
    pub fn blocks_movement(&self, point: WorldPoint, collision_radius: f32) -> bool {
        if self.trees.is_empty() {
            return false;
        }
        let reach = collision_radius + TREE_COLLISION_RADIUS;
        let center = CoordinateTransform::world_to_vision(point);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(ids) = self.by_trunk.get(&center.offset(dx, dy)) else {
                    continue;
                };
                let blocked = ids
                    .iter()
                    .filter_map(|&id| self.tree(id))
                    .any(|tree| tree.alive && tree.position.distance(point) < reach);
                if blocked {
                    return true;
                }
            }
        }
        false
    }

    /// Flips every tree whose footprint covers the cell and returns how many flipped.
    pub(crate) fn toggle(&mut self, cell: VisionCell) -> usize {
        let ids = self.trees_covering(cell).to_vec();
        for &id in &ids {
            let Some(tree) = self.tree_mut(id) else {
                continue;
            };
            tree.alive = !tree.alive;
            let alive = tree.alive;
            if alive {
                self.add_occlusion(id);
            } else {
                self.remove_occlusion(id);
            }
        }
        ids.len()
    }

    fn tree(&self, id: TreeId) -> Option<&Tree> {
        self.trees.get(id.get() as usize)
    }

    fn tree_mut(&mut self, id: TreeId) -> Option<&mut Tree> {
        self.trees.get_mut(id.get() as usize)
    }

    fn add_occlusion(&mut self, id: TreeId) {
        let Some(tree) = self.trees.get(id.get() as usize) else {
            return;
        };
        for (_, cells) in self.occlusion.range_mut(..tree.elevation) {
            for &cell in &tree.footprint {
                let _ = cells.entry(cell).or_default().insert(id);
            }
        }
    }

    fn remove_occlusion(&mut self, id: TreeId) {
        let Some(tree) = self.trees.get(id.get() as usize) else {
            return;
        };
        for (_, cells) in self.occlusion.range_mut(..tree.elevation) {
            for cell in &tree.footprint {
                if let Some(ids) = cells.get_mut(cell) {
                    let _ = ids.remove(&id);
                    if ids.is_empty() {
                        let _ = cells.remove(cell);
                    }
                }
            }
        }
    }
}

impl TreeOcclusion for TreeTable {
    fn blocks_light(&self, cell: VisionCell, eye_elevation: i32) -> bool {
        if let Some(cells) = self.occlusion.get(&eye_elevation) {
            return cells.contains_key(&cell);
        }
        self.trees_covering(cell)
            .iter()
            .filter_map(|&id| self.tree(id))
            .any(|tree| tree.alive && tree.elevation > eye_elevation)
    }

    fn is_covered(&self, cell: VisionCell) -> bool {
        self.trees_covering(cell)
            .iter()
            .any(|&id| self.is_alive(id))
    }
}

fn footprint_of(center: VisionCell) -> Vec<VisionCell> {
    let mut cells = Vec::with_capacity(9);
    for dy in -1..=1 {
        for dx in -1..=1 {
            let cell = center.offset(dx, dy);
            if cell.is_within(VISION_GRID_DIMENSION, VISION_GRID_DIMENSION) {
                cells.push(cell);
            }
        }
    }
    cells
}
