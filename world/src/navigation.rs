//! Walkability field and the navigation grid queried by movement.

use lanewatch_core::{
    CoordinateTransform, NavCell, VisionCell, WalkOptions, Walkability, NAV_CELL_SIZE,
};

use crate::{loader::LoadError, trees::TreeTable};

/// Threshold above which a pixel channel counts as walkable.
const WALKABLE_THRESHOLD: u8 = 128;

/// Dense walkability bits addressed with image-style rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalkabilityField {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl WalkabilityField {
    /// Field of the given size where every cell is walkable.
    #[must_use]
    pub fn open(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![true; width as usize * height as usize],
        }
    }

    /// Builds a field from one boolean per cell in row-major order.
    pub fn from_mask(width: u32, height: u32, cells: Vec<bool>) -> Result<Self, LoadError> {
        let expected = checked_area(width, height)?;
        if cells.len() != expected {
            return Err(LoadError::BufferSize {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a field from interleaved pixel bytes.
    ///
    /// A pixel is walkable when its first channel exceeds 128. Grayscale
    /// masks use one channel per pixel, decoded RGBA images use four.
    pub fn from_pixels(
        width: u32,
        height: u32,
        bytes: &[u8],
        channels: usize,
    ) -> Result<Self, LoadError> {
        if channels == 0 {
            return Err(LoadError::ChannelCount);
        }
        let area = checked_area(width, height)?;
        let expected = area.checked_mul(channels).ok_or(LoadError::EmptyGrid)?;
        if bytes.len() != expected {
            return Err(LoadError::BufferSize {
                expected,
                actual: bytes.len(),
            });
        }
        let cells = bytes
            .chunks_exact(channels)
            .map(|pixel| pixel[0] > WALKABLE_THRESHOLD)
            .collect();
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Marks the cells of an axis-aligned rectangle as blocked.
    #[must_use]
    pub fn with_blocked_rect(mut self, min: NavCell, max: NavCell) -> Self {
        for y in min.y()..=max.y() {
            for x in min.x()..=max.x() {
                if let Some(index) = self.index(x, y) {
                    self.cells[index] = false;
                }
            }
        }
        self
    }

    /// Dimensions as `(width, height)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the pixel exists and is walkable.
    #[must_use]
    pub fn is_open(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|index| self.cells[index])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + column as usize)
    }
}

fn checked_area(width: u32, height: u32) -> Result<usize, LoadError> {
    let area = (width as usize)
        .checked_mul(height as usize)
        .ok_or(LoadError::EmptyGrid)?;
    if area == 0 {
        return Err(LoadError::EmptyGrid);
    }
    Ok(area)
}

/// Terrain walkability combined with the map's tree table.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationGrid {
    field: WalkabilityField,
    trees: TreeTable,
    transform: CoordinateTransform,
}

impl NavigationGrid {
    /// Creates a grid from a walkability field and the tree table it owns.
    #[must_use]
    pub fn new(field: WalkabilityField, trees: TreeTable) -> Self {
        let (width, height) = field.dimensions();
        Self {
            field,
            trees,
            transform: CoordinateTransform::new(width, height),
        }
    }

    /// Fully walkable grid without trees.
    #[must_use]
    pub fn open(width: u32, height: u32) -> Self {
        Self::new(WalkabilityField::open(width, height), TreeTable::default())
    }

    /// Terrain walkability bits.
    #[must_use]
    pub fn field(&self) -> &WalkabilityField {
        &self.field
    }

    /// Trees owned by the grid.
    #[must_use]
    pub fn trees(&self) -> &TreeTable {
        &self.trees
    }

    /// Whether the single terrain pixel is walkable, ignoring footprints and trees.
    #[must_use]
    pub fn is_pixel_walkable(&self, cell: NavCell) -> bool {
        self.field.is_open(cell.x(), cell.y())
    }

    pub(crate) fn toggle_tree(&mut self, cell: VisionCell) -> usize {
        self.trees.toggle(cell)
    }
}

impl Walkability for NavigationGrid {
    fn transform(&self) -> CoordinateTransform {
        self.transform
    }

    fn is_walkable(&self, cell: NavCell, options: &WalkOptions) -> bool {
        if !self.transform.contains_nav(cell) {
            return false;
        }
        if options.flying {
            return true;
        }

        let reach = (options.collision_radius.max(0.0) / NAV_CELL_SIZE).ceil() as i32;
        let reach_squared = reach * reach;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if dx * dx + dy * dy > reach_squared {
                    continue;
                }
                if !self.field.is_open(cell.x() + dx, cell.y() + dy) {
                    return false;
                }
            }
        }

        if options.collides_with_trees()
            && self
                .trees
                .blocks_movement(self.transform.nav_to_world(cell), options.collision_radius)
        {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanewatch_core::{TreeRecord, WorldPoint};

    #[test]
    fn pixels_above_threshold_are_walkable() {
        let bytes = [200, 0, 0, 255, 128, 0, 0, 255, 129, 9, 9, 9, 0, 0, 0, 0];
        let field = WalkabilityField::from_pixels(2, 2, &bytes, 4).expect("valid rgba");

        assert!(field.is_open(0, 0));
        assert!(!field.is_open(1, 0), "exactly 128 is blocked");
        assert!(field.is_open(0, 1));
        assert!(!field.is_open(1, 1));
        assert!(!field.is_open(2, 0), "outside the field is blocked");
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let error = WalkabilityField::from_pixels(4, 4, &[255; 15], 1).unwrap_err();
        assert!(matches!(
            error,
            LoadError::BufferSize {
                expected: 16,
                actual: 15
            }
        ));
        assert!(matches!(
            WalkabilityField::from_mask(0, 3, Vec::new()),
            Err(LoadError::EmptyGrid)
        ));
    }

    #[test]
    fn collision_radius_widens_the_footprint() {
        let field = WalkabilityField::open(40, 40)
            .with_blocked_rect(NavCell::new(20, 0), NavCell::new(20, 39));
        let grid = NavigationGrid::new(field, TreeTable::default());

        let beside_wall = NavCell::new(17, 10);
        assert!(grid.is_walkable(beside_wall, &WalkOptions::ground(16.0)));
        assert!(!grid.is_walkable(beside_wall, &WalkOptions::ground(24.0)));
        assert!(!grid.is_walkable(NavCell::new(20, 10), &WalkOptions::ground(0.0)));
    }

    #[test]
    fn flying_units_only_check_bounds() {
        let field =
            WalkabilityField::open(8, 8).with_blocked_rect(NavCell::new(0, 0), NavCell::new(7, 7));
        let grid = NavigationGrid::new(field, TreeTable::default());

        assert!(grid.is_walkable(NavCell::new(3, 3), &WalkOptions::flying()));
        assert!(!grid.is_walkable(NavCell::new(8, 3), &WalkOptions::flying()));
    }

    #[test]
    fn trees_block_unless_phased_or_ignored() {
        let transform = CoordinateTransform::default();
        let trunk_cell = CoordinateTransform::world_to_vision(WorldPoint::ORIGIN);
        let trunk = CoordinateTransform::vision_to_world(trunk_cell);
        let trees = TreeTable::new(
            &[TreeRecord {
                position: trunk,
                cell: trunk_cell,
                elevation: 1,
            }],
            &[0],
        );
        let grid = NavigationGrid::new(WalkabilityField::open(2401, 2401), trees);
        let cell = transform.world_to_nav(trunk);

        assert!(!grid.is_walkable(cell, &WalkOptions::ground(24.0)));

        let mut phased = WalkOptions::ground(24.0);
        phased.phased = true;
        assert!(grid.is_walkable(cell, &phased));

        let mut ignoring = WalkOptions::ground(24.0);
        ignoring.ignore_trees = true;
        assert!(grid.is_walkable(cell, &ignoring));
    }
}
