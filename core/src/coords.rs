//! Coordinate spaces of the map and the pure conversions between them.
//!
//! Four spaces exist: world (game units, y grows north), canvas (pixels,
//! y grows down), navigation grid (fine cells, image-style rows) and vision
//! grid (coarse cells, y grows north). Values from different spaces have
//! distinct types so they can only be mixed through [`CoordinateTransform`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest world coordinate on either axis.
pub const WORLD_MIN: f32 = -9600.0;
/// Largest world coordinate on either axis.
pub const WORLD_MAX: f32 = 9600.0;
/// Edge length of the square world.
pub const WORLD_SIZE: f32 = WORLD_MAX - WORLD_MIN;
/// World units covered by one navigation cell.
pub const NAV_CELL_SIZE: f32 = 8.0;
/// World units covered by one vision cell.
pub const VISION_CELL_SIZE: f32 = 64.0;
/// Navigation grid edge length matching the full world at [`NAV_CELL_SIZE`].
pub const DEFAULT_NAV_DIMENSION: u32 = 2401;
/// Vision grid edge length matching the full world at [`VISION_CELL_SIZE`].
pub const VISION_GRID_DIMENSION: i32 = 301;

/// Position expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// World origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate, growing north.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another world point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Converts the point into a `glam` vector for arithmetic.
    #[must_use]
    pub const fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Builds a point from a `glam` vector.
    #[must_use]
    pub const fn from_vec2(vector: Vec2) -> Self {
        Self::new(vector.x, vector.y)
    }
}

/// Position expressed in canvas pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasPoint {
    x: f32,
    y: f32,
}

impl CanvasPoint {
    /// Creates a new canvas point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal pixel offset.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical pixel offset, growing down.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Integer cell of the fine navigation grid. Row zero is the top of the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavCell {
    x: i32,
    y: i32,
}

impl NavCell {
    /// Creates a new navigation cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Cell displaced by the provided offsets.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Integer cell of the coarse vision grid. Row zero is the bottom of the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisionCell {
    x: i32,
    y: i32,
}

impl VisionCell {
    /// Creates a new vision cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Cell displaced by the provided offsets.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared Euclidean distance measured in cells.
    #[must_use]
    pub const fn distance_squared(&self, other: VisionCell) -> i32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Whether the cell lies inside a square grid of the given edge length.
    #[must_use]
    pub const fn is_within(&self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < width && self.y < height
    }
}

/// Stateless conversions parameterized by the navigation-grid resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateTransform {
    nav_width: u32,
    nav_height: u32,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::new(DEFAULT_NAV_DIMENSION, DEFAULT_NAV_DIMENSION)
    }
}

impl CoordinateTransform {
    /// Creates a transform for a navigation grid of the given dimensions.
    #[must_use]
    pub const fn new(nav_width: u32, nav_height: u32) -> Self {
        Self {
            nav_width,
            nav_height,
        }
    }

    /// Dimensions of the navigation grid as `(width, height)`.
    #[must_use]
    pub const fn nav_dimensions(&self) -> (u32, u32) {
        (self.nav_width, self.nav_height)
    }

    /// Whether the navigation cell lies inside the grid.
    #[must_use]
    pub const fn contains_nav(&self, cell: NavCell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as i64) < self.nav_width as i64
            && (cell.y as i64) < self.nav_height as i64
    }

    /// Maps a world point onto a canvas of the given pixel dimensions.
    #[must_use]
    pub fn world_to_canvas(
        &self,
        point: WorldPoint,
        canvas_width: f32,
        canvas_height: f32,
    ) -> CanvasPoint {
        CanvasPoint::new(
            (point.x - WORLD_MIN) / WORLD_SIZE * canvas_width,
            (WORLD_MAX - point.y) / WORLD_SIZE * canvas_height,
        )
    }

    /// Maps a canvas pixel back into world units.
    #[must_use]
    pub fn canvas_to_world(
        &self,
        point: CanvasPoint,
        canvas_width: f32,
        canvas_height: f32,
    ) -> WorldPoint {
        if canvas_width <= 0.0 || canvas_height <= 0.0 {
            return WorldPoint::ORIGIN;
        }
        WorldPoint::new(
            point.x / canvas_width * WORLD_SIZE + WORLD_MIN,
            WORLD_MAX - point.y / canvas_height * WORLD_SIZE,
        )
    }

    /// Rounds a world point to the nearest navigation cell, clamped to the grid.
    #[must_use]
    pub fn world_to_nav(&self, point: WorldPoint) -> NavCell {
        let grid_x = ((point.x - WORLD_MIN) / NAV_CELL_SIZE).round() as i32;
        let grid_y = ((point.y - WORLD_MIN) / NAV_CELL_SIZE).round() as i32;
        let max_x = self.nav_width.saturating_sub(1) as i32;
        let max_y = self.nav_height.saturating_sub(1) as i32;
        let flipped_y = self.nav_height as i32 - grid_y - 1;
        NavCell::new(grid_x.clamp(0, max_x), flipped_y.clamp(0, max_y))
    }

    /// World position of a navigation cell's sample point.
    #[must_use]
    pub fn nav_to_world(&self, cell: NavCell) -> WorldPoint {
        let grid_y = self.nav_height as i32 - cell.y - 1;
        WorldPoint::new(
            cell.x as f32 * NAV_CELL_SIZE + WORLD_MIN,
            grid_y as f32 * NAV_CELL_SIZE + WORLD_MIN,
        )
    }

    /// Buckets a world point into its vision cell, clamped to the vision grid.
    #[must_use]
    pub fn world_to_vision(point: WorldPoint) -> VisionCell {
        let max = VISION_GRID_DIMENSION - 1;
        let x = ((point.x - WORLD_MIN) / VISION_CELL_SIZE).floor() as i32;
        let y = ((point.y - WORLD_MIN) / VISION_CELL_SIZE).floor() as i32;
        VisionCell::new(x.clamp(0, max), y.clamp(0, max))
    }

    /// World position of a vision cell's center.
    #[must_use]
    pub fn vision_to_world(cell: VisionCell) -> WorldPoint {
        let half = VISION_CELL_SIZE / 2.0;
        WorldPoint::new(
            cell.x as f32 * VISION_CELL_SIZE + WORLD_MIN + half,
            cell.y as f32 * VISION_CELL_SIZE + WORLD_MIN + half,
        )
    }

    /// Euclidean distance between two world points.
    #[must_use]
    pub fn distance(a: WorldPoint, b: WorldPoint) -> f32 {
        a.distance(b)
    }

    /// Whether the point lies inside the world bounds, edges included.
    #[must_use]
    pub fn is_in_world(point: WorldPoint) -> bool {
        (WORLD_MIN..=WORLD_MAX).contains(&point.x) && (WORLD_MIN..=WORLD_MAX).contains(&point.y)
    }

    /// Moves the point onto the nearest in-bounds position.
    #[must_use]
    pub fn clamp_to_world(point: WorldPoint) -> WorldPoint {
        WorldPoint::new(
            point.x.clamp(WORLD_MIN, WORLD_MAX),
            point.y.clamp(WORLD_MIN, WORLD_MAX),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nav_round_trip_preserves_cells() {
        let transform = CoordinateTransform::default();
        for (x, y) in [(0, 0), (1200, 1200), (2400, 0), (17, 2399), (2400, 2400)] {
            let cell = NavCell::new(x, y);
            let world = transform.nav_to_world(cell);
            assert_eq!(transform.world_to_nav(world), cell, "round trip of {cell:?}");
        }
    }

    #[test]
    fn nav_rows_are_flipped_against_world_y() {
        let transform = CoordinateTransform::default();
        let north = transform.world_to_nav(WorldPoint::new(WORLD_MIN, WORLD_MAX));
        let south = transform.world_to_nav(WorldPoint::new(WORLD_MIN, WORLD_MIN));

        assert_eq!(north, NavCell::new(0, 0));
        assert_eq!(south, NavCell::new(0, 2400));
    }

    #[test]
    fn world_to_nav_clamps_outside_points() {
        let transform = CoordinateTransform::new(100, 50);
        let cell = transform.world_to_nav(WorldPoint::new(50_000.0, -50_000.0));

        assert_eq!(cell, NavCell::new(99, 49));
    }

    #[test]
    fn canvas_mapping_flips_vertical_axis() {
        let transform = CoordinateTransform::default();
        let top_left =
            transform.world_to_canvas(WorldPoint::new(WORLD_MIN, WORLD_MAX), 1024.0, 1024.0);
        let center = transform.world_to_canvas(WorldPoint::ORIGIN, 1024.0, 1024.0);

        assert_eq!(top_left, CanvasPoint::new(0.0, 0.0));
        assert_eq!(center, CanvasPoint::new(512.0, 512.0));

        let back = transform.canvas_to_world(CanvasPoint::new(256.0, 256.0), 1024.0, 1024.0);
        assert_eq!(back, WorldPoint::new(-4800.0, 4800.0));
    }

    #[test]
    fn vision_cells_use_floor_buckets_and_centers() {
        assert_eq!(
            CoordinateTransform::world_to_vision(WorldPoint::ORIGIN),
            VisionCell::new(150, 150)
        );
        assert_eq!(
            CoordinateTransform::world_to_vision(WorldPoint::new(-0.5, 63.9)),
            VisionCell::new(149, 150)
        );
        assert_eq!(
            CoordinateTransform::vision_to_world(VisionCell::new(150, 150)),
            WorldPoint::new(32.0, 32.0)
        );
    }

    #[test]
    fn world_bounds_are_inclusive() {
        assert!(CoordinateTransform::is_in_world(WorldPoint::new(WORLD_MAX, WORLD_MIN)));
        assert!(!CoordinateTransform::is_in_world(WorldPoint::new(WORLD_MAX + 0.1, 0.0)));
        assert!(!CoordinateTransform::is_in_world(WorldPoint::new(0.0, WORLD_MIN - 0.1)));
    }

    #[test]
    fn clamp_moves_outside_points_onto_boundary() {
        let clamped = CoordinateTransform::clamp_to_world(WorldPoint::new(12_000.0, -20_000.0));
        assert_eq!(clamped, WorldPoint::new(WORLD_MAX, WORLD_MIN));

        let inside = WorldPoint::new(10.0, -10.0);
        assert_eq!(CoordinateTransform::clamp_to_world(inside), inside);
    }
}
