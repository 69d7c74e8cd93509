//! Walkability seam between the navigation grid and movement consumers.

use crate::{CoordinateTransform, NavCell};

/// Unit traits that influence walkability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkOptions {
    /// Radius of the unit's circular footprint in world units.
    pub collision_radius: f32,
    /// Flying units only need to stay inside the grid.
    pub flying: bool,
    /// Phased units pass through trees.
    pub phased: bool,
    /// Ignores tree collision without phasing.
    pub ignore_trees: bool,
}

impl WalkOptions {
    /// Options for a ground unit of the given radius.
    #[must_use]
    pub const fn ground(collision_radius: f32) -> Self {
        Self {
            collision_radius,
            flying: false,
            phased: false,
            ignore_trees: false,
        }
    }

    /// Options for a flying unit.
    #[must_use]
    pub const fn flying() -> Self {
        Self {
            collision_radius: 0.0,
            flying: true,
            phased: false,
            ignore_trees: false,
        }
    }

    /// Whether tree collision applies to the unit.
    #[must_use]
    pub const fn collides_with_trees(&self) -> bool {
        !self.phased && !self.ignore_trees
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::ground(crate::HERO_COLLISION_RADIUS)
    }
}

/// Read access to walkability of navigation cells.
pub trait Walkability {
    /// Transform matching the navigation grid's resolution.
    fn transform(&self) -> CoordinateTransform;

    /// Whether a unit with the given options may stand on the cell.
    fn is_walkable(&self, cell: NavCell, options: &WalkOptions) -> bool;
}
