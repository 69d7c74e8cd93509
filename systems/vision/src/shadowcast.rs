//! Precise shadowcasting over the coarse vision grid.

use std::{
    collections::BTreeSet,
    f64::consts::{FRAC_1_SQRT_2, PI, TAU},
};

use lanewatch_core::{PlacementError, TreeOcclusion, VisionCell, VisionTerrain};
use tracing::trace;

/// Offsets that are always visible from the origin: the 3x3 block plus the
/// cells of the 5x5 ring whose taxicab distance is at most three.
const SELF_VISION: [(i32, i32); 21] = [
    (0, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (2, -1),
    (2, 0),
    (2, 1),
    (-1, -2),
    (0, -2),
    (1, -2),
    (-1, 2),
    (0, 2),
    (1, 2),
];

/// Line-of-sight simulator holding the static terrain and the latest result.
#[derive(Clone, Debug)]
pub struct VisionSimulator {
    terrain: VisionTerrain,
    lights: BTreeSet<VisionCell>,
}

impl VisionSimulator {
    /// Creates a simulator over the provided terrain.
    #[must_use]
    pub fn new(terrain: VisionTerrain) -> Self {
        Self {
            terrain,
            lights: BTreeSet::new(),
        }
    }

    /// Static terrain the simulator casts over.
    #[must_use]
    pub fn terrain(&self) -> &VisionTerrain {
        &self.terrain
    }

    /// Cells lit by the most recent [`Self::update_visibility`] call.
    #[must_use]
    pub fn lights(&self) -> &BTreeSet<VisionCell> {
        &self.lights
    }

    /// Whether the cell was lit by the most recent sweep.
    #[must_use]
    pub fn is_lit(&self, cell: VisionCell) -> bool {
        self.lights.contains(&cell)
    }

    /// Recomputes the lit cells for an eye at `origin` seeing `radius` cells far.
    ///
    /// The previous result is discarded. Light travels ring by ring: a cell is
    /// reached when the angle to its center lies outside every shadow cast by
    /// blockers of earlier rings. Blockers are opaque cells and cells covered
    /// by a tree that is taller than the eye. A reached cell is lit unless it
    /// is opaque, covered by a tree, lacks elevation data or sits higher than
    /// the eye.
    pub fn update_visibility<T>(
        &mut self,
        trees: &T,
        origin: VisionCell,
        radius: i32,
    ) -> &BTreeSet<VisionCell>
    where
        T: TreeOcclusion + ?Sized,
    {
        self.lights.clear();
        if !self.terrain.contains(origin) {
            return &self.lights;
        }
        let eye = self.terrain.elevation(origin).unwrap_or(0);

        for (dx, dy) in SELF_VISION {
            self.admit(trees, origin.offset(dx, dy), eye);
        }
        if self.terrain.is_opaque(origin) {
            return &self.lights;
        }

        let mut shadows = Shadows::default();
        let mut pending = Vec::new();
        for ring in rings(radius) {
            for (dx, dy) in ring {
                let cell = origin.offset(dx, dy);
                if !self.terrain.contains(cell) {
                    continue;
                }
                let distance = f64::from(dx * dx + dy * dy).sqrt();
                let angle = f64::from(dy).atan2(f64::from(dx));
                if !shadows.covers(angle) {
                    self.admit(trees, cell, eye);
                }
                if self.blocks_light(trees, cell, eye) {
                    pending.push(Arc {
                        center: angle,
                        half_width: (FRAC_1_SQRT_2 / distance).min(1.0).asin(),
                    });
                }
            }
            shadows.arcs.append(&mut pending);
        }

        trace!(
            x = origin.x(),
            y = origin.y(),
            radius,
            lit = self.lights.len(),
            "visibility updated"
        );
        &self.lights
    }

    /// Whether a ward may be placed on the cell.
    ///
    /// The bounds check always applies; the flags enable the navigation,
    /// no-ward zone and alive tree checks.
    #[must_use]
    pub fn is_valid_placement<T>(
        &self,
        trees: &T,
        cell: VisionCell,
        check_nav: bool,
        check_no_ward: bool,
        check_trees: bool,
    ) -> bool
    where
        T: TreeOcclusion + ?Sized,
    {
        self.check_placement(trees, cell, check_nav, check_no_ward, check_trees)
            .is_ok()
    }

    /// Same as [`Self::is_valid_placement`], reporting the failed check.
    pub fn check_placement<T>(
        &self,
        trees: &T,
        cell: VisionCell,
        check_nav: bool,
        check_no_ward: bool,
        check_trees: bool,
    ) -> Result<(), PlacementError>
    where
        T: TreeOcclusion + ?Sized,
    {
        if !self.terrain.contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if check_nav && self.terrain.is_nav_blocked(cell) {
            return Err(PlacementError::NavigationBlocked);
        }
        if check_no_ward && self.terrain.is_no_ward(cell) {
            return Err(PlacementError::NoWardZone);
        }
        if check_trees && trees.is_covered(cell) {
            return Err(PlacementError::TreeOccupied);
        }
        Ok(())
    }

    fn blocks_light<T>(&self, trees: &T, cell: VisionCell, eye: i32) -> bool
    where
        T: TreeOcclusion + ?Sized,
    {
        self.terrain.is_opaque(cell) || trees.blocks_light(cell, eye)
    }

    fn admit<T>(&mut self, trees: &T, cell: VisionCell, eye: i32)
    where
        T: TreeOcclusion + ?Sized,
    {
        if !self.terrain.contains(cell) || self.terrain.is_opaque(cell) || trees.is_covered(cell) {
            return;
        }
        if self.terrain.elevation(cell).is_some_and(|height| height <= eye) {
            let _ = self.lights.insert(cell);
        }
    }
}

/// Angular interval centered on a blocker, in radians.
#[derive(Clone, Copy, Debug)]
struct Arc {
    center: f64,
    half_width: f64,
}

#[derive(Debug, Default)]
struct Shadows {
    arcs: Vec<Arc>,
}

impl Shadows {
    fn covers(&self, angle: f64) -> bool {
        self.arcs.iter().any(|arc| {
            let offset = (angle - arc.center + PI).rem_euclid(TAU) - PI;
            offset.abs() < arc.half_width
        })
    }
}

/// Offsets within `radius`, grouped by the ceiling of their distance.
///
/// Ring zero (the origin) is omitted and offsets at exactly `radius` are
/// excluded, so growing the radius only appends cells.
fn rings(radius: i32) -> Vec<Vec<(i32, i32)>> {
    if radius <= 0 {
        return Vec::new();
    }
    let limit = radius * radius;
    let mut rings = vec![Vec::new(); radius as usize];
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let squared = dx * dx + dy * dy;
            if squared == 0 || squared >= limit {
                continue;
            }
            rings[ceil_sqrt(squared) as usize - 1].push((dx, dy));
        }
    }
    rings
}

fn ceil_sqrt(value: i32) -> i32 {
    let mut root = f64::from(value).sqrt() as i32;
    while root * root < value {
        root += 1;
    }
    while root > 0 && (root - 1) * (root - 1) >= value {
        root -= 1;
    }
    root
}
