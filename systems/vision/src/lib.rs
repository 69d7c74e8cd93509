#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Line-of-sight simulation over the coarse vision grid.
//!
//! [`VisionSimulator`] computes the cells an eye can see with a precise
//! shadowcasting sweep. [`FogOfWar`] layers ward bookkeeping and cached
//! building vision on top of it, and [`light_polygons`] turns a lit set into
//! rendering outlines. Tree state is read through the
//! [`lanewatch_core::TreeOcclusion`] seam and never copied.

mod fog;
mod polygons;
mod shadowcast;

pub use fog::{FogOfWar, Ward, WardKind, WARD_HIT_RADIUS};
pub use polygons::{light_polygons, light_polygons_world, LightPolygon};
pub use shadowcast::VisionSimulator;
