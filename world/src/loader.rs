//! Parsers for the static map data produced by the asset pipeline.
//!
//! Loaders fail on the first malformed or missing entry instead of falling
//! back to defaults that could read as "no occlusion".

use std::collections::HashMap;

use lanewatch_core::{
    Lane, LanePaths, Team, TreeRecord, VisionCell, VisionTerrain, WorldPoint, NAV_CELL_SIZE,
    VISION_CELL_SIZE, VISION_GRID_DIMENSION, WORLD_MIN,
};
use serde::Deserialize;

/// Fine tree grid cells per vision cell edge.
const TREE_GRID_FACTOR: i32 = (VISION_CELL_SIZE / NAV_CELL_SIZE) as i32;

/// Failures raised while loading static map data.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The document is not valid JSON or misses a required field.
    #[error("malformed map data: {0}")]
    Json(#[from] serde_json::Error),
    /// A buffer does not match the declared grid dimensions.
    #[error("buffer holds {actual} entries, expected {expected}")]
    BufferSize {
        /// Entries implied by the grid dimensions.
        expected: usize,
        /// Entries actually provided.
        actual: usize,
    },
    /// The grid has no cells.
    #[error("navigation grid must have at least one cell")]
    EmptyGrid,
    /// Pixel buffers need at least one channel.
    #[error("pixel buffers need at least one channel")]
    ChannelCount,
    /// A cell key is not of the form `"x,y"`.
    #[error("invalid cell key `{0}`")]
    CellKey(String),
    /// A cell lies outside the vision grid.
    #[error("cell ({x}, {y}) lies outside the vision grid")]
    CellOutOfBounds {
        /// Column of the cell.
        x: i32,
        /// Row of the cell.
        y: i32,
    },
    /// A lane has no waypoints to walk.
    #[error("{team:?} {lane:?} lane has no waypoints")]
    EmptyLane {
        /// Team owning the lane.
        team: Team,
        /// Lane without waypoints.
        lane: Lane,
    },
}

/// Static vision data: per-cell terrain plus the tree list.
#[derive(Clone, Debug, PartialEq)]
pub struct VisionData {
    /// Elevation, blocker and no-ward cells.
    pub terrain: VisionTerrain,
    /// Trees converted to world and vision coordinates.
    pub trees: Vec<TreeRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVisionData {
    elevation_values: Vec<i32>,
    elevation: HashMap<String, i32>,
    gridnav: Vec<[i32; 2]>,
    ent_fow_blocker_node: Vec<String>,
    tools_no_wards: Vec<String>,
    trees: Vec<[i32; 3]>,
}

/// Parses the vision document exported by the asset pipeline.
pub fn parse_vision_data(json: &str) -> Result<VisionData, LoadError> {
    let raw: RawVisionData = serde_json::from_str(json)?;
    let mut terrain = VisionTerrain::new(VISION_GRID_DIMENSION, VISION_GRID_DIMENSION);

    for level in raw.elevation_values {
        terrain.add_elevation_level(level);
    }
    for (key, value) in &raw.elevation {
        terrain.set_elevation(parse_cell_key(key)?, *value);
    }
    for [x, y] in raw.gridnav {
        terrain.mark_nav_blocked(checked_cell(x, y)?);
    }
    for key in &raw.ent_fow_blocker_node {
        terrain.mark_opaque(parse_cell_key(key)?);
    }
    for key in &raw.tools_no_wards {
        terrain.mark_no_ward(parse_cell_key(key)?);
    }

    let trees = raw
        .trees
        .into_iter()
        .map(|[x, y, elevation]| tree_record(x, y, elevation))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VisionData { terrain, trees })
}

/// Parses the lane path document and rejects lanes without waypoints.
pub fn parse_lane_paths(json: &str) -> Result<LanePaths, LoadError> {
    let paths: LanePaths = serde_json::from_str(json)?;
    for team in Team::ALL {
        for lane in Lane::ALL {
            if paths.get(team, lane).waypoints.is_empty() {
                return Err(LoadError::EmptyLane { team, lane });
            }
        }
    }
    Ok(paths)
}

fn tree_record(x: i32, y: i32, elevation: i32) -> Result<TreeRecord, LoadError> {
    let cell = checked_cell(
        x.div_euclid(TREE_GRID_FACTOR),
        y.div_euclid(TREE_GRID_FACTOR),
    )?;
    Ok(TreeRecord {
        position: WorldPoint::new(
            x as f32 * NAV_CELL_SIZE + WORLD_MIN,
            y as f32 * NAV_CELL_SIZE + WORLD_MIN,
        ),
        cell,
        elevation,
    })
}

fn parse_cell_key(key: &str) -> Result<VisionCell, LoadError> {
    let invalid = || LoadError::CellKey(key.to_owned());
    let (x, y) = key.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
    checked_cell(x, y)
}

fn checked_cell(x: i32, y: i32) -> Result<VisionCell, LoadError> {
    let cell = VisionCell::new(x, y);
    if cell.is_within(VISION_GRID_DIMENSION, VISION_GRID_DIMENSION) {
        Ok(cell)
    } else {
        Err(LoadError::CellOutOfBounds { x, y })
    }
}
