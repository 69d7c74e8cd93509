#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Lanewatch simulation headless.
//!
//! Static map data is optional: without a lane document the runner uses
//! three straight demo lanes, without vision data the map is flat and
//! treeless, and without a navigation field everything is walkable.

use std::{fs, path::PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use lanewatch_core::{
    Command, Event, Lane, LanePath, LanePaths, Team, VisionTerrain, WorldPoint,
    DEFAULT_NAV_DIMENSION, VISION_GRID_DIMENSION,
};
use lanewatch_system_combat_loop::{Simulation, SimulationConfig};
use lanewatch_system_vision::{light_polygons, light_polygons_world, WardKind};
use lanewatch_world::{
    self as world, parse_lane_paths, parse_vision_data, NavigationGrid, TreeTable,
    WalkabilityField, World,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Runs lane waves, creep combat and vision for a span of game time.
#[derive(Debug, Parser)]
#[command(name = "lanewatch", version, about)]
struct Args {
    /// Lane path JSON document.
    #[arg(long)]
    lanes: Option<PathBuf>,
    /// Vision terrain JSON document exported by the asset pipeline.
    #[arg(long)]
    vision: Option<PathBuf>,
    /// Raw navigation field, row 0 at the top of the map.
    #[arg(long)]
    nav: Option<PathBuf>,
    /// Edge length of the square navigation field in cells.
    #[arg(long, default_value_t = DEFAULT_NAV_DIMENSION)]
    nav_size: u32,
    /// Bytes per navigation cell: 1 for grayscale masks, 4 for RGBA.
    #[arg(long, default_value_t = 1)]
    nav_channels: usize,
    /// Simulation configuration in TOML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Game time to scrub to before running.
    #[arg(long, default_value_t = 0.0)]
    start: f64,
    /// Wall seconds to simulate.
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,
    /// Wall seconds per frame.
    #[arg(long, default_value_t = 0.1)]
    frame: f64,
    /// Where to place the probe observer ward, as `x,y` in world units.
    #[arg(long, value_parser = parse_point, default_value = "0,0")]
    probe: WorldPoint,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    game_time: f64,
    wave: u32,
    radiant_creeps: usize,
    dire_creeps: usize,
    deaths: usize,
    damage_dealt: f32,
    probe_lit_cells: usize,
    probe_polygons: usize,
    probe_outline_points: usize,
    probe_display_radius: f32,
    expiring_wards: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    ensure!(args.frame > 0.0, "frame delta must be positive");
    ensure!(args.seconds >= 0.0, "run length must not be negative");

    let config = load_config(args.config.as_ref())?;
    let (world, terrain) = load_world(&args)?;
    let mut simulation = Simulation::new(&config, world, terrain);
    if args.start > 0.0 {
        simulation.set_game_time(args.start);
    }

    let summary = run(&mut simulation, &args)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to encode summary")?
        );
    } else {
        println!("game time      {:.1} s (wave {})", summary.game_time, summary.wave);
        println!("radiant creeps {}", summary.radiant_creeps);
        println!("dire creeps    {}", summary.dire_creeps);
        println!("deaths         {} ({:.0} damage)", summary.deaths, summary.damage_dealt);
        println!(
            "probe ward     {} lit cells in {} polygons ({} outline points, radius {:.0})",
            summary.probe_lit_cells,
            summary.probe_polygons,
            summary.probe_outline_points,
            summary.probe_display_radius
        );
        println!("expiring wards {}", summary.expiring_wards);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn run(simulation: &mut Simulation, args: &Args) -> Result<Summary> {
    let frames = (args.seconds / args.frame).ceil() as u64;
    info!(frames, frame = args.frame, "running headless simulation");

    let mut deaths = 0;
    let mut damage_dealt = 0.0;
    for _ in 0..frames {
        simulation.update(args.frame);
        for event in simulation.last_events() {
            match event {
                Event::UnitDied { .. } => deaths += 1,
                Event::UnitDamaged { amount, .. } => damage_dealt += *amount,
                _ => {}
            }
        }
    }

    let ward = simulation
        .place_ward(Team::Radiant, WardKind::Observer, args.probe)
        .with_context(|| format!("cannot place probe ward at {:?}", args.probe))?;
    let lit = simulation.ward_vision(ward);
    let polygons = light_polygons(&lit);
    let outline_points = light_polygons_world(&lit).iter().map(Vec::len).sum::<usize>();
    let display_radius = simulation
        .fog()
        .ward(ward)
        .map_or(0.0, |probe| probe.display_radius(simulation.fog().is_day()));

    let stats = simulation.stats();
    info!(
        game_time = stats.game_time,
        radiant = stats.radiant_creeps,
        dire = stats.dire_creeps,
        deaths,
        "simulation finished"
    );
    Ok(Summary {
        game_time: stats.game_time,
        wave: stats.wave_number,
        radiant_creeps: stats.radiant_creeps,
        dire_creeps: stats.dire_creeps,
        deaths,
        damage_dealt,
        probe_lit_cells: lit.len(),
        probe_polygons: polygons.len(),
        probe_outline_points: outline_points,
        probe_display_radius: display_radius,
        expiring_wards: stats.expiring_wards,
    })
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    SimulationConfig::from_toml(&source)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn load_world(args: &Args) -> Result<(World, VisionTerrain)> {
    let (terrain, trees) = match &args.vision {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read vision data {}", path.display()))?;
            let data = parse_vision_data(&json)
                .with_context(|| format!("invalid vision data {}", path.display()))?;
            let trees = TreeTable::new(&data.trees, data.terrain.elevation_levels());
            info!(trees = trees.len(), "vision data loaded");
            (data.terrain, trees)
        }
        None => (
            VisionTerrain::flat(VISION_GRID_DIMENSION, VISION_GRID_DIMENSION, 0),
            TreeTable::default(),
        ),
    };

    let field = match &args.nav {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("failed to read navigation field {}", path.display()))?;
            WalkabilityField::from_pixels(args.nav_size, args.nav_size, &bytes, args.nav_channels)
                .with_context(|| format!("invalid navigation field {}", path.display()))?
        }
        None => WalkabilityField::open(args.nav_size, args.nav_size),
    };

    let lanes = match &args.lanes {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read lane paths {}", path.display()))?;
            parse_lane_paths(&json)
                .with_context(|| format!("invalid lane paths {}", path.display()))?
        }
        None => {
            warn!("no lane paths given, using straight demo lanes");
            demo_lanes()
        }
    };

    let mut world = World::with_navigation(NavigationGrid::new(field, trees));
    let mut events = Vec::new();
    world::apply(&mut world, Command::ConfigureLanes { paths: lanes }, &mut events);
    Ok((world, terrain))
}

fn demo_lanes() -> LanePaths {
    let mut lanes = LanePaths::default();
    for (index, lane) in Lane::ALL.into_iter().enumerate() {
        let x = (index as f32 - 1.0) * 4_000.0;
        for team in Team::ALL {
            let sign = if team == Team::Radiant { -1.0 } else { 1.0 };
            let spawner = WorldPoint::new(x, 7_000.0 * sign);
            *lanes.get_mut(team, lane) = LanePath::new(
                spawner,
                vec![spawner, WorldPoint::new(x, 0.0), WorldPoint::new(x, -7_000.0 * sign)],
            );
        }
    }
    lanes
}

fn parse_point(raw: &str) -> Result<WorldPoint, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{raw}`"))?;
    let x = x.trim().parse::<f32>().map_err(|error| error.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|error| error.to_string())?;
    Ok(WorldPoint::new(x, y))
}
