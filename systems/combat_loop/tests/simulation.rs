use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use lanewatch_core::{
    BuildingKind, Command, CoordinateTransform, CreepBehavior, Event, Lane, LanePath, LanePaths,
    NavCell, PathPlan, PlacementError, Team, TeamView, TowerTier, UnitId, VisionTerrain, WorldPoint,
    VISION_GRID_DIMENSION,
};
use lanewatch_system_combat_loop::{ControlError, Simulation, SimulationConfig};
use lanewatch_system_creep_ai::effective_range;
use lanewatch_system_lane_waves::{Breakpoint, Composition, WaveSchedule};
use lanewatch_system_vision::WardKind;
use lanewatch_world::{self as world, query, NavigationGrid, TreeTable, WalkabilityField, World};
use pretty_assertions::assert_eq;

fn simulation(world: World) -> Simulation {
    Simulation::new(
        &SimulationConfig::default(),
        world,
        VisionTerrain::flat(VISION_GRID_DIMENSION, VISION_GRID_DIMENSION, 0),
    )
}

fn mid_lanes_world() -> World {
    let mut lanes = LanePaths::default();
    for team in Team::ALL {
        let sign = if team == Team::Radiant { -1.0 } else { 1.0 };
        let spawner = WorldPoint::new(0.0, 6_000.0 * sign);
        *lanes.get_mut(team, Lane::Mid) =
            LanePath::new(spawner, vec![spawner, WorldPoint::new(0.0, -6_000.0 * sign)]);
    }
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::ConfigureLanes { paths: lanes }, &mut events);
    world
}

fn plan_of(simulation: &Simulation, unit: UnitId) -> PathPlan {
    query::unit(simulation.world(), unit)
        .expect("unit exists")
        .path_plan
}

fn position_of(simulation: &Simulation, unit: UnitId) -> WorldPoint {
    query::unit(simulation.world(), unit)
        .expect("unit exists")
        .position
}

#[test]
fn heroes_walk_their_waypoint_route() {
    let mut simulation = simulation(World::new());
    let hero = simulation
        .create_hero(Team::Radiant, WorldPoint::ORIGIN, "scout")
        .expect("hero created");

    let first = simulation
        .add_waypoint(hero, WorldPoint::new(240.0, 0.0))
        .expect("reachable");
    let second = simulation
        .add_waypoint(hero, WorldPoint::new(240.0, 240.0))
        .expect("reachable");
    assert_eq!((first.id, second.id), (1, 2));

    let plan = plan_of(&simulation, hero);
    assert_eq!(plan.current_path.first().copied(), Some(WorldPoint::ORIGIN));
    assert_eq!(plan.current_path.last().copied(), Some(WorldPoint::new(240.0, 240.0)));
    assert!(!plan.is_moving);

    simulation.update(0.1);
    assert_eq!(position_of(&simulation, hero), WorldPoint::ORIGIN, "planning alone never moves");

    assert_eq!(simulation.start_moving(hero), Ok(true));
    for _ in 0..8 {
        simulation.update(0.1);
    }
    assert!(position_of(&simulation, hero).distance(WorldPoint::new(240.0, 0.0)) < 1.0);
    assert_eq!(plan_of(&simulation, hero).waypoints, vec![second]);

    for _ in 0..12 {
        simulation.update(0.1);
    }
    assert_eq!(position_of(&simulation, hero), WorldPoint::new(240.0, 240.0));
    assert_eq!(plan_of(&simulation, hero), PathPlan::default(), "finished routes clear");
}

#[test]
fn unreachable_waypoints_leave_the_plan_untouched() {
    let field = WalkabilityField::open(2401, 2401)
        .with_blocked_rect(NavCell::new(1300, 1300), NavCell::new(1400, 1400));
    let world = World::with_navigation(NavigationGrid::new(field, TreeTable::default()));
    let mut simulation = simulation(world);
    let hero = simulation
        .create_hero(Team::Dire, WorldPoint::ORIGIN, "blink")
        .expect("hero created");

    let _ = simulation
        .add_waypoint(hero, WorldPoint::new(0.0, -400.0))
        .expect("reachable");
    let before = plan_of(&simulation, hero);

    let blocked = CoordinateTransform::default().nav_to_world(NavCell::new(1350, 1350));
    let rejected = simulation.add_waypoint(hero, blocked);

    assert_eq!(
        rejected,
        Err(ControlError::Unreachable {
            from: WorldPoint::new(0.0, -400.0),
            to: blocked,
        })
    );
    assert_eq!(plan_of(&simulation, hero), before);

    assert_eq!(
        simulation.remove_last_waypoint(hero).map(|waypoint| waypoint.map(|w| w.id)),
        Ok(Some(1))
    );
    assert!(plan_of(&simulation, hero).current_path.is_empty());
    assert_eq!(simulation.start_moving(hero), Ok(false), "nothing left to walk");
}

#[test]
fn hero_orders_reject_creeps_and_missing_units() {
    let mut simulation = simulation(mid_lanes_world());
    simulation.set_game_time(0.5);
    let creep = UnitId::new(1);
    assert!(query::unit(simulation.world(), creep).is_some_and(|unit| unit.creep().is_some()));

    assert_eq!(
        simulation.add_waypoint(creep, WorldPoint::ORIGIN),
        Err(ControlError::NotAHero(creep))
    );
    assert_eq!(
        simulation.clear_waypoints(UnitId::new(404)),
        Err(ControlError::UnknownUnit(UnitId::new(404)))
    );
}

#[test]
fn buildings_and_wards_light_the_map() {
    let mut simulation = simulation(World::new());
    let _ = simulation.place_building(
        BuildingKind::Tower(TowerTier::One),
        Team::Radiant,
        WorldPoint::new(2_000.0, 0.0),
    );

    let day = simulation.visibility(TeamView::Radiant).len();
    simulation.set_daytime(false);
    let night = simulation.visibility(TeamView::Radiant).len();
    assert!(night > 0 && night < day, "night vision {night} should be below {day}");
    assert!(simulation.visibility(TeamView::Dire).is_empty());

    let observer = simulation
        .place_ward(Team::Radiant, WardKind::Observer, WorldPoint::ORIGIN)
        .expect("open ground");
    let _sentry = simulation
        .place_ward(Team::Radiant, WardKind::Sentry, WorldPoint::new(-1_000.0, 0.0))
        .expect("open ground");
    assert!(simulation
        .ward_vision(observer)
        .contains(&CoordinateTransform::world_to_vision(WorldPoint::ORIGIN)));
    assert_eq!(simulation.ward_at(WorldPoint::new(50.0, 0.0)), Some(observer));
    assert_eq!(
        simulation.place_ward(Team::Dire, WardKind::Observer, WorldPoint::new(20_000.0, 0.0)),
        Err(ControlError::Placement(PlacementError::OutOfBounds))
    );

    simulation.set_game_time(340.0);
    assert_eq!((simulation.stats().wards, simulation.stats().expiring_wards), (2, 1));

    simulation.set_game_time(400.0);
    assert_eq!(simulation.stats().wards, 1, "observers expire, sentries stay");
    assert_eq!(simulation.stats().expiring_wards, 0);
}

#[test]
fn aggro_pulls_enemy_creeps_after_the_immunity_window() {
    let mut simulation = simulation(mid_lanes_world());
    let hero = simulation
        .create_hero(Team::Radiant, WorldPoint::new(0.0, 5_800.0), "puller")
        .expect("hero created");

    simulation.set_game_time(120.0);
    assert_eq!(simulation.draw_aggro(hero), 0, "too early in the game");

    simulation.set_game_time(600.0);
    let stats = simulation.stats();
    assert_eq!(stats.wave_number, 20);
    let pulled = simulation.draw_aggro(hero);
    assert_eq!(pulled, stats.dire_creeps, "the whole replayed Dire column stands nearby");

    let chasing = query::unit_view(simulation.world())
        .alive()
        .filter(|unit| unit.creep().is_some_and(|state| state.behavior == CreepBehavior::Chase))
        .count();
    assert_eq!(chasing, pulled);
}

#[test]
fn pulled_creeps_run_down_a_standing_hero_before_the_chase_expires() {
    let config = SimulationConfig {
        waves: WaveSchedule {
            interval: 400.0,
            breakpoints: vec![Breakpoint {
                time: 0.0,
                composition: Composition::new(3, 0, 0),
            }],
            ..WaveSchedule::default()
        },
        ..SimulationConfig::default()
    };
    let mut simulation = Simulation::new(
        &config,
        mid_lanes_world(),
        VisionTerrain::flat(VISION_GRID_DIMENSION, VISION_GRID_DIMENSION, 0),
    );
    let hero = simulation
        .create_hero(Team::Radiant, WorldPoint::new(37.0, 5_620.0), "bait")
        .expect("hero created");
    simulation.set_game_time(400.0);
    assert_eq!(simulation.draw_aggro(hero), simulation.stats().dire_creeps);

    let view = query::unit_view(simulation.world());
    let bait = view.get(hero).expect("hero in view");
    let closing: BTreeSet<UnitId> = view
        .alive()
        .filter(|unit| unit.creep().is_some_and(|state| state.behavior == CreepBehavior::Chase))
        .filter(|unit| unit.position.distance(bait.position) > effective_range(unit, bait))
        .map(|unit| unit.id)
        .collect();
    assert!(!closing.is_empty(), "some pulled creeps start out of reach");

    let mut strikers = BTreeSet::new();
    for _ in 0..23 {
        simulation.update(0.1);
        for event in simulation.last_events() {
            if let Event::UnitDamaged {
                source: Some(source),
                target,
                ..
            } = event
            {
                if *target == hero && closing.contains(source) {
                    let _ = strikers.insert(*source);
                }
            }
        }
    }
    assert!(!strikers.is_empty(), "no creep that had to close the distance struck the hero");
    assert_eq!(position_of(&simulation, hero), WorldPoint::new(37.0, 5_620.0));
}

#[test]
fn reset_rewinds_and_dirty_tracks_changes() {
    let mut simulation = simulation(mid_lanes_world());
    let hero = simulation
        .create_hero(Team::Dire, WorldPoint::ORIGIN, "keeper")
        .expect("hero created");
    assert!(simulation.take_dirty());
    assert!(!simulation.take_dirty());

    simulation.play();
    let start = Instant::now();
    assert_eq!(simulation.tick_at(start), 0.0);
    let simulated = simulation.tick_at(start + Duration::from_millis(50));
    assert!((simulated - 0.05).abs() < 1e-9);
    assert!(simulation.take_dirty());
    assert!(simulation.stats().radiant_creeps > 0);

    simulation.reset();
    let stats = simulation.stats();
    assert!(simulation.is_paused());
    assert_eq!(stats.game_time, 0.0);
    assert_eq!(stats.radiant_creeps + stats.dire_creeps, 0);
    assert_eq!(stats.heroes, 1);
    assert_eq!(simulation.hit_test(WorldPoint::new(10.0, 10.0)), Some(hero));
}
