use lanewatch_core::{
    Command, CreepBehavior, CreepKind, Lane, LanePath, LanePaths, NavCell, Team, UnitId, UnitView,
    WalkOptions, Walkability, WorldPoint,
};
use lanewatch_system_creep_ai::{effective_range, CreepAi, Frame};
use lanewatch_system_pathfinding::Pathfinder;
use lanewatch_world::{self as world, query, NavigationGrid, TreeTable, WalkabilityField, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const DT: f64 = 0.1;

fn lane(team: Team, from: WorldPoint, to: WorldPoint) -> LanePaths {
    let mut lanes = LanePaths::default();
    *lanes.get_mut(team, Lane::Mid) = LanePath::new(from, vec![from, to]);
    lanes
}

fn spawn(world: &mut World, team: Team, position: WorldPoint) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnCreep {
            team,
            lane: Lane::Mid,
            kind: CreepKind::Melee,
            wave: 0,
            spawn_time: 0.0,
            position,
        },
        &mut events,
    );
}

/// Runs one AI decision pass and applies the result, returning the snapshot
/// the decisions were based on together with the emitted commands.
fn step(
    world: &mut World,
    ai: &mut CreepAi,
    pathfinder: &Pathfinder,
    rng: &mut ChaCha8Rng,
) -> (UnitView, Vec<Command>) {
    let mut events = Vec::new();
    world::apply(world, Command::AdvanceClock { dt: DT }, &mut events);

    let view = query::unit_view(world);
    let mut commands = Vec::new();
    {
        let frame = Frame {
            view: &view,
            lanes: query::lanes(world),
            navigation: query::navigation(world),
            pathfinder,
            now: query::game_time(world),
            dt: DT,
        };
        ai.handle(&frame, rng, &mut commands);
    }
    for command in commands.clone() {
        world::apply(world, command, &mut events);
    }
    world::apply(world, Command::PurgeDead, &mut events);
    (view, commands)
}

#[test]
fn opposing_creeps_close_in_and_trade_hits_within_range() {
    let mut world = World::new();
    let radiant_lane = (WorldPoint::new(0.0, -1_000.0), WorldPoint::new(0.0, 5_000.0));
    let dire_lane = (WorldPoint::new(0.0, 1_000.0), WorldPoint::new(0.0, -5_000.0));
    let mut lanes = lane(Team::Radiant, radiant_lane.0, radiant_lane.1);
    lanes.dire = lane(Team::Dire, dire_lane.0, dire_lane.1).dire;
    let mut events = Vec::new();
    world::apply(&mut world, Command::ConfigureLanes { paths: lanes }, &mut events);
    spawn(&mut world, Team::Radiant, WorldPoint::new(0.0, -1_000.0));
    spawn(&mut world, Team::Dire, WorldPoint::new(0.0, 1_000.0));
    let (radiant, dire) = (UnitId::new(1), UnitId::new(2));

    let mut ai = CreepAi::default();
    let pathfinder = Pathfinder::default();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut hits = 0;

    for _ in 0..300 {
        let (view, commands) = step(&mut world, &mut ai, &pathfinder, &mut rng);
        let (Some(a), Some(b)) = (view.get(radiant), view.get(dire)) else {
            break;
        };
        let distance = a.position.distance(b.position);
        assert!(
            distance >= a.collision_radius + b.collision_radius,
            "creeps overlap at distance {distance}"
        );
        if distance < 300.0 {
            for unit in [a, b] {
                assert_eq!(
                    unit.creep().map(|state| state.behavior),
                    Some(CreepBehavior::Attack),
                    "unit {} still walking the lane at distance {distance}",
                    unit.id.get()
                );
            }
        }

        for command in &commands {
            if let Command::ApplyDamage {
                source: Some(source),
                target,
                amount,
            } = command
            {
                let attacker = view.get(*source).expect("attacker in view");
                let victim = view.get(*target).expect("victim in view");
                let gap = attacker.position.distance(victim.position);
                assert!(
                    gap <= effective_range(attacker, victim),
                    "hit landed from outside effective range"
                );
                assert!((16.0..=20.0).contains(amount), "armor-reduced melee hit, got {amount}");
                hits += 1;
            }
        }
    }

    assert!(hits >= 20, "expected a sustained trade, saw {hits} hits");
}

/// Spawns a Radiant melee creep at `creep` and a Dire hero at `hero`, then
/// returns the number of hits the creep lands within `ticks`.
fn hits_on_standing_hero(creep: WorldPoint, hero: WorldPoint, ticks: usize) -> usize {
    let mut world = World::new();
    let mut events = Vec::new();
    let lane_end = WorldPoint::new(creep.x(), creep.y() + 4_000.0);
    world::apply(
        &mut world,
        Command::ConfigureLanes {
            paths: lane(Team::Radiant, creep, lane_end),
        },
        &mut events,
    );
    spawn(&mut world, Team::Radiant, creep);
    world::apply(
        &mut world,
        Command::CreateHero {
            team: Team::Dire,
            position: hero,
            name: "statue".to_owned(),
        },
        &mut events,
    );
    let (creep_id, hero_id) = (UnitId::new(1), UnitId::new(2));

    let mut ai = CreepAi::default();
    let pathfinder = Pathfinder::default();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut hits = 0;
    for _ in 0..ticks {
        let (view, commands) = step(&mut world, &mut ai, &pathfinder, &mut rng);
        let target = view.get(hero_id).expect("hero stays on the map");
        assert_eq!(target.position, hero, "the hero never moves");
        for command in &commands {
            if let Command::ApplyDamage { source, target: victim, .. } = command {
                assert_eq!((*source, *victim), (Some(creep_id), hero_id));
                let attacker = view.get(creep_id).expect("attacker in view");
                assert!(
                    attacker.position.distance(hero) <= effective_range(attacker, target),
                    "hit landed from outside effective range"
                );
                hits += 1;
            }
        }
    }
    hits
}

#[test]
fn creeps_close_on_a_standing_hero_and_strike_it_from_any_angle() {
    let stalled_case = hits_on_standing_hero(
        WorldPoint::new(-3_004.04, 1_682.61),
        WorldPoint::new(-2_788.79, 1_330.63),
        60,
    );
    assert!(stalled_case >= 3, "off-axis approach landed {stalled_case} hits");

    for turn in 0..36 {
        let angle = (turn as f32 * 10.0 + 7.0).to_radians();
        for gap in [200.0, 275.0, 350.0, 450.0] {
            let creep = WorldPoint::new(-1_250.0 + turn as f32 * 71.3, 830.0 - gap);
            let (dx, dy) = (angle.cos() * gap, angle.sin() * gap);
            let hero = WorldPoint::new(creep.x() + dx, creep.y() + dy);
            let hits = hits_on_standing_hero(creep, hero, 60);
            assert!(hits >= 3, "creep at {creep:?} landed {hits} hits on the hero at {hero:?}");
        }
    }
}

#[test]
fn creeps_detour_around_terrain_blocking_the_lane() {
    let field = WalkabilityField::open(2401, 2401)
        .with_blocked_rect(NavCell::new(1180, 1197), NavCell::new(1220, 1203));
    let mut world = World::with_navigation(NavigationGrid::new(field, TreeTable::default()));
    let start = WorldPoint::new(0.0, -400.0);
    let goal = WorldPoint::new(0.0, 400.0);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureLanes {
            paths: lane(Team::Radiant, start, goal),
        },
        &mut events,
    );
    spawn(&mut world, Team::Radiant, start);
    let creep = UnitId::new(1);

    let mut ai = CreepAi::default();
    let pathfinder = Pathfinder::default();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let options = WalkOptions::ground(CreepKind::Melee.collision_radius());
    let mut planned = false;

    for _ in 0..200 {
        let (_, commands) = step(&mut world, &mut ai, &pathfinder, &mut rng);
        planned |= commands.iter().any(|command| match command {
            Command::ReplacePathPlan { plan, .. } => !plan.current_path.is_empty(),
            _ => false,
        });

        let unit = query::unit(&world, creep).expect("creep alive");
        let navigation = query::navigation(&world);
        assert!(
            navigation.is_walkable(navigation.transform().world_to_nav(unit.position), &options),
            "creep entered blocked terrain at {:?}",
            unit.position
        );
        if unit.creep().map(|state| state.behavior) == Some(CreepBehavior::Idle) {
            break;
        }
    }

    let unit = query::unit(&world, creep).expect("creep alive");
    assert!(planned, "a detour plan was stored on the creep");
    assert!(unit.position.distance(goal) < 60.0, "ended at {:?}", unit.position);
    assert_eq!(unit.creep().map(|state| state.behavior), Some(CreepBehavior::Idle));
}
