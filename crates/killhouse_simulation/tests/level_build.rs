//! Integration тесты: LevelPlan → ECS entities
//!
//! Headless App + SimulationPlugin::headless(), Startup = первый update.

use bevy::prelude::*;
use killhouse_simulation::geometry::SurfaceRole;
use killhouse_simulation::level::{build_level, standard_range, DoorFlags, Face};
use killhouse_simulation::{
    create_headless_app, GameState, LevelPlan, LevelSurface, RangeConfig, RoomSpec, SceneTeardown, SimulationPlugin,
    Target,
};

fn two_target_room(id: &str, x: f32) -> RoomSpec {
    RoomSpec::new(id, Vec3::new(x, 2.0, 0.0))
        .with_target(Vec3::new(2.0, -1.2, 2.0))
        .with_target(Vec3::new(-2.0, -1.2, 2.0))
}

fn app_with_rooms(rooms: Vec<RoomSpec>) -> App {
    let mut app = create_headless_app(7);
    app.insert_resource(LevelPlan::new(rooms))
        .add_plugins(SimulationPlugin::headless());
    app
}

fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
    let world = app.world_mut();
    let mut query = world.query_filtered::<Entity, F>();
    query.iter(world).count()
}

#[test]
fn test_total_targets_fixed_before_first_input() {
    let rooms: Vec<RoomSpec> = (0..4)
        .map(|i| two_target_room(&format!("room{}", i), i as f32 * 10.0))
        .collect();
    let mut app = app_with_rooms(rooms);

    // Первый update: Startup (spawn → count) + пустой Update
    app.update();

    let state = app.world().resource::<GameState>();
    assert!(state.targets_counted());
    assert_eq!(state.total_targets(), 8);
    assert_eq!(state.targets_hit(), 0);
    assert_eq!(count::<With<Target>>(&mut app), 8);
}

#[test]
fn test_every_primitive_becomes_surface() {
    let config = RangeConfig::default();
    let rooms = standard_range(&config.room, &config.target);
    let expected = build_level(&rooms, &config.room, &config.target).primitives().count();

    let mut app = app_with_rooms(rooms);
    app.update();

    assert_eq!(count::<With<LevelSurface>>(&mut app), expected);

    // У каждой мишени роль Target
    let world = app.world_mut();
    let mut targets = world.query::<(&Target, &LevelSurface)>();
    for (target, surface) in targets.iter(world) {
        assert!(target.alive);
        assert_eq!(surface.role, SurfaceRole::Target);
    }
}

#[test]
fn test_total_targets_not_recounted() {
    let mut app = app_with_rooms(vec![two_target_room("a", 0.0)]);
    app.update();

    // Лишняя мишень после build не меняет total
    app.world_mut().spawn((
        Target::new(killhouse_simulation::level::TargetId(99)),
        Transform::default(),
    ));
    for _ in 0..3 {
        app.update();
    }

    assert_eq!(app.world().resource::<GameState>().total_targets(), 2);
}

#[test]
fn test_misaligned_layout_still_builds() {
    let rooms = vec![
        RoomSpec::new("a", Vec3::ZERO).with_doors(DoorFlags::open(&[Face::North])),
        two_target_room("b", 10.0),
    ];
    let mut app = app_with_rooms(rooms);
    app.update();

    assert_eq!(app.world().resource::<GameState>().total_targets(), 2);
    // a: floor + ceiling + 3 solid + jamb×2 + lintel = 8
    // b: floor + ceiling + 4 solid + 2 targets = 8
    assert_eq!(count::<With<LevelSurface>>(&mut app), 16);
}

#[test]
fn test_teardown_removes_level() {
    let mut app = app_with_rooms(vec![two_target_room("a", 0.0)]);
    app.update();
    assert!(count::<With<LevelSurface>>(&mut app) > 0);

    app.world_mut().send_event(SceneTeardown);
    app.update();

    assert_eq!(count::<With<LevelSurface>>(&mut app), 0);
    assert_eq!(count::<With<Target>>(&mut app), 0);
}

#[test]
fn test_default_plan_is_standard_range() {
    let mut app = create_headless_app(1);
    app.add_plugins(SimulationPlugin::headless());
    app.update();

    let config = RangeConfig::default();
    let plan = app.world().resource::<LevelPlan>();
    assert_eq!(plan.rooms, standard_range(&config.room, &config.target));
    assert_eq!(app.world().resource::<GameState>().total_targets(), 5);
}
