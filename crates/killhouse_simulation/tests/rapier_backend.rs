//! Integration тесты: hit-scan через rapier query pipeline
//!
//! Тот же range, что и в shooting_range.rs, но `SimulationPlugin::rapier()`
//! + `RapierPhysicsPlugin` (как в клиенте). Стреляем изнутри капсулы игрока.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::*;
use killhouse_simulation::combat::HitSurface;
use killhouse_simulation::geometry::SurfaceRole;
use killhouse_simulation::level::TargetId;
use killhouse_simulation::{
    create_headless_app, FireIntent, GameState, HitEvent, LevelPlan, Player, PlayerView, RoomSpec, SimulationPlugin,
    Target,
};
use std::time::Duration;

const STEP: Duration = Duration::from_millis(20);

fn rapier_range_app() -> App {
    let room = RoomSpec::new("range", Vec3::new(0.0, 2.0, 0.0)).with_target(Vec3::new(0.0, -1.2, 3.0));

    let mut app = create_headless_app(5);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(STEP))
        .insert_resource(LevelPlan::new(vec![room]))
        .add_plugins((
            TransformPlugin,
            RapierPhysicsPlugin::<NoUserData>::default(),
            SimulationPlugin::rapier(),
        ));

    // Startup + пара шагов: collider'ы попадают в rapier, query pipeline обновлён
    for _ in 0..3 {
        app.update();
    }
    app
}

fn entity_with<C: Component>(app: &mut App) -> Entity {
    let world = app.world_mut();
    let mut query = world.query_filtered::<Entity, With<C>>();
    match query.iter(world).next() {
        Some(entity) => entity,
        None => panic!("entity not spawned"),
    }
}

/// Луч изнутри капсулы игрока вдоль +Z (через мишень в стену)
fn shoot_from_player(app: &mut App) -> HitEvent {
    let shooter = entity_with::<PlayerView>(app);
    let body = entity_with::<Player>(app);
    let Some(body_transform) = app.world().get::<Transform>(body).copied() else {
        panic!("player has no transform");
    };

    app.world_mut().send_event(FireIntent {
        shooter,
        // y = 1.0: ниже верха мишени (1.6), но внутри капсулы
        origin: Vec3::new(body_transform.translation.x, 1.0, body_transform.translation.z),
        direction: Vec3::Z,
    });
    app.update();

    let hits: Vec<HitEvent> = app.world_mut().resource_mut::<Events<HitEvent>>().drain().collect();
    assert_eq!(hits.len(), 1);
    hits[0]
}

#[test]
fn test_rapier_ray_ignores_player_capsule() {
    let mut app = rapier_range_app();
    let body = entity_with::<Player>(&mut app);
    assert!(app.world().get::<Collider>(body).is_some());

    let hit = shoot_from_player(&mut app);

    assert_eq!(hit.target(), Some(TargetId(0)));
    let Some(impact) = hit.impact else {
        panic!("target not hit");
    };
    assert!((impact.point.z - 2.7).abs() < 1e-2, "{:?}", impact.point);
    assert_eq!(app.world().resource::<GameState>().targets_hit(), 1);
}

#[test]
fn test_rapier_ray_skips_dead_target() {
    let mut app = rapier_range_app();

    // Мёртвая, но ещё не despawn'нутая мишень: collider на месте, луч обязан пройти
    let target = entity_with::<Target>(&mut app);
    if let Some(mut state) = app.world_mut().get_mut::<Target>(target) {
        state.alive = false;
    }

    let hit = shoot_from_player(&mut app);

    let Some(impact) = hit.impact else {
        panic!("shot hit nothing");
    };
    assert_eq!(impact.surface, HitSurface::Static(SurfaceRole::Wall));
    assert!((impact.point.z - 4.9).abs() < 1e-2, "{:?}", impact.point);
    assert_eq!(app.world().resource::<GameState>().targets_hit(), 0);
    assert!(app.world().get_entity(target).is_ok());
}
