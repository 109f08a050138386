//! Integration тесты: FireIntent → GameState → events → effects
//!
//! Одна комната 10×4×10 (пол на y=0), одна мишень на (0, 0.8, 3).
//! Время ручное: 20ms на update.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use killhouse_simulation::combat::{HitSurface, TargetDown};
use killhouse_simulation::config::{CombatConfig, EffectConfig};
use killhouse_simulation::geometry::SurfaceRole;
use killhouse_simulation::level::TargetId;
use killhouse_simulation::{
    create_headless_app, EffectKind, EffectScheduler, Ephemeral, FireIntent, GameState, HitEvent, LevelPlan,
    LevelSurface, OutOfAmmo, PlayerView, PointerCapture, PointerInput, RangeCleared, RangeConfig, RoomSpec,
    SceneTeardown, SimulationPlugin, Target,
};
use std::time::Duration;

const STEP: Duration = Duration::from_millis(20);
const TARGET_CENTER: Vec3 = Vec3::new(0.0, 0.8, 3.0);

fn range_app(ammo: u32) -> App {
    let config = RangeConfig {
        combat: CombatConfig {
            starting_ammo: ammo,
            ..default()
        },
        effects: EffectConfig {
            decal_ms: 200,
            ..default()
        },
        ..default()
    };
    let room = RoomSpec::new("range", Vec3::new(0.0, 2.0, 0.0)).with_target(Vec3::new(0.0, -1.2, 3.0));

    let mut app = create_headless_app(3);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(STEP))
        .insert_resource(config)
        .insert_resource(LevelPlan::new(vec![room]))
        .add_plugins(SimulationPlugin::headless());

    // Startup
    app.update();
    app
}

fn view_entity(app: &mut App) -> Entity {
    let world = app.world_mut();
    let mut views = world.query_filtered::<Entity, With<PlayerView>>();
    match views.iter(world).next() {
        Some(entity) => entity,
        None => panic!("player view not spawned"),
    }
}

/// Выстрел из точки перед мишенью
fn shoot(app: &mut App, origin: Vec3, direction: Vec3) {
    let shooter = view_entity(app);
    app.world_mut().send_event(FireIntent {
        shooter,
        origin,
        direction,
    });
    app.update();
}

fn shoot_at_target(app: &mut App) {
    shoot(app, Vec3::new(0.0, 0.8, 0.0), Vec3::Z);
}

fn drain<E: Event>(app: &mut App) -> Vec<E> {
    app.world_mut().resource_mut::<Events<E>>().drain().collect()
}

fn ephemeral(app: &mut App, kind: EffectKind) -> Vec<(Entity, Transform)> {
    let world = app.world_mut();
    let mut query = world.query::<(Entity, &Ephemeral, &Transform)>();
    query
        .iter(world)
        .filter(|(_, effect, _)| effect.kind == kind)
        .map(|(entity, _, transform)| (entity, *transform))
        .collect()
}

fn live_targets(app: &mut App) -> usize {
    let world = app.world_mut();
    let mut query = world.query::<&Target>();
    query.iter(world).count()
}

#[test]
fn test_last_round_kills_target() {
    let mut app = range_app(1);
    assert_eq!(app.world().resource::<GameState>().total_targets(), 1);

    shoot_at_target(&mut app);

    let state = app.world().resource::<GameState>();
    assert_eq!(state.ammo_remaining(), 0);
    assert_eq!(state.targets_hit(), 1);
    assert_eq!(state.targets_remaining(), 0);

    let hits = drain::<HitEvent>(&mut app);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].target(), Some(TargetId(0)));
    let Some(impact) = hits[0].impact else {
        panic!("target not hit");
    };
    assert!((impact.distance - 2.7).abs() < 1e-3, "distance = {}", impact.distance);

    assert_eq!(drain::<TargetDown>(&mut app).len(), 1);
    assert_eq!(drain::<RangeCleared>(&mut app), vec![RangeCleared { ammo_remaining: 0 }]);
    assert_eq!(live_targets(&mut app), 0);
}

#[test]
fn test_killed_target_leaves_no_floating_decal() {
    let mut app = range_app(5);

    shoot_at_target(&mut app);

    assert_eq!(live_targets(&mut app), 0);
    assert_eq!(ephemeral(&mut app, EffectKind::MuzzleFlash).len(), 1);
    assert!(ephemeral(&mut app, EffectKind::ImpactDecal).is_empty());
    let scheduler = app.world().resource::<EffectScheduler>();
    assert_eq!(scheduler.count(EffectKind::ImpactDecal), 0);

    // Следующий выстрел проходит в стену за мишенью: decal там есть
    shoot_at_target(&mut app);
    let decals = ephemeral(&mut app, EffectKind::ImpactDecal);
    assert_eq!(decals.len(), 1);
    assert!((decals[0].1.translation.z - 4.89).abs() < 1e-3, "{:?}", decals[0].1.translation);
}

#[test]
fn test_empty_magazine_produces_nothing() {
    let mut app = range_app(0);
    let before = app.world().resource::<GameState>().clone();

    shoot_at_target(&mut app);

    assert_eq!(*app.world().resource::<GameState>(), before);
    assert!(drain::<HitEvent>(&mut app).is_empty());
    assert_eq!(drain::<OutOfAmmo>(&mut app).len(), 1);
    assert!(app.world().resource::<EffectScheduler>().is_empty());
    assert!(ephemeral(&mut app, EffectKind::MuzzleFlash).is_empty());
    assert_eq!(live_targets(&mut app), 1);
}

#[test]
fn test_miss_spends_round_and_only_flashes() {
    let mut app = range_app(5);

    // Снаружи уровня, вверх - ничего на пути
    shoot(&mut app, Vec3::new(0.0, 50.0, 0.0), Vec3::Y);

    let state = app.world().resource::<GameState>();
    assert_eq!(state.ammo_remaining(), 4);
    assert_eq!(state.targets_hit(), 0);

    let hits = drain::<HitEvent>(&mut app);
    assert_eq!(hits.len(), 1);
    assert!(!hits[0].is_hit());

    let scheduler = app.world().resource::<EffectScheduler>();
    assert_eq!(scheduler.count(EffectKind::MuzzleFlash), 1);
    assert_eq!(scheduler.count(EffectKind::ImpactDecal), 0);
    assert!(ephemeral(&mut app, EffectKind::ImpactDecal).is_empty());
}

#[test]
fn test_dead_target_hit_only_once() {
    let mut app = range_app(5);

    shoot_at_target(&mut app);
    drain::<HitEvent>(&mut app);
    shoot_at_target(&mut app);

    let state = app.world().resource::<GameState>();
    assert_eq!(state.targets_hit(), 1);
    assert_eq!(state.ammo_remaining(), 3);

    // Второй луч уходит в северную стену
    let hits = drain::<HitEvent>(&mut app);
    let Some(impact) = hits.first().and_then(|hit| hit.impact) else {
        panic!("second shot hit nothing");
    };
    assert_eq!(impact.surface, HitSurface::Static(SurfaceRole::Wall));
    assert!((impact.point.z - 4.9).abs() < 1e-3);
    assert_eq!(drain::<TargetDown>(&mut app).len(), 1);
}

#[test]
fn test_ammo_never_negative() {
    let mut app = range_app(3);
    let mut previous = app.world().resource::<GameState>().ammo_remaining();
    let mut rejected = 0;

    for _ in 0..6 {
        shoot(&mut app, Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_X);
        let ammo = app.world().resource::<GameState>().ammo_remaining();
        assert!(ammo <= previous);
        previous = ammo;
        rejected += drain::<OutOfAmmo>(&mut app).len();
    }

    assert_eq!(previous, 0);
    assert_eq!(rejected, 3);
}

#[test]
fn test_muzzle_flash_attached_to_view() {
    let mut app = range_app(5);
    let view = view_entity(&mut app);

    shoot_at_target(&mut app);

    let flashes = ephemeral(&mut app, EffectKind::MuzzleFlash);
    assert_eq!(flashes.len(), 1);
    let parent = app.world().get::<ChildOf>(flashes[0].0).map(|child_of| child_of.parent());
    assert_eq!(parent, Some(view));
    assert_eq!(flashes[0].1.translation, EffectConfig::default().default_muzzle_offset);
}

#[test]
fn test_decal_sits_on_wall_facing_out() {
    let mut app = range_app(5);

    // В северную стену мимо мишени
    shoot(&mut app, Vec3::new(2.0, 1.0, 0.0), Vec3::Z);

    let decals = ephemeral(&mut app, EffectKind::ImpactDecal);
    assert_eq!(decals.len(), 1);
    let decal = decals[0].1;
    // Поверхность z = 4.9, нормаль -Z, отступ 0.01
    assert!(decal.translation.abs_diff_eq(Vec3::new(2.0, 1.0, 4.89), 1e-3), "{:?}", decal.translation);
    assert!(decal.forward().abs_diff_eq(Vec3::Z, 1e-4));
}

#[test]
fn test_effects_expire_on_schedule() {
    let mut app = range_app(5);

    shoot(&mut app, Vec3::new(2.0, 1.0, 0.0), Vec3::Z);
    assert_eq!(ephemeral(&mut app, EffectKind::MuzzleFlash).len(), 1);
    assert_eq!(ephemeral(&mut app, EffectKind::ImpactDecal).len(), 1);

    // 60ms flash: через 5 шагов по 20ms уже нет, decal (200ms) ещё висит
    for _ in 0..5 {
        app.update();
    }
    assert!(ephemeral(&mut app, EffectKind::MuzzleFlash).is_empty());
    assert_eq!(ephemeral(&mut app, EffectKind::ImpactDecal).len(), 1);

    for _ in 0..10 {
        app.update();
    }
    assert!(ephemeral(&mut app, EffectKind::ImpactDecal).is_empty());
    assert!(app.world().resource::<EffectScheduler>().is_empty());
}

#[test]
fn test_teardown_cancels_pending_effects() {
    let mut app = range_app(5);
    shoot(&mut app, Vec3::new(2.0, 1.0, 0.0), Vec3::Z);
    assert_eq!(app.world().resource::<EffectScheduler>().len(), 2);

    app.world_mut().send_event(SceneTeardown);
    app.update();

    assert!(app.world().resource::<EffectScheduler>().is_empty());
    assert!(ephemeral(&mut app, EffectKind::MuzzleFlash).is_empty());
    assert!(ephemeral(&mut app, EffectKind::ImpactDecal).is_empty());

    let world = app.world_mut();
    let mut surfaces = world.query::<&LevelSurface>();
    assert_eq!(surfaces.iter(world).count(), 0);

    // Таймеры после teardown ничего не трогают
    for _ in 0..20 {
        app.update();
    }
}

#[test]
fn test_pointer_press_fires_from_view() {
    let mut app = range_app(5);
    let view = view_entity(&mut app);

    app.world_mut().send_event(PointerInput::PrimaryPressed);
    app.update();

    assert_eq!(*app.world().resource::<PointerCapture>(), PointerCapture::Captured);
    assert_eq!(app.world().resource::<GameState>().ammo_remaining(), 4);
    let hits = drain::<HitEvent>(&mut app);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].shooter, view);
    // Игрок смотрит в +Z
    assert!(hits[0].direction.abs_diff_eq(Vec3::Z, 1e-4), "{:?}", hits[0].direction);

    app.world_mut().send_event(PointerInput::PrimaryReleased);
    app.update();
    assert_eq!(*app.world().resource::<PointerCapture>(), PointerCapture::Released);
    assert_eq!(app.world().resource::<GameState>().ammo_remaining(), 4);
}
