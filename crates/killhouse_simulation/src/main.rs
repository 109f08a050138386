//! Headless симуляция KILLHOUSE
//!
//! Строит коридор из трёх комнат со случайными мишенями (seeded),
//! стреляет по каждой мишени из стартовой позиции и печатает итоговый
//! GameStateSnapshot как JSON.
//!
//! Usage: killhouse_simulation [seed] [targets_per_room]

use bevy::prelude::*;
use killhouse_simulation::level::FloorPlan;
use killhouse_simulation::{
    create_headless_app, log_error, log_info, DeterministicRng, FireIntent, GameState, LevelPlan, Player, PlayerView,
    RangeConfig, SimulationPlugin, Target,
};

/// Тиков между выстрелами
const TICKS_PER_SHOT: u32 = 10;
const TICK: std::time::Duration = std::time::Duration::from_millis(16);

fn main() {
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(42);
    let per_room = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(2);
    println!("Starting KILLHOUSE headless simulation (seed: {}, targets/room: {})", seed, per_room);

    let config = RangeConfig::default();
    let mut rng = DeterministicRng::new(seed);

    let origin = Vec3::new(0.0, config.room.height / 2.0, 0.0);
    let mut plan = match FloorPlan::corridor(config.room, origin, &["entry", "hall", "range"]) {
        Ok(plan) => plan,
        Err(err) => {
            log_error(&format!("❌ Layout failed: {}", err));
            return;
        }
    };
    plan.scatter_targets(&mut rng.rng, per_room, &config.target);

    let mut app = create_headless_app(seed);
    app.insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(TICK))
        .insert_resource(config)
        .insert_resource(LevelPlan::new(plan.into_specs()))
        .insert_resource(rng)
        .add_plugins(SimulationPlugin::headless());

    // Startup: level + player + target count
    app.update();

    let mut shots = 0;
    for tick in 0..u32::MAX {
        app.update();

        if tick % TICKS_PER_SHOT != 0 {
            continue;
        }
        let Some(intent) = aim_at_next_target(app.world_mut()) else {
            break;
        };
        if !app.world().resource::<GameState>().can_fire() {
            break;
        }
        app.world_mut().send_event(intent);
        shots += 1;
    }

    // Добиваем эффекты
    app.update();

    let snapshot = app.world().resource::<GameState>().snapshot();
    log_info(&format!("🏁 {} shots fired", shots));
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(err) => log_error(&format!("❌ Snapshot serialization failed: {}", err)),
    }
}

/// Луч из view игрока в центр живой мишени с наименьшим ID
fn aim_at_next_target(world: &mut World) -> Option<FireIntent> {
    let mut targets = world.query::<(&Target, &Transform)>();
    let target = targets
        .iter(world)
        .filter(|(target, _)| target.alive)
        .min_by_key(|(target, _)| target.id)
        .map(|(_, transform)| transform.translation)?;

    let mut bodies = world.query_filtered::<&Transform, With<Player>>();
    let body = *bodies.iter(world).next()?;

    let mut views = world.query_filtered::<(Entity, &Transform), With<PlayerView>>();
    let (view_entity, view) = views.iter(world).next()?;

    let origin = body.mul_transform(*view).translation;
    Some(FireIntent {
        shooter: view_entity,
        origin,
        direction: (target - origin).normalize_or_zero(),
    })
}
