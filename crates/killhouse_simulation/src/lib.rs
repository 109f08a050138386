//! KILLHOUSE Simulation Core
//!
//! ECS-симуляция shooting range на Bevy 0.16:
//! - level: процедурная геометрия комнат (pure builder → rapier colliders)
//! - combat: hit-scan, GameState (ammo / targets)
//! - effects: muzzle flash + decal с гарантированным despawn
//! - player: first-person контроллер поверх rapier character controller
//!
//! Клиент (killhouse_client) = окно, рендер, mouse/keyboard, HUD.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt::Debug;

// Публичные модули
pub mod collision;
pub mod combat;
pub mod config;
pub mod effects;
pub mod geometry;
pub mod level;
pub mod logger;
pub mod player;

// Re-export базовых типов для удобства
pub use combat::{CombatPlugin, FireIntent, GameState, GameStateSnapshot, HitEvent, OutOfAmmo, RangeCleared, TargetDown, Weapon};
pub use config::RangeConfig;
pub use effects::{EffectKind, EffectScheduler, EffectsPlugin, Ephemeral};
pub use level::{LevelPlan, LevelPlugin, LevelSurface, RoomSpec, SceneTeardown, SurfaceShape, Target};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use player::{MovementInput, LookInput, Player, PlayerPlugin, PlayerView, PointerCapture, PointerInput};

/// Кто отвечает на raycast / collision sweep
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhysicsBackend {
    /// RapierPhysicsPlugin подключён снаружи (клиент)
    Rapier,
    /// Без physics step: raycast по collider'ам напрямую, движение без sweep
    #[default]
    Headless,
}

/// Порядок внутри Update
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Pointer / look / movement, выпуск FireIntent
    Input,
    /// FireIntent → GameState
    Combat,
    /// Истечение эффектов, teardown
    Effects,
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// `RangeConfig` / `LevelPlan` / `DeterministicRng`, вставленные до plugin'а,
/// не перезаписываются.
pub struct SimulationPlugin {
    pub backend: PhysicsBackend,
}

impl SimulationPlugin {
    pub fn headless() -> Self {
        Self {
            backend: PhysicsBackend::Headless,
        }
    }

    pub fn rapier() -> Self {
        Self {
            backend: PhysicsBackend::Rapier,
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.init_resource::<RangeConfig>()
            .insert_resource(self.backend)
            .configure_sets(
                Update,
                (SimulationSet::Input, SimulationSet::Combat, SimulationSet::Effects).chain(),
            )
            // Подсистемы
            .add_plugins((LevelPlugin, PlayerPlugin, CombatPlugin, EffectsPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции (без SimulationPlugin)
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins).insert_resource(DeterministicRng::new(seed));

    app
}

/// Snapshot компонентов `T` для сравнения детерминизма
///
/// Строки `index: {:?}`, отсортированные по Entity index.
pub fn world_snapshot<T: Component + Debug>(world: &mut World) -> Vec<String> {
    let mut query = world.query::<(Entity, &T)>();
    let mut entries: Vec<(u32, String)> = query
        .iter(world)
        .map(|(entity, component)| (entity.index(), format!("{:?}", component)))
        .collect();
    entries.sort();

    entries
        .into_iter()
        .map(|(index, component)| format!("{}: {}", index, component))
        .collect()
}
