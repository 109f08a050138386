//! Combat system module (hit-scan shooting range)
//!
//! ECS ответственность:
//! - GameState: ammo, totalTargets, targetsHit
//! - Hit resolution: FireIntent → raycast → HitEvent
//! - Events: HitEvent, OutOfAmmo, TargetDown, RangeCleared
//!
//! Визуальный feedback (muzzle flash, decal) - через effects scheduler.

use bevy::prelude::*;

pub mod hit_scan;
pub mod state;
pub mod tracker;


// Re-export основных типов
pub use hit_scan::{
    headless_cast, resolve_shot, FireIntent, HitEvent, HitSurface, Impact, RayHit, ShotCaster, ShotScene,
    SurfaceKind, SurfaceQuery, TargetRegistry,
};
pub use state::{GameState, GameStateSnapshot};
pub use tracker::{fire_shot, process_fire_intents, Eliminated, FireOutcome, OutOfAmmo, RangeCleared, TargetDown, Weapon};

use crate::SimulationSet;

/// Combat Plugin
///
/// Один fire action обрабатывается целиком (raycast → state → effects)
/// до следующего intent'а, всё в одной системе.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // GameState::from_world читает RangeConfig
        app.init_resource::<GameState>();

        // Регистрация событий
        app.add_event::<FireIntent>()
            .add_event::<HitEvent>()
            .add_event::<OutOfAmmo>()
            .add_event::<TargetDown>()
            .add_event::<RangeCleared>();

        app.add_systems(Update, process_fire_intents.in_set(SimulationSet::Combat));
    }
}
