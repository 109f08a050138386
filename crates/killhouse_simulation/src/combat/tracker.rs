//! Combat State Tracker - единственный мутатор GameState
//!
//! Переход на выстрел:
//! 1. ammo == 0 → Rejected (без raycast, без изменения state)
//! 2. resolve_shot
//! 3. живая мишень → dead, targets_hit += 1
//! 4. ammo -= 1 (после commit'а выстрела, попал или нет)
//! 5. (ECS) muzzle flash всегда, decal если попали в статику и есть точка + нормаль

use bevy::prelude::*;

use crate::combat::hit_scan::{
    resolve_shot, FireIntent, HitEvent, HitSurface, Impact, ShotCaster, ShotScene, SurfaceQuery, TargetRegistry,
};
use crate::combat::state::GameState;
use crate::config::{EffectConfig, RangeConfig};
use crate::effects::{spawn_effect, EffectKind, EffectPlacement, EffectScheduler};
use crate::level::TargetId;
use crate::logger;

/// Оружие на view entity (точка вылета muzzle flash)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Weapon {
    /// Offset muzzle point относительно view (local space)
    pub muzzle_offset: Vec3,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            muzzle_offset: EffectConfig::default().default_muzzle_offset,
        }
    }
}

/// Event: выстрел отклонён (магазин пуст)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfAmmo {
    pub shooter: Entity,
}

/// Event: мишень сбита
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDown {
    pub entity: Entity,
    pub id: TargetId,
    pub targets_hit: u32,
    pub total_targets: u32,
}

/// Event: последняя мишень сбита (один раз за сессию)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCleared {
    pub ammo_remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eliminated {
    pub entity: Entity,
    pub id: TargetId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireOutcome {
    /// Нет патронов: ни raycast'а, ни изменений
    Rejected,
    Fired {
        hit: HitEvent,
        eliminated: Option<Eliminated>,
    },
}

/// Шаги 1-4 (без ECS)
pub fn fire_shot(
    state: &mut GameState,
    caster: &impl ShotCaster,
    registry: &mut impl TargetRegistry,
    intent: &FireIntent,
    max_range: f32,
) -> FireOutcome {
    if !state.can_fire() {
        return FireOutcome::Rejected;
    }

    let hit = resolve_shot(caster, &*registry, intent, max_range);

    let eliminated = match hit.impact {
        Some(Impact {
            entity,
            surface: HitSurface::Target(id),
            ..
        }) if registry.mark_dead(entity) => {
            if !state.record_target_down() {
                logger::log_error(&format!(
                    "❌ Target {:?} died but targets_hit is already {}/{}",
                    id,
                    state.targets_hit(),
                    state.total_targets()
                ));
            }
            Some(Eliminated { entity, id })
        }
        _ => None,
    };

    state.spend_round();

    FireOutcome::Fired { hit, eliminated }
}

/// Update: FireIntent → GameState + events + effects
#[allow(clippy::too_many_arguments)]
pub fn process_fire_intents(
    mut intents: EventReader<FireIntent>,
    mut state: ResMut<GameState>,
    scene: ShotScene,
    mut surfaces: SurfaceQuery,
    weapons: Query<Option<&Weapon>>,
    mut scheduler: ResMut<EffectScheduler>,
    config: Res<RangeConfig>,
    time: Res<Time>,
    mut commands: Commands,
    mut hit_events: EventWriter<HitEvent>,
    mut out_of_ammo_events: EventWriter<OutOfAmmo>,
    mut target_down_events: EventWriter<TargetDown>,
    mut cleared_events: EventWriter<RangeCleared>,
) {
    let now = time.elapsed();

    for intent in intents.read() {
        let outcome = fire_shot(&mut state, &scene, &mut surfaces, intent, config.combat.max_shot_range);

        let FireOutcome::Fired { hit, eliminated } = outcome else {
            logger::log("🔇 Click: out of ammo");
            out_of_ammo_events.write(OutOfAmmo {
                shooter: intent.shooter,
            });
            continue;
        };

        match hit.impact {
            Some(impact) => logger::log(&format!(
                "💥 Shot hit {:?} at {:.2}m ({} rounds left)",
                impact.surface,
                impact.distance,
                state.ammo_remaining()
            )),
            None => logger::log(&format!("💨 Shot missed ({} rounds left)", state.ammo_remaining())),
        }

        if let Some(Eliminated { entity, id }) = eliminated {
            if let Ok(mut target) = commands.get_entity(entity) {
                target.try_despawn();
            }
            logger::log_info(&format!(
                "🎯 Target {:?} down ({}/{})",
                id,
                state.targets_hit(),
                state.total_targets()
            ));
            target_down_events.write(TargetDown {
                entity,
                id,
                targets_hit: state.targets_hit(),
                total_targets: state.total_targets(),
            });

            if state.is_cleared() {
                logger::log_info(&format!("🏁 Range cleared with {} rounds left", state.ammo_remaining()));
                cleared_events.write(RangeCleared {
                    ammo_remaining: state.ammo_remaining(),
                });
            }
        }

        // Muzzle flash: child of view, либо в мире если shooter уже нет
        let flash = match weapons.get(intent.shooter) {
            Ok(weapon) => EffectPlacement::Attached {
                parent: intent.shooter,
                offset: weapon.map_or(config.effects.default_muzzle_offset, |weapon| weapon.muzzle_offset),
            },
            Err(_) => EffectPlacement::World {
                position: intent.origin,
                facing: intent.direction,
            },
        };
        spawn_effect(
            &mut commands,
            &mut scheduler,
            now,
            EffectKind::MuzzleFlash,
            flash,
            config.effects.muzzle_flash_lifetime(),
        );

        // Decal только на статике: сбитая мишень despawn'ится в этом же кадре
        let on_static = matches!(hit.impact, Some(Impact { surface: HitSurface::Static(_), .. }));
        if let Some((point, normal)) = hit.decal_anchor().filter(|_| on_static) {
            spawn_effect(
                &mut commands,
                &mut scheduler,
                now,
                EffectKind::ImpactDecal,
                EffectPlacement::World {
                    position: point + normal * config.effects.decal_surface_offset,
                    facing: -normal,
                },
                config.effects.decal_lifetime(),
            );
        }

        hit_events.write(hit);
    }
}
