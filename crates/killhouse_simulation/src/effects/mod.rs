//! Ephemeral Effects Scheduler
//!
//! Muzzle flash (~60ms, child of view) и impact decal (~5s, world space).
//! Scheduler владеет handle → entity + время истечения:
//! - `expire_effects` despawn'ит истёкшие ровно один раз
//! - teardown (SceneTeardown / AppExit) отменяет все pending и despawn'ит их
//!
//! Despawn уже несуществующей entity (parent снесли раньше) - no-op.

use bevy::prelude::*;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::level::SceneTeardown;
use crate::logger;
use crate::SimulationSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum EffectKind {
    MuzzleFlash,
    ImpactDecal,
}

/// Стабильный handle эффекта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct EffectHandle(pub u64);

/// Где появляется эффект
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectPlacement {
    /// Child entity с local offset (двигается вместе с parent)
    Attached { parent: Entity, offset: Vec3 },
    /// World space, forward (-Z) смотрит вдоль `facing`
    World { position: Vec3, facing: Vec3 },
}

/// Компонент на визуальной entity эффекта (клиент вешает меш)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Ephemeral {
    pub kind: EffectKind,
    pub handle: EffectHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEffect {
    pub entity: Entity,
    pub kind: EffectKind,
    pub expires_at: Duration,
}

/// Resource: pending эффекты
#[derive(Resource, Debug, Default)]
pub struct EffectScheduler {
    next_handle: u64,
    pending: BTreeMap<EffectHandle, PendingEffect>,
}

impl EffectScheduler {
    /// Резервирует handle (entity привязывается в `schedule`)
    pub fn allocate(&mut self) -> EffectHandle {
        let handle = EffectHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    pub fn schedule(&mut self, handle: EffectHandle, entity: Entity, kind: EffectKind, now: Duration, lifetime: Duration) {
        self.pending.insert(
            handle,
            PendingEffect {
                entity,
                kind,
                expires_at: now + lifetime,
            },
        );
    }

    /// Забирает все эффекты с `expires_at <= now` (в порядке handle)
    pub fn drain_expired(&mut self, now: Duration) -> Vec<(EffectHandle, PendingEffect)> {
        let expired: Vec<EffectHandle> = self
            .pending
            .iter()
            .filter(|(_, effect)| effect.expires_at <= now)
            .map(|(handle, _)| *handle)
            .collect();

        expired
            .into_iter()
            .filter_map(|handle| self.pending.remove(&handle).map(|effect| (handle, effect)))
            .collect()
    }

    /// Отмена одного эффекта; None если уже истёк/отменён
    pub fn cancel(&mut self, handle: EffectHandle) -> Option<PendingEffect> {
        self.pending.remove(&handle)
    }

    /// Отмена всех pending (teardown)
    pub fn cancel_all(&mut self) -> Vec<PendingEffect> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub fn is_pending(&self, handle: EffectHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    pub fn get(&self, handle: EffectHandle) -> Option<&PendingEffect> {
        self.pending.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn count(&self, kind: EffectKind) -> usize {
        self.pending.values().filter(|effect| effect.kind == kind).count()
    }
}

/// spawn(kind, placement, lifetime) → handle
///
/// Вызывающий гарантирует, что `Attached::parent` существует.
pub fn spawn_effect(
    commands: &mut Commands,
    scheduler: &mut EffectScheduler,
    now: Duration,
    kind: EffectKind,
    placement: EffectPlacement,
    lifetime: Duration,
) -> EffectHandle {
    let handle = scheduler.allocate();
    let marker = Ephemeral { kind, handle };
    let name = match kind {
        EffectKind::MuzzleFlash => "MuzzleFlash",
        EffectKind::ImpactDecal => "ImpactDecal",
    };

    let entity = match placement {
        EffectPlacement::Attached { parent, offset } => commands
            .spawn((Name::new(name), marker, Transform::from_translation(offset), ChildOf(parent)))
            .id(),
        EffectPlacement::World { position, facing } => commands
            .spawn((
                Name::new(name),
                marker,
                Transform::from_translation(position).looking_to(facing, Vec3::Y),
            ))
            .id(),
    };

    scheduler.schedule(handle, entity, kind, now, lifetime);
    handle
}

fn despawn_if_alive(commands: &mut Commands, entity: Entity) -> bool {
    match commands.get_entity(entity) {
        Ok(mut entity_commands) => {
            entity_commands.try_despawn();
            true
        }
        Err(_) => false,
    }
}

/// Update: despawn истёкших эффектов
pub fn expire_effects(mut scheduler: ResMut<EffectScheduler>, time: Res<Time>, mut commands: Commands) {
    let now = time.elapsed();

    for (handle, effect) in scheduler.drain_expired(now) {
        if !despawn_if_alive(&mut commands, effect.entity) {
            logger::log(&format!("⏱️ Effect {:?} ({:?}) already gone", handle, effect.kind));
        }
    }
}

/// Teardown: отменяем все таймеры и сносим entities
pub fn cancel_effects_on_teardown(
    mut teardown_events: EventReader<SceneTeardown>,
    mut exit_events: EventReader<AppExit>,
    mut scheduler: ResMut<EffectScheduler>,
    mut commands: Commands,
) {
    let teardown = teardown_events.read().count() > 0;
    let exiting = exit_events.read().count() > 0;
    if !teardown && !exiting {
        return;
    }

    let cancelled = scheduler.cancel_all();
    for effect in &cancelled {
        despawn_if_alive(&mut commands, effect.entity);
    }

    if !cancelled.is_empty() {
        logger::log_info(&format!("🧹 Effects teardown: {} pending cancelled", cancelled.len()));
    }
}

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EffectScheduler>().add_systems(
            Update,
            (expire_effects, cancel_effects_on_teardown)
                .chain()
                .in_set(SimulationSet::Effects),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_drain_only_expired() {
        let mut scheduler = EffectScheduler::default();
        let flash = scheduler.allocate();
        let decal = scheduler.allocate();
        scheduler.schedule(flash, Entity::from_raw(1), EffectKind::MuzzleFlash, ms(0), ms(60));
        scheduler.schedule(decal, Entity::from_raw(2), EffectKind::ImpactDecal, ms(0), ms(5000));

        assert!(scheduler.drain_expired(ms(59)).is_empty());

        let expired = scheduler.drain_expired(ms(60));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, flash);
        assert!(!scheduler.is_pending(flash));
        assert!(scheduler.is_pending(decal));

        // Повторно не отдаётся
        assert!(scheduler.drain_expired(ms(100)).is_empty());
    }

    #[test]
    fn test_cancel_all_empties_scheduler() {
        let mut scheduler = EffectScheduler::default();
        for index in 0..3 {
            let handle = scheduler.allocate();
            scheduler.schedule(handle, Entity::from_raw(index), EffectKind::ImpactDecal, ms(0), ms(5000));
        }

        assert_eq!(scheduler.cancel_all().len(), 3);
        assert!(scheduler.is_empty());
        assert!(scheduler.drain_expired(ms(10_000)).is_empty());
    }

    #[test]
    fn test_cancel_single_is_idempotent() {
        let mut scheduler = EffectScheduler::default();
        let handle = scheduler.allocate();
        scheduler.schedule(handle, Entity::from_raw(7), EffectKind::MuzzleFlash, ms(0), ms(60));

        assert!(scheduler.cancel(handle).is_some());
        assert!(scheduler.cancel(handle).is_none());
    }

    #[test]
    fn test_handles_unique() {
        let mut scheduler = EffectScheduler::default();
        let a = scheduler.allocate();
        let b = scheduler.allocate();
        assert_ne!(a, b);
    }
}
