//! Level spawning - LevelGeometry → ECS entities
//!
//! Pure builder (room/layout) отдаёт Primitive'ы, здесь каждый становится
//! fixed rapier body. Клиент вешает меши по `SurfaceShape` (Added<…>).

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::collision::surface_groups;
use crate::combat::GameState;
use crate::config::RangeConfig;
use crate::geometry::{Primitive, PrimitiveShape, SurfaceRole};
use crate::level::layout::{build_level, standard_range};
use crate::level::room::{RoomSpec, TargetId};
use crate::logger;

/// Resource: какие комнаты строить на Startup (порядок = порядок build)
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LevelPlan {
    pub rooms: Vec<RoomSpec>,
}

impl LevelPlan {
    pub fn new(rooms: Vec<RoomSpec>) -> Self {
        Self { rooms }
    }

    pub fn standard(config: &RangeConfig) -> Self {
        Self::new(standard_range(&config.room, &config.target))
    }
}

impl FromWorld for LevelPlan {
    fn from_world(world: &mut World) -> Self {
        let config = world.get_resource::<RangeConfig>().cloned().unwrap_or_default();
        Self::standard(&config)
    }
}

/// Поверхность уровня (всё, что заспавнил build)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct LevelSurface {
    pub role: SurfaceRole,
}

/// Форма для визуализации (клиент строит меш по ней)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SurfaceShape(pub PrimitiveShape);

/// TargetInstance
///
/// `alive` переключается true → false ровно один раз (combat tracker),
/// после чего entity despawn'ится.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Target {
    pub id: TargetId,
    pub alive: bool,
}

impl Target {
    pub fn new(id: TargetId) -> Self {
        Self { id, alive: true }
    }
}

/// Event: снести сцену (level + pending effects)
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SceneTeardown;

fn spawn_primitive(commands: &mut Commands, primitive: &Primitive) -> Entity {
    commands
        .spawn((
            Name::new(primitive.label.clone()),
            LevelSurface { role: primitive.role },
            SurfaceShape(primitive.shape),
            Transform::from_translation(primitive.position),
            RigidBody::Fixed,
            primitive.collider(),
            surface_groups(primitive.role),
        ))
        .id()
}

/// Startup: LevelPlan → entities
pub fn spawn_level_geometry(mut commands: Commands, plan: Res<LevelPlan>, config: Res<RangeConfig>) {
    let level = build_level(&plan.rooms, &config.room, &config.target);

    for room in &level.rooms {
        for primitive in room.primitives().filter(|p| !p.role.is_target()) {
            if primitive.shape.is_degenerate() {
                logger::log_warning(&format!("⚠️ Degenerate primitive '{}' ({:?})", primitive.label, primitive.shape));
            }
            spawn_primitive(&mut commands, primitive);
        }

        for target in &room.targets {
            let entity = spawn_primitive(&mut commands, &target.primitive);
            commands.entity(entity).insert(Target::new(target.id));
        }
    }
}

/// Startup (после spawn): фиксирует totalTargets
///
/// Считает заспавненные Target entities, а не LevelPlan.
pub fn count_targets(targets: Query<&Target>, mut state: ResMut<GameState>) {
    let total = targets.iter().filter(|target| target.alive).count() as u32;

    if state.set_total_targets(total) {
        logger::log_info(&format!("🎯 Targets registered: {}", total));
    } else {
        logger::log_warning(&format!(
            "⚠️ Target count already locked at {}, ignoring recount ({})",
            state.total_targets(),
            total
        ));
    }
}

/// Despawn всех поверхностей уровня по SceneTeardown / AppExit
pub fn teardown_level(
    mut teardown_events: EventReader<SceneTeardown>,
    mut exit_events: EventReader<AppExit>,
    surfaces: Query<Entity, With<LevelSurface>>,
    mut commands: Commands,
) {
    let teardown = teardown_events.read().count() > 0;
    let exiting = exit_events.read().count() > 0;
    if !teardown && !exiting {
        return;
    }

    let mut removed = 0;
    for entity in surfaces.iter() {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.try_despawn();
            removed += 1;
        }
    }

    logger::log_info(&format!("🧹 Level teardown: {} surfaces despawned", removed));
}
