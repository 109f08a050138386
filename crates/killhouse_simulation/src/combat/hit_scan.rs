//! Hit Resolution Pipeline - hit-scan raycast
//!
//! Луч всегда из центра viewport вдоль forward камеры (crosshair aiming),
//! не из точки клика. Ближайшее пересечение классифицируется:
//! живая мишень / статическая поверхность / ничего.
//!
//! Backends (`PhysicsBackend`):
//! - Rapier: query pipeline через `ReadRapierContext`
//! - Headless: линейный проход по level colliders (`Collider::cast_ray_and_get_normal`)

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::collision::{shot_can_hit, shot_groups};
use crate::geometry::SurfaceRole;
use crate::level::{LevelSurface, Target, TargetId};
use crate::PhysicsBackend;

/// Нормаль короче этого считается отсутствующей (луч стартовал внутри collider'а)
const MIN_NORMAL_LENGTH: f32 = 1e-4;

/// Event: запрос на выстрел
///
/// `shooter` - entity view (камера + Weapon), к нему крепится muzzle flash.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FireIntent {
    pub shooter: Entity,
    pub origin: Vec3,
    pub direction: Vec3,
}

impl FireIntent {
    /// Выстрел из центра view: origin = позиция камеры, direction = forward
    pub fn from_view(shooter: Entity, view: &Transform) -> Self {
        Self {
            shooter,
            origin: view.translation,
            direction: *view.forward(),
        }
    }
}

/// Ближайшее пересечение луча (сырой результат caster'а)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Абстракция "ray vs scene nearest hit"
///
/// `skip(entity) == true` - collider прозрачен для луча (мёртвые мишени).
pub trait ShotCaster {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_range: f32, skip: &dyn Fn(Entity) -> bool) -> Option<RayHit>;
}

/// Во что попали
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSurface {
    Target(TargetId),
    Static(SurfaceRole),
}

/// Классификация entity для пайплайна
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    LiveTarget(TargetId),
    DeadTarget(TargetId),
    Static(SurfaceRole),
}

impl SurfaceKind {
    /// Может ли луч остановиться на этой поверхности
    pub fn blocks_shot(&self) -> bool {
        !matches!(self, SurfaceKind::DeadTarget(_))
    }
}

/// Реестр мишеней (alive/dead) для пайплайна и tracker'а
pub trait TargetRegistry {
    /// None - entity не поверхность уровня
    fn classify(&self, entity: Entity) -> Option<SurfaceKind>;

    /// alive → dead; false если мишень уже мертва или это не мишень
    fn mark_dead(&mut self, entity: Entity) -> bool;
}

/// Точка попадания
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub entity: Entity,
    pub surface: HitSurface,
    pub point: Vec3,
    /// None если caster не смог дать нормаль
    pub normal: Option<Vec3>,
    pub distance: f32,
}

/// Event: результат hit-scan (промах - `impact == None`)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct HitEvent {
    pub shooter: Entity,
    pub origin: Vec3,
    pub direction: Vec3,
    pub impact: Option<Impact>,
}

impl HitEvent {
    pub fn is_hit(&self) -> bool {
        self.impact.is_some()
    }

    pub fn target(&self) -> Option<TargetId> {
        match self.impact?.surface {
            HitSurface::Target(id) => Some(id),
            HitSurface::Static(_) => None,
        }
    }

    pub fn hit_entity(&self) -> Option<Entity> {
        self.impact.map(|impact| impact.entity)
    }

    /// Точка + нормаль (нужны для decal'а)
    pub fn decal_anchor(&self) -> Option<(Vec3, Vec3)> {
        let impact = self.impact?;
        Some((impact.point, impact.normal?))
    }
}

/// resolveShot: луч → HitEvent
///
/// Мёртвые мишени и не-level collider'ы пропускаются самим cast'ом.
pub fn resolve_shot(
    caster: &impl ShotCaster,
    registry: &impl TargetRegistry,
    intent: &FireIntent,
    max_range: f32,
) -> HitEvent {
    let miss = HitEvent {
        shooter: intent.shooter,
        origin: intent.origin,
        direction: intent.direction,
        impact: None,
    };

    let Ok(direction) = Dir3::new(intent.direction) else {
        return miss;
    };

    let skip = |entity: Entity| !registry.classify(entity).is_some_and(|kind| kind.blocks_shot());
    let Some(hit) = caster.cast_ray(intent.origin, *direction, max_range, &skip) else {
        return miss;
    };

    let surface = match registry.classify(hit.entity) {
        Some(SurfaceKind::LiveTarget(id)) => HitSurface::Target(id),
        Some(SurfaceKind::Static(role)) => HitSurface::Static(role),
        // caster проигнорировал skip - считаем промахом
        Some(SurfaceKind::DeadTarget(_)) | None => return miss,
    };

    let normal = (hit.normal.length() > MIN_NORMAL_LENGTH).then(|| hit.normal.normalize());

    HitEvent {
        direction: *direction,
        impact: Some(Impact {
            entity: hit.entity,
            surface,
            point: hit.point,
            normal,
            distance: hit.distance,
        }),
        ..miss
    }
}

/// ECS реестр: level surfaces + опциональный Target
pub type SurfaceQuery<'w, 's> = Query<'w, 's, (&'static LevelSurface, Option<&'static mut Target>)>;

impl TargetRegistry for SurfaceQuery<'_, '_> {
    fn classify(&self, entity: Entity) -> Option<SurfaceKind> {
        let (surface, target) = self.get(entity).ok()?;
        Some(match target {
            Some(target) if target.alive => SurfaceKind::LiveTarget(target.id),
            Some(target) => SurfaceKind::DeadTarget(target.id),
            None => SurfaceKind::Static(surface.role),
        })
    }

    fn mark_dead(&mut self, entity: Entity) -> bool {
        let Ok((_, Some(mut target))) = self.get_mut(entity) else {
            return false;
        };
        if !target.alive {
            return false;
        }
        target.alive = false;
        true
    }
}

/// SystemParam: сцена для hit-scan (выбор backend'а)
#[derive(SystemParam)]
pub struct ShotScene<'w, 's> {
    backend: Res<'w, PhysicsBackend>,
    rapier: ReadRapierContext<'w, 's>,
    colliders: Query<'w, 's, (Entity, &'static Collider, &'static Transform, &'static CollisionGroups), With<LevelSurface>>,
}

impl ShotCaster for ShotScene<'_, '_> {
    fn cast_ray(&self, origin: Vec3, direction: Vec3, max_range: f32, skip: &dyn Fn(Entity) -> bool) -> Option<RayHit> {
        match *self.backend {
            PhysicsBackend::Rapier => {
                let Ok(context) = self.rapier.single() else {
                    return None;
                };
                let predicate = |entity: Entity| !skip(entity);
                let filter = QueryFilter::default()
                    .exclude_sensors()
                    .groups(shot_groups())
                    .predicate(&predicate);

                let (entity, hit) = context.cast_ray_and_get_normal(origin, direction, max_range, true, filter)?;
                Some(RayHit {
                    entity,
                    distance: hit.time_of_impact,
                    point: hit.point,
                    normal: hit.normal,
                })
            }
            PhysicsBackend::Headless => headless_cast(self.colliders.iter(), origin, direction, max_range, skip),
        }
    }
}

/// Nearest hit без query pipeline: проверяем каждый collider
pub fn headless_cast<'a>(
    colliders: impl Iterator<Item = (Entity, &'a Collider, &'a Transform, &'a CollisionGroups)>,
    origin: Vec3,
    direction: Vec3,
    max_range: f32,
    skip: &dyn Fn(Entity) -> bool,
) -> Option<RayHit> {
    let mut nearest: Option<RayHit> = None;

    for (entity, collider, transform, groups) in colliders {
        if !shot_can_hit(groups) || skip(entity) {
            continue;
        }

        let range = nearest.map_or(max_range, |hit| hit.distance);
        let Some(hit) =
            collider.cast_ray_and_get_normal(transform.translation, transform.rotation, origin, direction, range, true)
        else {
            continue;
        };

        // Ничья по дистанции → меньший Entity (детерминизм между запусками)
        let closer = match nearest {
            None => true,
            Some(best) => {
                hit.time_of_impact < best.distance || (hit.time_of_impact == best.distance && entity < best.entity)
            }
        };
        if closer {
            nearest = Some(RayHit {
                entity,
                distance: hit.time_of_impact,
                point: hit.point,
                normal: hit.normal,
            });
        }
    }

    nearest
}
