//! Geometry primitives - декларативные volume-дескрипторы
//!
//! Room Builder возвращает список `Primitive`, ECS spawn (level::spawn)
//! превращает их в rapier colliders, клиент - в меши.
//! Все объёмы axis-aligned: cuboid по size, cylinder вертикальный (ось Y).

use bevy::prelude::*;
use bevy_rapier3d::prelude::Collider;
use serde::{Deserialize, Serialize};

/// Роль поверхности (render/collision tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum SurfaceRole {
    Floor,
    Ceiling,
    Wall,
    Lintel,
    Cover,
    Target,
}

impl SurfaceRole {
    pub fn is_target(&self) -> bool {
        matches!(self, SurfaceRole::Target)
    }

    /// Статическая геометрия (всё кроме мишеней)
    pub fn is_static(&self) -> bool {
        !self.is_target()
    }
}

/// Форма объёма
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub enum PrimitiveShape {
    /// Box: полные размеры по X/Y/Z
    Cuboid { size: Vec3 },
    /// Вертикальный цилиндр
    Cylinder { radius: f32, height: f32 },
}

impl PrimitiveShape {
    /// Полуразмеры AABB
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            PrimitiveShape::Cuboid { size } => size / 2.0,
            PrimitiveShape::Cylinder { radius, height } => Vec3::new(radius, height / 2.0, radius),
        }
    }

    /// Вырожденный объём (нулевая/отрицательная протяжённость)
    pub fn is_degenerate(&self) -> bool {
        self.half_extents().min_element() <= 0.0
    }
}

/// Один объём уровня
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Уникальное имя в пределах уровня (`room/part`)
    pub label: String,
    pub shape: PrimitiveShape,
    /// Центр объёма (world space)
    pub position: Vec3,
    pub role: SurfaceRole,
    pub collidable: bool,
}

impl Primitive {
    pub fn cuboid(label: impl Into<String>, position: Vec3, size: Vec3, role: SurfaceRole) -> Self {
        Self {
            label: label.into(),
            shape: PrimitiveShape::Cuboid { size },
            position,
            role,
            collidable: true,
        }
    }

    pub fn cylinder(
        label: impl Into<String>,
        position: Vec3,
        radius: f32,
        height: f32,
        role: SurfaceRole,
    ) -> Self {
        Self {
            label: label.into(),
            shape: PrimitiveShape::Cylinder { radius, height },
            position,
            role,
            collidable: true,
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        self.shape.half_extents()
    }

    /// Полный размер AABB
    pub fn size(&self) -> Vec3 {
        self.half_extents() * 2.0
    }

    pub fn min(&self) -> Vec3 {
        self.position - self.half_extents()
    }

    pub fn max(&self) -> Vec3 {
        self.position + self.half_extents()
    }

    /// Rapier collider (local space, центр в origin entity)
    pub fn collider(&self) -> Collider {
        match self.shape {
            PrimitiveShape::Cuboid { size } => Collider::cuboid(size.x / 2.0, size.y / 2.0, size.z / 2.0),
            PrimitiveShape::Cylinder { radius, height } => Collider::cylinder(height / 2.0, radius),
        }
    }
}
