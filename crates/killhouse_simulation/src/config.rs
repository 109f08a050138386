//! Range configuration
//!
//! Единая точка для всех констант уровня и геймплея.
//! `Default` = значения исходного прототипа (комнаты 10×4×10, дверь 2×2.5).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::player::CaptureMode;

/// Размеры комнаты (общие для всего уровня)
///
/// Предусловие (не проверяется в runtime):
/// `door_width < width`, `door_width < depth`, `door_height < height`.
/// Нарушение даёт вырожденные (нулевые/отрицательные) slab'ы, а не ошибку.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct RoomDimensions {
    /// Размер по X (метры)
    pub width: f32,
    /// Размер по Y (пол → потолок)
    pub height: f32,
    /// Размер по Z
    pub depth: f32,
    /// Толщина пола, потолка и стен (одинаковая для всего уровня)
    pub wall_thickness: f32,
    pub door_width: f32,
    pub door_height: f32,
}

impl Default for RoomDimensions {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 4.0,
            depth: 10.0,
            wall_thickness: 0.2,
            door_width: 2.0,
            door_height: 2.5,
        }
    }
}

impl RoomDimensions {
    /// Y плоскости пола относительно центра комнаты
    pub fn floor_offset(&self) -> f32 {
        -self.height / 2.0
    }
}

/// Размеры цилиндрической мишени
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct TargetDimensions {
    pub radius: f32,
    pub height: f32,
}

impl Default for TargetDimensions {
    fn default() -> Self {
        Self {
            radius: 0.3,
            height: 1.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct CombatConfig {
    /// Патроны на старте сессии (перезарядки нет)
    pub starting_ammo: u32,
    /// Дальность hit-scan луча (метры)
    pub max_shot_range: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            starting_ammo: 30,
            max_shot_range: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct EffectConfig {
    /// Время жизни muzzle flash (мс)
    pub muzzle_flash_ms: u64,
    /// Время жизни decal'а (мс)
    pub decal_ms: u64,
    /// Сторона квадратного decal'а (метры)
    pub decal_size: f32,
    /// Отступ decal'а от поверхности вдоль нормали (против z-fighting)
    pub decal_surface_offset: f32,
    /// Muzzle point относительно view, если у стрелка нет `Weapon`
    pub default_muzzle_offset: Vec3,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            muzzle_flash_ms: 60,
            decal_ms: 5_000,
            decal_size: 0.15,
            decal_surface_offset: 0.01,
            default_muzzle_offset: Vec3::new(0.25, -0.2, -0.8),
        }
    }
}

impl EffectConfig {
    pub fn muzzle_flash_lifetime(&self) -> Duration {
        Duration::from_millis(self.muzzle_flash_ms)
    }

    pub fn decal_lifetime(&self) -> Duration {
        Duration::from_millis(self.decal_ms)
    }
}

/// Параметры first-person контроллера
///
/// Сам collision sweep делает rapier (`KinematicCharacterController`),
/// здесь только то, что мы настраиваем поверх него.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct PlayerConfig {
    /// Позиция view (центр collision ellipsoid) при спавне
    pub spawn_position: Vec3,
    /// Точка, на которую смотрит камера при спавне
    pub look_at: Vec3,
    /// Полуоси collision ellipsoid (x = z = радиус, y = половина роста)
    pub ellipsoid: Vec3,
    /// m/s², отрицательная = вниз
    pub gravity: f32,
    /// m/s
    pub move_speed: f32,
    /// Пикселей мыши на радиан поворота (больше = медленнее)
    pub angular_sensibility: f32,
    pub capture_mode: CaptureMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn_position: Vec3::new(0.0, 1.6, -3.0),
            look_at: Vec3::new(0.0, 1.6, 0.0),
            ellipsoid: Vec3::new(0.5, 0.9, 0.5),
            gravity: -9.81,
            move_speed: 5.0,
            angular_sensibility: 5000.0,
            capture_mode: CaptureMode::WhileHeld,
        }
    }
}

/// Resource: вся конфигурация range
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct RangeConfig {
    pub room: RoomDimensions,
    pub target: TargetDimensions,
    pub combat: CombatConfig,
    pub effects: EffectConfig,
    pub player: PlayerConfig,
}
