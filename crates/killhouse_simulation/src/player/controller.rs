//! First-person контроллер (state поверх physics engine)
//!
//! Архитектура:
//! - Rapier backend: `KinematicCharacterController` делает collision sweep,
//!   мы только отдаём желаемый translation и читаем `grounded` обратно
//! - Headless backend: прямая интеграция + ground check по floor slab'ам
//! - Yaw на body, pitch на child view (камера + оружие)

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use std::f32::consts::FRAC_PI_2;

use crate::config::PlayerConfig;
use crate::geometry::SurfaceRole;
use crate::level::{LevelSurface, SurfaceShape};
use crate::player::pointer::PointerCapture;
use crate::player::{Player, PlayerView};
use crate::PhysicsBackend;

/// Запас, чтобы pitch не доходил до ±90° (gimbal)
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Kinematic контроллер компонент
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct FirstPersonController {
    /// Скорость движения (m/s)
    pub move_speed: f32,
    /// m/s², отрицательная = вниз
    pub gravity: f32,
    /// Полуоси collision ellipsoid
    pub ellipsoid: Vec3,
    /// Пикселей на радиан
    pub angular_sensibility: f32,
    /// На земле ли (гравитация не копится)
    pub grounded: bool,
    /// Накопленная вертикальная скорость (m/s)
    pub vertical_speed: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl FirstPersonController {
    pub fn from_config(config: &PlayerConfig) -> Self {
        let (yaw, pitch) = yaw_pitch_towards(config.spawn_position, config.look_at);
        Self {
            move_speed: config.move_speed,
            gravity: config.gravity,
            ellipsoid: config.ellipsoid,
            angular_sensibility: config.angular_sensibility,
            grounded: false,
            vertical_speed: 0.0,
            yaw,
            pitch,
        }
    }

    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    pub fn view_rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch)
    }

    /// Поворот от смещения мыши (пиксели)
    pub fn apply_look(&mut self, delta: Vec2) {
        if self.angular_sensibility <= 0.0 {
            return;
        }
        self.yaw -= delta.x / self.angular_sensibility;
        self.pitch = (self.pitch - delta.y / self.angular_sensibility).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Желаемое смещение за кадр (yaw-relative WASD + гравитация)
    pub fn step(&mut self, input: &MovementInput, delta_secs: f32) -> Vec3 {
        let rotation = self.body_rotation();
        let forward = rotation * Vec3::NEG_Z;
        let right = rotation * Vec3::X;
        let horizontal = (right * input.direction.x + forward * input.direction.y).normalize_or_zero() * self.move_speed;

        if self.grounded {
            self.vertical_speed = 0.0;
        } else {
            self.vertical_speed += self.gravity * delta_secs;
        }

        (horizontal + Vec3::Y * self.vertical_speed) * delta_secs
    }
}

/// Yaw/pitch, при которых view смотрит из `from` в `to`
pub fn yaw_pitch_towards(from: Vec3, to: Vec3) -> (f32, f32) {
    let direction = (to - from).normalize_or_zero();
    if direction == Vec3::ZERO {
        return (0.0, 0.0);
    }
    let yaw = f32::atan2(-direction.x, -direction.z);
    let pitch = direction.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
    (yaw, pitch)
}

/// Входные данные для движения (WASD)
///
/// Для headless тестов - mock input через этот компонент.
/// Для игры - заполняется клиентом из ButtonInput<KeyCode>.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MovementInput {
    /// x = вправо, y = вперёд (не обязательно normalized)
    pub direction: Vec2,
}

/// Смещение мыши за кадр (пиксели), обнуляется после применения
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct LookInput {
    pub delta: Vec2,
}

/// Система поворота камеры (только пока pointer захвачен)
pub fn apply_look_input(
    capture: Res<PointerCapture>,
    mut players: Query<(&mut FirstPersonController, &mut LookInput, &mut Transform), With<Player>>,
) {
    for (mut controller, mut look, mut transform) in players.iter_mut() {
        let delta = std::mem::take(&mut look.delta);
        if capture.is_captured() && delta != Vec2::ZERO {
            controller.apply_look(delta);
        }
        transform.rotation = controller.body_rotation();
    }
}

/// Pitch → child view
pub fn sync_view_pitch(
    players: Query<&FirstPersonController, With<Player>>,
    mut views: Query<(&ChildOf, &mut Transform), With<PlayerView>>,
) {
    for (child_of, mut transform) in views.iter_mut() {
        let Ok(controller) = players.get(child_of.parent()) else {
            continue;
        };
        transform.rotation = controller.view_rotation();
    }
}

/// Система движения
///
/// Rapier: translation в `KinematicCharacterController` (sweep делает engine).
/// Headless: сразу в Transform, ground check отдельно.
pub fn apply_movement_input(
    backend: Res<PhysicsBackend>,
    time: Res<Time>,
    mut players: Query<
        (
            &mut FirstPersonController,
            &MovementInput,
            &mut Transform,
            Option<&mut KinematicCharacterController>,
        ),
        With<Player>,
    >,
) {
    let delta = time.delta_secs();

    for (mut controller, input, mut transform, character) in players.iter_mut() {
        let translation = controller.step(input, delta);

        match (*backend, character) {
            (PhysicsBackend::Rapier, Some(mut character)) => character.translation = Some(translation),
            _ => transform.translation += translation,
        }
    }
}

/// Rapier: grounded из результата sweep
pub fn read_character_output(
    mut players: Query<(&mut FirstPersonController, &KinematicCharacterControllerOutput), With<Player>>,
) {
    for (mut controller, output) in players.iter_mut() {
        controller.grounded = output.grounded;
    }
}

/// Headless ground detection: верх floor slab'а под игроком
///
/// Если низ ellipsoid'а ушёл ниже пола - ставим на пол, grounded = true.
pub fn headless_ground_detection(
    backend: Res<PhysicsBackend>,
    floors: Query<(&LevelSurface, &SurfaceShape, &Transform), Without<Player>>,
    mut players: Query<(&mut FirstPersonController, &mut Transform), With<Player>>,
) {
    if *backend != PhysicsBackend::Headless {
        return;
    }

    for (mut controller, mut transform) in players.iter_mut() {
        let position = transform.translation;
        let floor_top = floors
            .iter()
            .filter(|(surface, _, _)| surface.role == SurfaceRole::Floor)
            .filter_map(|(_, shape, floor)| {
                let half = shape.0.half_extents();
                let inside = (position.x - floor.translation.x).abs() <= half.x
                    && (position.z - floor.translation.z).abs() <= half.z;
                inside.then_some(floor.translation.y + half.y)
            })
            .filter(|top| *top <= position.y)
            .reduce(f32::max);

        let Some(floor_top) = floor_top else {
            controller.grounded = false;
            continue;
        };

        let feet = position.y - controller.ellipsoid.y;
        if feet <= floor_top {
            transform.translation.y = floor_top + controller.ellipsoid.y;
            controller.grounded = true;
            controller.vertical_speed = 0.0;
        } else {
            controller.grounded = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FirstPersonController {
        FirstPersonController::from_config(&PlayerConfig::default())
    }

    #[test]
    fn test_spawn_faces_look_at() {
        let config = PlayerConfig::default();
        let controller = FirstPersonController::from_config(&config);
        let forward = controller.body_rotation() * controller.view_rotation() * Vec3::NEG_Z;
        let expected = (config.look_at - config.spawn_position).normalize();
        assert!(forward.abs_diff_eq(expected, 1e-5), "forward = {:?}", forward);
    }

    #[test]
    fn test_yaw_towards_positive_x() {
        let (yaw, pitch) = yaw_pitch_towards(Vec3::ZERO, Vec3::X);
        let forward = Quat::from_rotation_y(yaw) * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::X, 1e-5));
        assert_eq!(pitch, 0.0);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut controller = controller();
        controller.apply_look(Vec2::new(0.0, -1_000_000.0));
        assert!(controller.pitch <= PITCH_LIMIT);
        controller.apply_look(Vec2::new(0.0, 1_000_000.0));
        assert!(controller.pitch >= -PITCH_LIMIT);
    }

    #[test]
    fn test_look_uses_angular_sensibility() {
        let mut controller = controller();
        let yaw = controller.yaw;
        controller.apply_look(Vec2::new(5000.0, 0.0));
        assert!((controller.yaw - (yaw - 1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_step_moves_forward_relative_to_yaw() {
        let mut controller = controller();
        controller.grounded = true;
        controller.yaw = -FRAC_PI_2; // смотрим в +X

        let translation = controller.step(&MovementInput { direction: Vec2::Y }, 0.5);
        assert!(translation.abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), 1e-4), "{:?}", translation);
    }

    #[test]
    fn test_gravity_only_while_airborne() {
        let mut controller = controller();
        controller.grounded = false;
        let falling = controller.step(&MovementInput::default(), 0.1);
        assert!(falling.y < 0.0);

        controller.grounded = true;
        let standing = controller.step(&MovementInput::default(), 0.1);
        assert_eq!(standing, Vec3::ZERO);
        assert_eq!(controller.vertical_speed, 0.0);
    }

    #[test]
    fn test_diagonal_not_faster() {
        let mut controller = controller();
        controller.grounded = true;
        let diagonal = controller.step(&MovementInput { direction: Vec2::new(1.0, 1.0) }, 1.0);
        assert!((diagonal.length() - controller.move_speed).abs() < 1e-4);
    }
}
