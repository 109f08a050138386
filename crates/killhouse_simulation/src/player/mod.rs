//! Player module - first-person body + view
//!
//! Иерархия:
//! - body (`Player`): yaw, collision ellipsoid, `FirstPersonController`
//! - view (`PlayerView`, child): pitch, `Weapon`; клиент вешает сюда Camera3d
//!
//! Input systems используют `With<Player>` filter.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

pub mod controller;
pub mod pointer;

pub use controller::{
    apply_look_input, apply_movement_input, headless_ground_detection, read_character_output, sync_view_pitch,
    yaw_pitch_towards, FirstPersonController, LookInput, MovementInput,
};
pub use pointer::{handle_pointer_input, CaptureMode, PointerCapture, PointerInput};

use crate::collision::player_groups;
use crate::combat::Weapon;
use crate::config::RangeConfig;
use crate::logger;
use crate::{PhysicsBackend, SimulationSet};

/// Marker component для player-controlled body
///
/// В single-player режиме ровно один entity имеет этот компонент.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Marker: child view игрока (камера, muzzle point)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerView;

/// Startup: body + view по PlayerConfig
pub fn spawn_player(mut commands: Commands, config: Res<RangeConfig>, backend: Res<PhysicsBackend>) {
    let player = &config.player;
    let controller = FirstPersonController::from_config(player);

    let body = commands
        .spawn((
            Name::new("Player"),
            Player,
            controller,
            MovementInput::default(),
            LookInput::default(),
            Transform::from_translation(player.spawn_position).with_rotation(controller.body_rotation()),
        ))
        .id();

    if *backend == PhysicsBackend::Rapier {
        // Ellipsoid (r, h, r) ≈ capsule: полусегмент h - r, радиус r
        let radius = player.ellipsoid.x.max(player.ellipsoid.z);
        let half_segment = (player.ellipsoid.y - radius).max(0.0);
        commands.entity(body).insert((
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(half_segment, radius),
            player_groups(),
            KinematicCharacterController {
                filter_groups: Some(player_groups()),
                ..default()
            },
        ));
    }

    commands.spawn((
        Name::new("PlayerView"),
        PlayerView,
        Weapon {
            muzzle_offset: config.effects.default_muzzle_offset,
        },
        Transform::from_rotation(controller.view_rotation()),
        ChildOf(body),
    ));

    logger::log_info(&format!(
        "🧍 Player spawned at {:?} (yaw {:.2}, pitch {:.2})",
        player.spawn_position, controller.yaw, controller.pitch
    ));
}

/// Player Plugin
///
/// Порядок (SimulationSet::Input):
/// 1. handle_pointer_input - capture state + FireIntent
/// 2. apply_look_input / sync_view_pitch - камера
/// 3. apply_movement_input - WASD + gravity
/// 4. ground detection (headless) / чтение sweep output (rapier)
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerCapture>()
            .add_event::<PointerInput>()
            .add_systems(Startup, spawn_player)
            .add_systems(
                Update,
                (
                    handle_pointer_input,
                    apply_look_input,
                    sync_view_pitch,
                    apply_movement_input,
                    headless_ground_detection,
                    read_character_output,
                )
                    .chain()
                    .in_set(SimulationSet::Input),
            );
    }
}
