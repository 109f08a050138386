use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use killhouse_simulation::logger::set_logger;
use killhouse_simulation::SimulationPlugin;

mod camera;
mod controls;
mod hud;
mod logging;
mod rendering;

use camera::CameraPlugin;
use controls::ControlsPlugin;
use hud::HudPlugin;
use logging::BevyLogPrinter;
use rendering::RenderingSyncPlugin;

fn main() {
    // Core логирует через killhouse_simulation::logger → форвардим в bevy::log
    set_logger(Box::new(BevyLogPrinter));

    App::new()
        // Bevy defaults (rendering, input, time, etc.)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "KILLHOUSE".to_string(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        // Collision sweep + raycast pipeline
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        // Simulation (level, combat, effects, player state)
        .add_plugins(SimulationPlugin::rapier())
        // Meshes для level surfaces и эффектов
        .add_plugins(RenderingSyncPlugin)
        // First-person камера + cursor grab
        .add_plugins(CameraPlugin)
        // Keyboard / mouse → simulation input
        .add_plugins(ControlsPlugin)
        // Ammo / targets
        .add_plugins(HudPlugin)
        .add_systems(Startup, setup_scene)
        .run();
}

/// Свет сверху (как hemispheric light) + фон
fn setup_scene(mut commands: Commands) {
    commands.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        affects_lightmapped_meshes: false,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 3000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_3)),
    ));
}
