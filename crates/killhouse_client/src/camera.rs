use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use killhouse_simulation::{PlayerView, PointerCapture};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (attach_camera_to_view, apply_cursor_grab));
    }
}

/// Вертикальный FOV first-person камеры (радианы)
const VIEW_FOV: f32 = 1.2;

/// Camera3d на view игрока (pitch/yaw приходят из симуляции)
fn attach_camera_to_view(mut commands: Commands, views: Query<Entity, Added<PlayerView>>) {
    for view in views.iter() {
        commands.entity(view).insert((
            Camera3d::default(),
            Projection::Perspective(PerspectiveProjection {
                fov: VIEW_FOV,
                near: 0.05,
                ..default()
            }),
        ));
    }
}

/// PointerCapture → cursor lock/visibility
fn apply_cursor_grab(capture: Res<PointerCapture>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if !capture.is_changed() {
        return;
    }

    let Ok(mut window) = windows.single_mut() else {
        return;
    };

    if capture.is_captured() {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    } else {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    }
}
