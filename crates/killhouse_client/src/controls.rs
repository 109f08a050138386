use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use killhouse_simulation::{LookInput, MovementInput, Player, PointerInput, SimulationSet};

pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        // До симуляции: input этого кадра виден player systems
        app.add_systems(
            Update,
            (read_keyboard_movement, read_mouse_motion, read_pointer_buttons).before(SimulationSet::Input),
        );
    }
}

/// WASD → MovementInput (x = вправо, y = вперёд)
fn read_keyboard_movement(keys: Res<ButtonInput<KeyCode>>, mut players: Query<&mut MovementInput, With<Player>>) {
    let mut direction = Vec2::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        direction.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        direction.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        direction.x += 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        direction.x -= 1.0;
    }

    for mut input in players.iter_mut() {
        input.direction = direction;
    }
}

/// Mouse motion → LookInput (копится до apply_look_input)
fn read_mouse_motion(mut motion: EventReader<MouseMotion>, mut players: Query<&mut LookInput, With<Player>>) {
    let delta: Vec2 = motion.read().map(|event| event.delta).sum();
    if delta == Vec2::ZERO {
        return;
    }

    for mut look in players.iter_mut() {
        look.delta += delta;
    }
}

/// ЛКМ / Escape → PointerInput
fn read_pointer_buttons(
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut pointer: EventWriter<PointerInput>,
) {
    if mouse.just_pressed(MouseButton::Left) {
        pointer.write(PointerInput::PrimaryPressed);
    }
    if mouse.just_released(MouseButton::Left) {
        pointer.write(PointerInput::PrimaryReleased);
    }
    if keys.just_pressed(KeyCode::Escape) {
        pointer.write(PointerInput::Escape);
    }
}
