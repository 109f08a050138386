//! Pointer capture + fire trigger
//!
//! Клиент переводит mouse buttons / Escape в `PointerInput`, здесь
//! state machine Released ⇄ Captured. Каждый PrimaryPressed = выстрел
//! из центра view (независимо от состояния захвата).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::FireIntent;
use crate::config::RangeConfig;
use crate::logger;
use crate::player::{Player, PlayerView};

/// Когда отпускать захваченный курсор
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum CaptureMode {
    /// Захват пока зажата кнопка (release на отпускании)
    #[default]
    WhileHeld,
    /// Захват до Escape
    UntilEscape,
}

/// Resource: состояние pointer lock
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerCapture {
    #[default]
    Released,
    Captured,
}

impl PointerCapture {
    pub fn is_captured(&self) -> bool {
        matches!(self, PointerCapture::Captured)
    }

    pub fn transition(self, input: PointerInput, mode: CaptureMode) -> Self {
        match (input, mode) {
            (PointerInput::PrimaryPressed, _) => PointerCapture::Captured,
            (PointerInput::PrimaryReleased, CaptureMode::WhileHeld) => PointerCapture::Released,
            (PointerInput::PrimaryReleased, CaptureMode::UntilEscape) => self,
            (PointerInput::Escape, _) => PointerCapture::Released,
        }
    }
}

/// Event: сырой pointer input от клиента
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerInput {
    PrimaryPressed,
    PrimaryReleased,
    Escape,
}

/// PointerInput → PointerCapture + FireIntent
pub fn handle_pointer_input(
    mut inputs: EventReader<PointerInput>,
    mut capture: ResMut<PointerCapture>,
    config: Res<RangeConfig>,
    players: Query<&Transform, With<Player>>,
    views: Query<(Entity, &ChildOf, &Transform), With<PlayerView>>,
    mut fire_intents: EventWriter<FireIntent>,
) {
    for input in inputs.read() {
        let next = capture.transition(*input, config.player.capture_mode);
        if next != *capture {
            logger::log(&format!("🖱️ Pointer {:?} → {:?}", *capture, next));
            *capture = next;
        }

        if *input != PointerInput::PrimaryPressed {
            continue;
        }

        for (view_entity, child_of, view) in views.iter() {
            let Ok(body) = players.get(child_of.parent()) else {
                logger::log_warning("⚠️ PlayerView without Player parent, shot ignored");
                continue;
            };
            let world_view = body.mul_transform(*view);
            fire_intents.write(FireIntent::from_view(view_entity, &world_view));
        }
    }
}
