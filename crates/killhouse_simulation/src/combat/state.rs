//! GameState - патроны и прогресс по мишеням
//!
//! Поля приватные: мутирует только combat tracker (`pub(crate)` методы),
//! HUD/observers читают через getters или `snapshot()`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{CombatConfig, RangeConfig};

/// Resource: состояние сессии
///
/// Инварианты:
/// - `ammo_remaining` только убывает, по 1 за выстрел
/// - `targets_hit <= total_targets`
/// - `total_targets` фиксируется один раз (после build уровня)
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    ammo_remaining: u32,
    total_targets: u32,
    targets_hit: u32,
    targets_counted: bool,
}

impl GameState {
    pub fn new(starting_ammo: u32) -> Self {
        Self {
            ammo_remaining: starting_ammo,
            total_targets: 0,
            targets_hit: 0,
            targets_counted: false,
        }
    }

    pub fn ammo_remaining(&self) -> u32 {
        self.ammo_remaining
    }

    pub fn total_targets(&self) -> u32 {
        self.total_targets
    }

    pub fn targets_hit(&self) -> u32 {
        self.targets_hit
    }

    /// Производное значение, отдельно не хранится
    pub fn targets_remaining(&self) -> u32 {
        self.total_targets - self.targets_hit
    }

    pub fn targets_counted(&self) -> bool {
        self.targets_counted
    }

    pub fn can_fire(&self) -> bool {
        self.ammo_remaining > 0
    }

    /// Все мишени сбиты (пустой уровень не считается пройденным)
    pub fn is_cleared(&self) -> bool {
        self.targets_counted && self.total_targets > 0 && self.targets_remaining() == 0
    }

    /// Фиксирует totalTargets; повторный вызов игнорируется (false)
    pub(crate) fn set_total_targets(&mut self, total: u32) -> bool {
        if self.targets_counted {
            return false;
        }
        self.total_targets = total;
        self.targets_counted = true;
        true
    }

    /// -1 патрон; false если магазин пуст (состояние не меняется)
    pub(crate) fn spend_round(&mut self) -> bool {
        match self.ammo_remaining.checked_sub(1) {
            Some(left) => {
                self.ammo_remaining = left;
                true
            }
            None => false,
        }
    }

    /// +1 сбитая мишень; false если счётчик уже на максимуме
    pub(crate) fn record_target_down(&mut self) -> bool {
        if self.targets_hit >= self.total_targets {
            return false;
        }
        self.targets_hit += 1;
        true
    }

    pub fn snapshot(&self) -> GameStateSnapshot {
        GameStateSnapshot {
            ammo_remaining: self.ammo_remaining,
            total_targets: self.total_targets,
            targets_hit: self.targets_hit,
            targets_remaining: self.targets_remaining(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(CombatConfig::default().starting_ammo)
    }
}

impl FromWorld for GameState {
    fn from_world(world: &mut World) -> Self {
        match world.get_resource::<RangeConfig>() {
            Some(config) => Self::new(config.combat.starting_ammo),
            None => Self::default(),
        }
    }
}

/// Read-only копия для HUD / headless отчёта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub ammo_remaining: u32,
    pub total_targets: u32,
    pub targets_hit: u32,
    pub targets_remaining: u32,
}
