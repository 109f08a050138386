use bevy::prelude::*;
use killhouse_simulation::{GameState, OutOfAmmo, RangeCleared};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudStatus>()
            .add_systems(Startup, spawn_hud)
            .add_systems(Update, (track_status, update_counters, update_status_line).chain());
    }
}

/// Счётчики: ammo / targets
#[derive(Component)]
struct CounterText;

/// Строка статуса (out of ammo / range cleared)
#[derive(Component)]
struct StatusText;

#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
enum HudStatus {
    #[default]
    Shooting,
    OutOfAmmo,
    Cleared,
}

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(4.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                CounterText,
                Text::new(""),
                TextFont {
                    font_size: 22.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                StatusText,
                Text::new(""),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(Color::srgb(1.0, 0.8, 0.2)),
            ));
        });

    // Crosshair: точка в центре экрана (луч выстрела идёт именно отсюда)
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Node {
                    width: Val::Px(4.0),
                    height: Val::Px(4.0),
                    ..default()
                },
                BackgroundColor(Color::WHITE),
            ));
        });
}

fn track_status(
    mut status: ResMut<HudStatus>,
    mut out_of_ammo: EventReader<OutOfAmmo>,
    mut cleared: EventReader<RangeCleared>,
) {
    // Cleared важнее out of ammo
    if cleared.read().count() > 0 {
        *status = HudStatus::Cleared;
    } else if out_of_ammo.read().count() > 0 && *status != HudStatus::Cleared {
        *status = HudStatus::OutOfAmmo;
    }
}

/// HUD читает GameState только при изменении
fn update_counters(state: Res<GameState>, mut texts: Query<&mut Text, With<CounterText>>) {
    if !state.is_changed() {
        return;
    }

    for mut text in texts.iter_mut() {
        text.0 = format!(
            "Ammo: {}   Targets: {}/{}",
            state.ammo_remaining(),
            state.targets_hit(),
            state.total_targets()
        );
    }
}

fn update_status_line(status: Res<HudStatus>, mut texts: Query<&mut Text, With<StatusText>>) {
    if !status.is_changed() {
        return;
    }

    let line = match *status {
        HudStatus::Shooting => "",
        HudStatus::OutOfAmmo => "Out of ammo",
        HudStatus::Cleared => "Range cleared!",
    };
    for mut text in texts.iter_mut() {
        text.0 = line.to_string();
    }
}
