//! Level module - процедурная геометрия range
//!
//! - room: RoomSpec → RoomGeometry (pure)
//! - layout: список комнат → LevelGeometry, FloorPlan, door diagnostics
//! - spawn: LevelGeometry → rapier entities (Startup), teardown

use bevy::prelude::*;

use crate::SimulationSet;

pub mod layout;
pub mod room;
pub mod spawn;


pub use layout::{
    build_level, door_mismatches, standard_range, standing_height, DoorMismatch, FloorPlan, LayoutError,
    LevelGeometry, MismatchKind,
};
pub use room::{
    build_room, wall_segments, CoverAnchor, CoverSpec, DoorFlags, Face, JambSide, RoomGeometry, RoomSpec, TargetId,
    TargetPlacement, TargetSpec, WallPart, WallSegment,
};
pub use spawn::{count_targets, spawn_level_geometry, teardown_level, LevelPlan, LevelSurface, SceneTeardown, SurfaceShape, Target};

/// Level Plugin
///
/// Startup: spawn geometry → count targets (chain, чтобы count видел spawn).
/// Update: teardown по SceneTeardown / AppExit.
pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelPlan>()
            .add_event::<SceneTeardown>()
            .add_systems(Startup, (spawn_level_geometry, count_targets).chain())
            .add_systems(Update, teardown_level.in_set(SimulationSet::Effects));
    }
}
