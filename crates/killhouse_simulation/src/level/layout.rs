//! Level Layout - список RoomSpec → LevelGeometry
//!
//! `build_level` строит комнаты в порядке вызывающего и нумерует мишени
//! сквозь весь уровень. Выравнивание дверей между соседями не валидируется:
//! `door_mismatches` только собирает диагностику (build логирует warnings).
//!
//! `FloorPlan` - grid-builder, через который двери соседей всегда совпадают.

use bevy::prelude::*;
use rand::Rng;
use std::fmt;

use crate::config::{RoomDimensions, TargetDimensions};
use crate::geometry::Primitive;
use crate::level::room::{build_room, DoorFlags, Face, RoomGeometry, RoomSpec, TargetPlacement, TargetSpec};
use crate::logger;

/// Допуск при сравнении позиций комнат
const ADJACENCY_EPSILON: f32 = 1e-3;

/// Отступ мишени от стены при scatter (поверх толщины стены и радиуса)
const SCATTER_WALL_MARGIN: f32 = 0.5;

/// Построенный уровень
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelGeometry {
    pub rooms: Vec<RoomGeometry>,
}

impl LevelGeometry {
    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.rooms.iter().flat_map(|room| room.primitives())
    }

    pub fn targets(&self) -> impl Iterator<Item = &TargetPlacement> {
        self.rooms.iter().flat_map(|room| room.targets.iter())
    }

    /// Количество мишеней по всем комнатам
    pub fn total_targets(&self) -> u32 {
        self.targets().count() as u32
    }

    pub fn room(&self, id: &str) -> Option<&RoomGeometry> {
        self.rooms.iter().find(|room| room.id == id)
    }
}

/// Level Layout
///
/// Комнаты независимы, порядок влияет только на нумерацию мишеней.
pub fn build_level(rooms: &[RoomSpec], dims: &RoomDimensions, target_dims: &TargetDimensions) -> LevelGeometry {
    for mismatch in door_mismatches(rooms, dims) {
        logger::log_warning(&format!("⚠️ Level layout: {}", mismatch));
    }

    let mut next_target = 0u32;
    let built: Vec<RoomGeometry> = rooms
        .iter()
        .map(|spec| {
            let mut room = build_room(spec, dims, target_dims);
            room.renumber_targets(next_target);
            next_target += room.target_count() as u32;
            room
        })
        .collect();

    let level = LevelGeometry { rooms: built };
    logger::log_info(&format!(
        "🏗️ Level built: {} rooms, {} primitives, {} targets",
        level.rooms.len(),
        level.primitives().count(),
        level.total_targets()
    ));
    level
}

/// Что не так с дверью
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// За дверью нет комнаты
    OpensToVoid,
    /// Сосед есть, но его встречная стена глухая
    NeighbourWallClosed,
}

/// Диагностика: дверь, не совпадающая с соседом
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorMismatch {
    pub room: String,
    pub face: Face,
    pub neighbour: Option<String>,
    pub kind: MismatchKind,
}

impl fmt::Display for DoorMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.neighbour) {
            (MismatchKind::NeighbourWallClosed, Some(neighbour)) => write!(
                f,
                "room '{}' {} door faces a solid {} wall of '{}'",
                self.room,
                self.face.name(),
                self.face.opposite().name(),
                neighbour
            ),
            _ => write!(f, "room '{}' {} door opens to nothing", self.room, self.face.name()),
        }
    }
}

/// Соседняя комната за стеной `face` (ровно на расстоянии width/depth)
fn neighbour_across<'a>(rooms: &'a [RoomSpec], from: &RoomSpec, face: Face, dims: &RoomDimensions) -> Option<&'a RoomSpec> {
    let expected = from.position + face.outward() * face.offset_length(dims) * 2.0;
    rooms
        .iter()
        .find(|room| room.position.abs_diff_eq(expected, ADJACENCY_EPSILON))
}

/// Все открытые двери без встречной двери у соседа
pub fn door_mismatches(rooms: &[RoomSpec], dims: &RoomDimensions) -> Vec<DoorMismatch> {
    let mut mismatches = Vec::new();

    for room in rooms {
        for face in room.doors.open_faces() {
            match neighbour_across(rooms, room, face, dims) {
                None => mismatches.push(DoorMismatch {
                    room: room.id.clone(),
                    face,
                    neighbour: None,
                    kind: MismatchKind::OpensToVoid,
                }),
                Some(neighbour) if !neighbour.doors.is_open(face.opposite()) => {
                    mismatches.push(DoorMismatch {
                        room: room.id.clone(),
                        face,
                        neighbour: Some(neighbour.id.clone()),
                        kind: MismatchKind::NeighbourWallClosed,
                    })
                }
                Some(_) => {}
            }
        }
    }

    mismatches
}

/// Ошибки авторинга FloorPlan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    DuplicateRoom(String),
    UnknownRoom(usize),
    CellOccupied { cell: IVec2, occupant: String },
    NotAdjacent { a: String, b: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::DuplicateRoom(id) => write!(f, "room id '{}' used twice", id),
            LayoutError::UnknownRoom(index) => write!(f, "no room with index {}", index),
            LayoutError::CellOccupied { cell, occupant } => {
                write!(f, "cell ({}, {}) already holds room '{}'", cell.x, cell.y, occupant)
            }
            LayoutError::NotAdjacent { a, b } => write!(f, "rooms '{}' and '{}' are not grid neighbours", a, b),
        }
    }
}

impl std::error::Error for LayoutError {}

#[derive(Debug, Clone)]
struct PlannedRoom {
    cell: IVec2,
    spec: RoomSpec,
}

/// Grid-builder уровня
///
/// Ячейка (x, z) → центр `origin + (x·width, 0, z·depth)`.
/// `connect` открывает пару встречных дверей сразу у обеих комнат.
#[derive(Debug, Clone)]
pub struct FloorPlan {
    dims: RoomDimensions,
    origin: Vec3,
    rooms: Vec<PlannedRoom>,
}

impl FloorPlan {
    pub fn new(dims: RoomDimensions, origin: Vec3) -> Self {
        Self {
            dims,
            origin,
            rooms: Vec::new(),
        }
    }

    /// Ряд комнат вдоль +X, соседи соединены (east ⇔ west)
    pub fn corridor(dims: RoomDimensions, origin: Vec3, ids: &[&str]) -> Result<Self, LayoutError> {
        let mut plan = Self::new(dims, origin);
        for (x, id) in ids.iter().enumerate() {
            plan.add_room(*id, IVec2::new(x as i32, 0))?;
        }
        for index in 1..plan.len() {
            plan.connect(index - 1, index)?;
        }
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn cell_center(&self, cell: IVec2) -> Vec3 {
        self.origin + Vec3::new(cell.x as f32 * self.dims.width, 0.0, cell.y as f32 * self.dims.depth)
    }

    pub fn find(&self, id: &str) -> Option<usize> {
        self.rooms.iter().position(|room| room.spec.id == id)
    }

    /// Добавляет комнату без дверей, возвращает её индекс
    pub fn add_room(&mut self, id: impl Into<String>, cell: IVec2) -> Result<usize, LayoutError> {
        let id = id.into();
        if self.find(&id).is_some() {
            return Err(LayoutError::DuplicateRoom(id));
        }
        if let Some(occupant) = self.rooms.iter().find(|room| room.cell == cell) {
            return Err(LayoutError::CellOccupied {
                cell,
                occupant: occupant.spec.id.clone(),
            });
        }

        let spec = RoomSpec::new(id, self.cell_center(cell));
        self.rooms.push(PlannedRoom { cell, spec });
        Ok(self.rooms.len() - 1)
    }

    pub fn room_mut(&mut self, index: usize) -> Result<&mut RoomSpec, LayoutError> {
        self.rooms
            .get_mut(index)
            .map(|room| &mut room.spec)
            .ok_or(LayoutError::UnknownRoom(index))
    }

    pub fn room(&self, index: usize) -> Result<&RoomSpec, LayoutError> {
        self.rooms
            .get(index)
            .map(|room| &room.spec)
            .ok_or(LayoutError::UnknownRoom(index))
    }

    /// Открывает встречные двери двух соседних ячеек
    pub fn connect(&mut self, a: usize, b: usize) -> Result<(), LayoutError> {
        let cell_a = self.rooms.get(a).ok_or(LayoutError::UnknownRoom(a))?.cell;
        let cell_b = self.rooms.get(b).ok_or(LayoutError::UnknownRoom(b))?.cell;

        let Some(face) = Face::ALL.into_iter().find(|face| cell_a + face.grid_step() == cell_b) else {
            return Err(LayoutError::NotAdjacent {
                a: self.rooms[a].spec.id.clone(),
                b: self.rooms[b].spec.id.clone(),
            });
        };

        self.rooms[a].spec.doors.set(face, true);
        self.rooms[b].spec.doors.set(face.opposite(), true);
        Ok(())
    }

    /// Случайные мишени внутри каждой комнаты (стоят на полу)
    ///
    /// Детерминированно при одинаковом seed RNG.
    pub fn scatter_targets(&mut self, rng: &mut impl Rng, per_room: usize, target_dims: &TargetDimensions) {
        let keep_out = self.dims.wall_thickness / 2.0 + target_dims.radius + SCATTER_WALL_MARGIN;
        let half_x = (self.dims.width / 2.0 - keep_out).max(0.0);
        let half_z = (self.dims.depth / 2.0 - keep_out).max(0.0);
        let y = standing_height(&self.dims, target_dims);

        for room in &mut self.rooms {
            for _ in 0..per_room {
                let x = if half_x > 0.0 { rng.gen_range(-half_x..half_x) } else { 0.0 };
                let z = if half_z > 0.0 { rng.gen_range(-half_z..half_z) } else { 0.0 };
                room.spec.targets.push(TargetSpec {
                    offset: Vec3::new(x, y, z),
                });
            }
        }
    }

    pub fn into_specs(self) -> Vec<RoomSpec> {
        self.rooms.into_iter().map(|room| room.spec).collect()
    }
}

/// Y offset центра мишени, стоящей на полу (относительно центра комнаты)
pub fn standing_height(dims: &RoomDimensions, target_dims: &TargetDimensions) -> f32 {
    dims.floor_offset() + target_dims.height / 2.0
}

/// Стандартный range: три комнаты вдоль +X, пол на y = 0
///
/// entry (дверь east) → hall (west + east) → range (west).
pub fn standard_range(dims: &RoomDimensions, target_dims: &TargetDimensions) -> Vec<RoomSpec> {
    let center_y = dims.height / 2.0;
    let target_y = standing_height(dims, target_dims);

    let entry = RoomSpec::new("entry", Vec3::new(0.0, center_y, 0.0)).with_doors(DoorFlags::open(&[Face::East]));

    let hall = RoomSpec::new("hall", Vec3::new(dims.width, center_y, 0.0))
        .with_doors(DoorFlags::open(&[Face::West, Face::East]))
        .with_cover(Vec3::new(-1.5, 0.0, 2.0), Vec3::new(2.0, 1.0, 0.5))
        .with_cover(Vec3::new(1.5, 0.0, -2.0), Vec3::new(2.0, 1.2, 0.5))
        .with_target(Vec3::new(2.0, target_y, 3.5))
        .with_target(Vec3::new(-2.5, target_y, -3.5));

    let range = RoomSpec::new("range", Vec3::new(dims.width * 2.0, center_y, 0.0))
        .with_doors(DoorFlags::open(&[Face::West]))
        .with_cover(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 3.0))
        .with_target(Vec3::new(3.5, target_y, -2.5))
        .with_target(Vec3::new(3.5, target_y, 0.0))
        .with_target(Vec3::new(3.5, target_y, 2.5));

    vec![entry, hall, range]
}
