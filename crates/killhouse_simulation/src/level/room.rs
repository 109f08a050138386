//! Room Builder - RoomSpec → RoomGeometry (чистая функция, без ECS)
//!
//! Комната = пол + потолок + 4 стены + cover + мишени.
//! Стена с открытой дверью = два jamb'а + lintel над проёмом.
//! North/South режут стену по ширине (X), East/West - по глубине (Z):
//! одно правило `wall_segments`, оси меняются через `Face`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{RoomDimensions, TargetDimensions};
use crate::geometry::{Primitive, SurfaceRole};

/// Сторона комнаты
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum Face {
    /// +Z
    North,
    /// -Z
    South,
    /// +X
    East,
    /// -X
    West,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::North, Face::South, Face::East, Face::West];

    /// Нормаль стены наружу
    pub fn outward(&self) -> Vec3 {
        match self {
            Face::North => Vec3::Z,
            Face::South => Vec3::NEG_Z,
            Face::East => Vec3::X,
            Face::West => Vec3::NEG_X,
        }
    }

    /// Ось, вдоль которой стена тянется (и режется дверью)
    pub fn span_axis(&self) -> Vec3 {
        match self {
            Face::North | Face::South => Vec3::X,
            Face::East | Face::West => Vec3::Z,
        }
    }

    pub fn opposite(&self) -> Face {
        match self {
            Face::North => Face::South,
            Face::South => Face::North,
            Face::East => Face::West,
            Face::West => Face::East,
        }
    }

    /// Шаг по сетке FloorPlan (x, z) к соседу за этой стеной
    pub fn grid_step(&self) -> IVec2 {
        match self {
            Face::North => IVec2::new(0, 1),
            Face::South => IVec2::new(0, -1),
            Face::East => IVec2::new(1, 0),
            Face::West => IVec2::new(-1, 0),
        }
    }

    /// Длина стены вдоль span_axis
    pub fn span_length(&self, dims: &RoomDimensions) -> f32 {
        match self {
            Face::North | Face::South => dims.width,
            Face::East | Face::West => dims.depth,
        }
    }

    /// Расстояние от центра комнаты до стены (по outward)
    pub fn offset_length(&self, dims: &RoomDimensions) -> f32 {
        match self {
            Face::North | Face::South => dims.depth / 2.0,
            Face::East | Face::West => dims.width / 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Face::North => "north",
            Face::South => "south",
            Face::East => "east",
            Face::West => "west",
        }
    }
}

/// Открытые двери по сторонам
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct DoorFlags {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl DoorFlags {
    pub fn open(faces: &[Face]) -> Self {
        let mut doors = Self::default();
        for face in faces {
            doors.set(*face, true);
        }
        doors
    }

    pub fn is_open(&self, face: Face) -> bool {
        match face {
            Face::North => self.north,
            Face::South => self.south,
            Face::East => self.east,
            Face::West => self.west,
        }
    }

    pub fn set(&mut self, face: Face, open: bool) {
        match face {
            Face::North => self.north = open,
            Face::South => self.south = open,
            Face::East => self.east = open,
            Face::West => self.west = open,
        }
    }

    pub fn open_faces(&self) -> impl Iterator<Item = Face> + '_ {
        Face::ALL.into_iter().filter(|face| self.is_open(*face))
    }
}

/// Как ставить cover по вертикали
///
/// Floor - центр cover = пол + половина высоты (y из offset игнорируется).
/// Raw - offset уже содержит нужный y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Reflect)]
pub enum CoverAnchor {
    #[default]
    Floor,
    Raw,
}

/// Укрытие (box), offset относительно центра комнаты
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct CoverSpec {
    pub offset: Vec3,
    /// width (X), height (Y), depth (Z)
    pub size: Vec3,
}

/// Мишень, offset относительно центра комнаты (центр цилиндра)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
pub struct TargetSpec {
    pub offset: Vec3,
}

/// Декларативное описание комнаты
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    /// Уникальный идентификатор (префикс всех labels)
    pub id: String,
    /// Центр комнаты (world space)
    pub position: Vec3,
    #[serde(default)]
    pub doors: DoorFlags,
    #[serde(default)]
    pub cover: Vec<CoverSpec>,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    #[serde(default)]
    pub cover_anchor: CoverAnchor,
}

impl RoomSpec {
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            doors: DoorFlags::default(),
            cover: Vec::new(),
            targets: Vec::new(),
            cover_anchor: CoverAnchor::default(),
        }
    }

    pub fn with_doors(mut self, doors: DoorFlags) -> Self {
        self.doors = doors;
        self
    }

    pub fn with_cover(mut self, offset: Vec3, size: Vec3) -> Self {
        self.cover.push(CoverSpec { offset, size });
        self
    }

    pub fn with_target(mut self, offset: Vec3) -> Self {
        self.targets.push(TargetSpec { offset });
        self
    }

    pub fn with_cover_anchor(mut self, anchor: CoverAnchor) -> Self {
        self.cover_anchor = anchor;
        self
    }
}

/// Стабильный ID мишени (сквозная нумерация по уровню)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect)]
pub struct TargetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JambSide {
    /// Отрицательная сторона span_axis
    Left,
    /// Положительная сторона span_axis
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallPart {
    Solid,
    Jamb(JambSide),
    Lintel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WallSegment {
    pub face: Face,
    pub part: WallPart,
    pub primitive: Primitive,
}

impl WallSegment {
    /// Протяжённость сегмента вдоль стены
    pub fn span(&self) -> f32 {
        self.primitive.size().dot(self.face.span_axis())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetPlacement {
    pub id: TargetId,
    pub primitive: Primitive,
}

/// Результат Room Builder
#[derive(Debug, Clone, PartialEq)]
pub struct RoomGeometry {
    pub id: String,
    pub center: Vec3,
    pub floor: Primitive,
    pub ceiling: Primitive,
    pub walls: Vec<WallSegment>,
    pub cover: Vec<Primitive>,
    pub targets: Vec<TargetPlacement>,
}

impl RoomGeometry {
    /// Все объёмы комнаты (пол, потолок, стены, cover, мишени)
    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        [&self.floor, &self.ceiling]
            .into_iter()
            .chain(self.walls.iter().map(|segment| &segment.primitive))
            .chain(self.cover.iter())
            .chain(self.targets.iter().map(|target| &target.primitive))
    }

    pub fn face_segments(&self, face: Face) -> impl Iterator<Item = &WallSegment> {
        self.walls.iter().filter(move |segment| segment.face == face)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Сдвигает ID мишеней (level-wide нумерация)
    pub(crate) fn renumber_targets(&mut self, first: u32) {
        for (slot, target) in self.targets.iter_mut().enumerate() {
            target.id = TargetId(first + slot as u32);
        }
    }
}

/// Сегменты одной стены
///
/// Закрытая стена - один slab на всю длину.
/// Открытая - два jamb'а по `(span - door_width) / 2`, центры на
/// `±(span + door_width) / 4` от оси проёма, плюс lintel шириной в дверь
/// от door_height до потолка (центр на `door_height / 2` выше центра комнаты).
pub fn wall_segments(
    room_id: &str,
    center: Vec3,
    face: Face,
    open: bool,
    dims: &RoomDimensions,
) -> Vec<WallSegment> {
    let span = face.span_length(dims);
    let span_axis = face.span_axis();
    let thickness_axis = face.outward().abs();
    let base = center + face.outward() * face.offset_length(dims);

    let slab_size = |length: f32, height: f32| {
        span_axis * length + thickness_axis * dims.wall_thickness + Vec3::Y * height
    };

    if !open {
        return vec![WallSegment {
            face,
            part: WallPart::Solid,
            primitive: Primitive::cuboid(
                format!("{}/wall_{}", room_id, face.name()),
                base,
                slab_size(span, dims.height),
                SurfaceRole::Wall,
            ),
        }];
    }

    let jamb_length = (span - dims.door_width) / 2.0;
    let jamb_shift = (span + dims.door_width) / 4.0;

    let jamb = |side: JambSide| {
        let (sign, suffix) = match side {
            JambSide::Left => (-1.0, "left"),
            JambSide::Right => (1.0, "right"),
        };
        WallSegment {
            face,
            part: WallPart::Jamb(side),
            primitive: Primitive::cuboid(
                format!("{}/wall_{}_{}", room_id, face.name(), suffix),
                base + span_axis * (sign * jamb_shift),
                slab_size(jamb_length, dims.height),
                SurfaceRole::Wall,
            ),
        }
    };

    let lintel = WallSegment {
        face,
        part: WallPart::Lintel,
        primitive: Primitive::cuboid(
            format!("{}/lintel_{}", room_id, face.name()),
            base + Vec3::Y * (dims.door_height / 2.0),
            slab_size(dims.door_width, dims.height - dims.door_height),
            SurfaceRole::Lintel,
        ),
    };

    vec![jamb(JambSide::Left), jamb(JambSide::Right), lintel]
}

/// Room Builder
///
/// Мишени нумеруются локально с 0; `build_level` перенумерует их сквозно.
/// Размеры не валидируются (см. `RoomDimensions`).
pub fn build_room(spec: &RoomSpec, dims: &RoomDimensions, target_dims: &TargetDimensions) -> RoomGeometry {
    let center = spec.position;
    let slab = Vec3::new(dims.width, dims.wall_thickness, dims.depth);

    let floor = Primitive::cuboid(
        format!("{}/floor", spec.id),
        center + Vec3::Y * dims.floor_offset(),
        slab,
        SurfaceRole::Floor,
    );
    let ceiling = Primitive::cuboid(
        format!("{}/ceiling", spec.id),
        center + Vec3::Y * (dims.height / 2.0),
        slab,
        SurfaceRole::Ceiling,
    );

    let walls = Face::ALL
        .into_iter()
        .flat_map(|face| wall_segments(&spec.id, center, face, spec.doors.is_open(face), dims))
        .collect();

    let cover = spec
        .cover
        .iter()
        .enumerate()
        .map(|(index, cover)| {
            let position = match spec.cover_anchor {
                CoverAnchor::Floor => {
                    center + Vec3::new(cover.offset.x, dims.floor_offset() + cover.size.y / 2.0, cover.offset.z)
                }
                CoverAnchor::Raw => center + cover.offset,
            };
            Primitive::cuboid(format!("{}/cover_{}", spec.id, index), position, cover.size, SurfaceRole::Cover)
        })
        .collect();

    let targets = spec
        .targets
        .iter()
        .enumerate()
        .map(|(slot, target)| TargetPlacement {
            id: TargetId(slot as u32),
            primitive: Primitive::cylinder(
                format!("{}/target_{}", spec.id, slot),
                center + target.offset,
                target_dims.radius,
                target_dims.height,
                SurfaceRole::Target,
            ),
        })
        .collect();

    RoomGeometry {
        id: spec.id.clone(),
        center,
        floor,
        ceiling,
        walls,
        cover,
        targets,
    }
}
