//! Collision groups - централизованные константы для rapier
//!
//! ## Группы:
//! - GROUP_1: Structure (пол, потолок, стены, lintel)
//! - GROUP_2: Cover (укрытия)
//! - GROUP_3: Targets (мишени)
//! - GROUP_4: Player (kinematic capsule)
//!
//! Hit-scan луч видит только геометрию уровня (structure + cover + targets),
//! игрок в маску луча не входит - луч стартует внутри его капсулы.

use bevy_rapier3d::prelude::*;

use crate::geometry::SurfaceRole;

pub const GROUP_STRUCTURE: Group = Group::GROUP_1;
pub const GROUP_COVER: Group = Group::GROUP_2;
pub const GROUP_TARGETS: Group = Group::GROUP_3;
pub const GROUP_PLAYER: Group = Group::GROUP_4;

/// Всё, во что может попасть выстрел
pub const SHOT_MASK: Group = GROUP_STRUCTURE.union(GROUP_COVER).union(GROUP_TARGETS);

/// Группа для поверхности уровня по её роли
pub fn surface_group(role: SurfaceRole) -> Group {
    match role {
        SurfaceRole::Floor | SurfaceRole::Ceiling | SurfaceRole::Wall | SurfaceRole::Lintel => {
            GROUP_STRUCTURE
        }
        SurfaceRole::Cover => GROUP_COVER,
        SurfaceRole::Target => GROUP_TARGETS,
    }
}

/// Level surfaces коллайдят со всем
pub fn surface_groups(role: SurfaceRole) -> CollisionGroups {
    CollisionGroups::new(surface_group(role), Group::ALL)
}

/// Игрок коллайдит только с геометрией уровня
pub fn player_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PLAYER, SHOT_MASK)
}

/// Фильтр для hit-scan raycast
pub fn shot_groups() -> CollisionGroups {
    CollisionGroups::new(Group::ALL, SHOT_MASK)
}

/// Проверка луча для headless backend (та же логика, что у rapier:
/// memberships поверхности ∩ filters луча)
pub fn shot_can_hit(groups: &CollisionGroups) -> bool {
    groups.memberships.intersects(SHOT_MASK) && groups.filters.intersects(Group::ALL)
}

/// Название группы для debug логов
pub fn group_name(group: Group) -> &'static str {
    if group == GROUP_STRUCTURE {
        "Structure"
    } else if group == GROUP_COVER {
        "Cover"
    } else if group == GROUP_TARGETS {
        "Targets"
    } else if group == GROUP_PLAYER {
        "Player"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shot_mask_excludes_player() {
        assert!(!SHOT_MASK.intersects(GROUP_PLAYER));
        assert!(!shot_can_hit(&player_groups()));
    }

    #[test]
    fn test_every_surface_is_shootable() {
        for role in [
            SurfaceRole::Floor,
            SurfaceRole::Ceiling,
            SurfaceRole::Wall,
            SurfaceRole::Lintel,
            SurfaceRole::Cover,
            SurfaceRole::Target,
        ] {
            assert!(shot_can_hit(&surface_groups(role)), "{:?} not shootable", role);
        }
    }

    #[test]
    fn test_group_names() {
        assert_eq!(group_name(surface_group(SurfaceRole::Target)), "Targets");
        assert_eq!(group_name(surface_group(SurfaceRole::Lintel)), "Structure");
    }
}
