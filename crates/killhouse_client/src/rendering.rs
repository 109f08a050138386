use bevy::prelude::*;
use killhouse_simulation::config::RangeConfig;
use killhouse_simulation::effects::{EffectKind, Ephemeral};
use killhouse_simulation::geometry::{PrimitiveShape, SurfaceRole};
use killhouse_simulation::level::{LevelSurface, SurfaceShape};

pub struct RenderingSyncPlugin;

impl Plugin for RenderingSyncPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_palette)
            .add_systems(Update, (spawn_surface_visuals, spawn_effect_visuals));
    }
}

/// Общие материалы (по одному на роль), чтобы не плодить assets на каждый slab
#[derive(Resource)]
pub struct Palette {
    floor: Handle<StandardMaterial>,
    ceiling: Handle<StandardMaterial>,
    wall: Handle<StandardMaterial>,
    cover: Handle<StandardMaterial>,
    target: Handle<StandardMaterial>,
    flash: Handle<StandardMaterial>,
    decal: Handle<StandardMaterial>,
    flash_mesh: Handle<Mesh>,
    decal_mesh: Handle<Mesh>,
}

impl Palette {
    fn surface(&self, role: SurfaceRole) -> Handle<StandardMaterial> {
        match role {
            SurfaceRole::Floor => self.floor.clone(),
            SurfaceRole::Ceiling => self.ceiling.clone(),
            SurfaceRole::Wall | SurfaceRole::Lintel => self.wall.clone(),
            SurfaceRole::Cover => self.cover.clone(),
            SurfaceRole::Target => self.target.clone(),
        }
    }
}

fn setup_palette(
    mut commands: Commands,
    config: Res<RangeConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let flat = |materials: &mut Assets<StandardMaterial>, color: Color| {
        materials.add(StandardMaterial {
            base_color: color,
            perceptual_roughness: 0.9,
            ..default()
        })
    };

    let palette = Palette {
        floor: flat(&mut materials, Color::srgb(0.35, 0.35, 0.35)),
        ceiling: flat(&mut materials, Color::srgb(0.6, 0.6, 0.6)),
        wall: flat(&mut materials, Color::srgb(0.75, 0.72, 0.68)),
        cover: flat(&mut materials, Color::srgb(0.45, 0.3, 0.15)),
        target: flat(&mut materials, Color::srgb(0.85, 0.15, 0.1)),
        flash: materials.add(StandardMaterial {
            base_color: Color::srgb(1.0, 0.85, 0.3),
            emissive: LinearRgba::rgb(8.0, 6.0, 1.5),
            unlit: true,
            ..default()
        }),
        decal: materials.add(StandardMaterial {
            base_color: Color::srgb(0.02, 0.02, 0.02),
            unlit: true,
            ..default()
        }),
        flash_mesh: meshes.add(Sphere::new(0.06)),
        decal_mesh: meshes.add(Rectangle::new(config.effects.decal_size, config.effects.decal_size)),
    };

    commands.insert_resource(palette);
}

fn surface_mesh(shape: PrimitiveShape) -> Mesh {
    match shape {
        PrimitiveShape::Cuboid { size } => Cuboid::new(size.x, size.y, size.z).into(),
        PrimitiveShape::Cylinder { radius, height } => Cylinder::new(radius, height).into(),
    }
}

/// Меш на каждую новую поверхность уровня (entity та же, что и collider)
fn spawn_surface_visuals(
    mut commands: Commands,
    palette: Option<Res<Palette>>,
    query: Query<(Entity, &LevelSurface, &SurfaceShape), Added<SurfaceShape>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Some(palette) = palette else {
        return;
    };

    for (entity, surface, shape) in query.iter() {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(surface_mesh(shape.0))),
            MeshMaterial3d(palette.surface(surface.role)),
        ));
    }
}

/// Flash / decal визуал (despawn делает effects scheduler)
fn spawn_effect_visuals(
    mut commands: Commands,
    palette: Option<Res<Palette>>,
    query: Query<(Entity, &Ephemeral), Added<Ephemeral>>,
) {
    let Some(palette) = palette else {
        return;
    };

    for (entity, effect) in query.iter() {
        let (mesh, material) = match effect.kind {
            EffectKind::MuzzleFlash => (palette.flash_mesh.clone(), palette.flash.clone()),
            EffectKind::ImpactDecal => (palette.decal_mesh.clone(), palette.decal.clone()),
        };
        commands.entity(entity).insert((Mesh3d(mesh), MeshMaterial3d(material)));
    }
}
