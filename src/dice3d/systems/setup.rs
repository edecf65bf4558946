//! Scene setup for the dice demo
//!
//! Spawns a camera, a light, a closed box for the dice to bounce around in,
//! and one die body per session slot.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::body::die_physics_bundle;
use crate::dice3d::plugin::DiceRoller;
use crate::dice3d::throw_control::calculate_dice_position;
use crate::dice3d::types::{DiceBox, DiceSettings, Die};

/// Edge length of a die
pub const DIE_SIZE: f32 = 0.4;

const BOX_HALF_WIDTH: f32 = 2.0;
const BOX_WALL_HEIGHT: f32 = 2.5;
const WALL_THICKNESS: f32 = 0.1;

/// Setup the 3D scene
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    roller: Res<DiceRoller>,
    settings: Res<DiceSettings>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 5.0, 4.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(5.0, 10.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Floor: top surface at y = 0
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(
            BOX_HALF_WIDTH * 2.0,
            0.3,
            BOX_HALF_WIDTH * 2.0,
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.15, 0.4, 0.15),
            ..default()
        })),
        Transform::from_xyz(0.0, -0.15, 0.0),
        Collider::cuboid(BOX_HALF_WIDTH, 0.15, BOX_HALF_WIDTH),
        RigidBody::Fixed,
        Restitution::coefficient(0.2),
        Friction::coefficient(0.8),
        DiceBox,
    ));

    // Invisible walls and ceiling so no throw leaves the box
    let half_height = BOX_WALL_HEIGHT / 2.0;
    let walls = [
        (
            Vec3::new(BOX_HALF_WIDTH, half_height, 0.0),
            Vec3::new(WALL_THICKNESS, half_height, BOX_HALF_WIDTH),
        ),
        (
            Vec3::new(-BOX_HALF_WIDTH, half_height, 0.0),
            Vec3::new(WALL_THICKNESS, half_height, BOX_HALF_WIDTH),
        ),
        (
            Vec3::new(0.0, half_height, BOX_HALF_WIDTH),
            Vec3::new(BOX_HALF_WIDTH, half_height, WALL_THICKNESS),
        ),
        (
            Vec3::new(0.0, half_height, -BOX_HALF_WIDTH),
            Vec3::new(BOX_HALF_WIDTH, half_height, WALL_THICKNESS),
        ),
        (
            Vec3::new(0.0, BOX_WALL_HEIGHT, 0.0),
            Vec3::new(BOX_HALF_WIDTH, WALL_THICKNESS, BOX_HALF_WIDTH),
        ),
    ];
    for (position, half_extents) in walls {
        commands.spawn((
            Transform::from_translation(position),
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
            RigidBody::Fixed,
            Restitution::coefficient(0.3),
            DiceBox,
        ));
    }

    let die_mesh = meshes.add(Cuboid::new(DIE_SIZE, DIE_SIZE, DIE_SIZE));
    let die_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.9, 0.9, 0.9),
        perceptual_roughness: 0.3,
        ..default()
    });

    let count = roller.dice_count();
    let base = Vec3::from_array(settings.throw.spawn_position);
    for index in 0..count {
        let mut position = calculate_dice_position(base, index, count, settings.spawn_spacing);
        position.y = DIE_SIZE / 2.0;
        spawn_die(
            &mut commands,
            die_mesh.clone(),
            die_material.clone(),
            index,
            position,
        );
    }
}

/// Spawn a single die entity with physics
pub fn spawn_die(
    commands: &mut Commands,
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
    index: usize,
    position: Vec3,
) -> Entity {
    commands
        .spawn((
            Mesh3d(mesh),
            MeshMaterial3d(material),
            Transform::from_translation(position),
            die_physics_bundle(DIE_SIZE / 2.0),
            Die { index },
        ))
        .id()
}
