//! Rigid-body handle abstraction
//!
//! The core never talks to a physics engine directly. It drives dice
//! through `DieBody`, which the Rapier adapter below (and any other
//! integrator, including test doubles) implements.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::dice3d::types::Die;

/// The operations the throw and settle logic need from a simulated body
pub trait DieBody {
    /// Teleport the body. Must not leave a half-updated pose visible to
    /// the integrator.
    fn set_pose(&mut self, position: Vec3, rotation: Quat);
    fn set_linear_velocity(&mut self, velocity: Vec3);
    fn set_angular_velocity(&mut self, velocity: Vec3);
    /// Force a sleeping body back into the simulation.
    fn wake(&mut self);
    fn apply_impulse(&mut self, impulse: Vec3);
    fn apply_torque_impulse(&mut self, torque_impulse: Vec3);

    fn linear_velocity(&self) -> Vec3;
    fn angular_velocity(&self) -> Vec3;
    fn rotation(&self) -> Quat;
}

/// A die entity as seen through bevy_rapier3d components.
///
/// All writes land on ECS components before Rapier's backend sync, so a
/// teleport plus impulse issued in the same frame reaches the physics
/// step as a single update.
pub struct RapierDieBody<'a> {
    pub transform: Mut<'a, Transform>,
    pub velocity: Mut<'a, Velocity>,
    pub impulse: Mut<'a, ExternalImpulse>,
    pub sleeping: Mut<'a, Sleeping>,
}

impl DieBody for RapierDieBody<'_> {
    fn set_pose(&mut self, position: Vec3, rotation: Quat) {
        self.transform.translation = position;
        self.transform.rotation = rotation;
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.velocity.linvel = velocity;
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.velocity.angvel = velocity;
    }

    fn wake(&mut self) {
        self.sleeping.sleeping = false;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.impulse.impulse += impulse;
    }

    fn apply_torque_impulse(&mut self, torque_impulse: Vec3) {
        self.impulse.torque_impulse += torque_impulse;
    }

    fn linear_velocity(&self) -> Vec3 {
        self.velocity.linvel
    }

    fn angular_velocity(&self) -> Vec3 {
        self.velocity.angvel
    }

    fn rotation(&self) -> Quat {
        self.transform.rotation
    }
}

/// Physics components every die entity needs for `RapierDieBody` to find it
pub fn die_physics_bundle(half_extent: f32) -> impl Bundle {
    (
        RigidBody::Dynamic,
        Collider::cuboid(half_extent, half_extent, half_extent),
        Velocity::zero(),
        ExternalImpulse::default(),
        Sleeping::default(),
        Restitution::coefficient(0.15),
        Friction::coefficient(0.7),
        ColliderMassProperties::Density(1.5),
    )
}

/// Query over every die entity with the components `RapierDieBody` wraps
pub type DieBodyQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static Die,
        &'static mut Transform,
        &'static mut Velocity,
        &'static mut ExternalImpulse,
        &'static mut Sleeping,
    ),
>;

/// Gather die bodies into slots indexed by `Die::index`.
///
/// Slots with no matching entity stay `None` (not ready yet); entities
/// whose index is out of range are left out.
pub fn collect_die_bodies<'a>(
    query: &'a mut DieBodyQuery<'_, '_>,
    count: usize,
) -> Vec<Option<RapierDieBody<'a>>> {
    let mut bodies: Vec<Option<RapierDieBody<'a>>> = (0..count).map(|_| None).collect();
    for (die, transform, velocity, impulse, sleeping) in query.iter_mut() {
        if let Some(slot) = bodies.get_mut(die.index) {
            *slot = Some(RapierDieBody {
                transform,
                velocity,
                impulse,
                sleeping,
            });
        }
    }
    bodies
}
