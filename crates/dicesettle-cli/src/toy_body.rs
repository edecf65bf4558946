//! A tiny rigid-body integrator for headless rolls
//!
//! One cube per body, gravity, a floor at y = 0 and square walls. Dice do
//! not collide with each other. Good enough to drive the roll session
//! through throw, tumble and settle without a real physics engine.

use bevy::math::{Quat, Vec3};
use dicesettle::dice3d::DieBody;

const GRAVITY: f32 = 9.81;
const RESTITUTION: f32 = 0.3;
/// Bounces slower than this are absorbed
const REST_SPEED: f32 = 0.3;
/// Per-tick velocity kept while touching the floor
const CONTACT_LINEAR_KEEP: f32 = 0.9;
const CONTACT_ANGULAR_KEEP: f32 = 0.92;
const AIR_LINEAR_KEEP: f32 = 0.999;
const AIR_ANGULAR_KEEP: f32 = 0.995;
/// Strength of the torque tipping a grounded die onto its nearest face
const FLATTEN_GAIN: f32 = 8.0;
const SLEEP_SPEED: f32 = 0.01;

const LOCAL_AXES: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

#[derive(Clone, Debug)]
pub struct ToyDie {
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
    pub awake: bool,
    half_extent: f32,
    mass: f32,
    inertia: f32,
    box_half_width: f32,
    pending_impulse: Vec3,
    pending_torque: Vec3,
}

impl ToyDie {
    /// A resting cube of edge `size` and `density`, inside a square box
    /// of half width `box_half_width`.
    pub fn new(size: f32, density: f32, box_half_width: f32) -> Self {
        let mass = density * size * size * size;
        Self {
            position: Vec3::new(0.0, size / 2.0, 0.0),
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
            awake: false,
            half_extent: size / 2.0,
            mass,
            // Solid cube about any axis through its centre
            inertia: mass * size * size / 6.0,
            box_half_width,
            pending_impulse: Vec3::ZERO,
            pending_torque: Vec3::ZERO,
        }
    }

    /// Advance by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.linvel += self.pending_impulse / self.mass;
        self.angvel += self.pending_torque / self.inertia;
        self.pending_impulse = Vec3::ZERO;
        self.pending_torque = Vec3::ZERO;

        if !self.awake {
            return;
        }

        self.linvel.y -= GRAVITY * dt;
        self.position += self.linvel * dt;
        self.rotation = (Quat::from_scaled_axis(self.angvel * dt) * self.rotation).normalize();

        let grounded = self.resolve_floor();
        self.resolve_walls();

        if grounded {
            self.linvel.x *= CONTACT_LINEAR_KEEP;
            self.linvel.z *= CONTACT_LINEAR_KEEP;
            self.angvel += self.flatten_torque() * dt;
            self.angvel *= CONTACT_ANGULAR_KEEP;

            if self.linvel.length() < SLEEP_SPEED && self.angvel.length() < SLEEP_SPEED {
                self.linvel = Vec3::ZERO;
                self.angvel = Vec3::ZERO;
                self.awake = false;
            }
        } else {
            self.linvel *= AIR_LINEAR_KEEP;
            self.angvel *= AIR_ANGULAR_KEEP;
        }
    }

    /// Vertical reach of the cube below its centre
    fn reach_down(&self) -> f32 {
        let h = self.half_extent;
        [Vec3::X, Vec3::Y, Vec3::Z]
            .iter()
            .map(|axis| (self.rotation * *axis).y.abs() * h)
            .sum()
    }

    fn resolve_floor(&mut self) -> bool {
        let lowest = self.position.y - self.reach_down();
        if lowest > 0.0 {
            return false;
        }
        self.position.y -= lowest;
        if self.linvel.y < 0.0 {
            self.linvel.y = -self.linvel.y * RESTITUTION;
        }
        if self.linvel.y.abs() < REST_SPEED {
            self.linvel.y = 0.0;
        }
        true
    }

    fn resolve_walls(&mut self) {
        let limit = (self.box_half_width - self.half_extent).max(0.0);
        if self.position.x.abs() > limit {
            self.position.x = self.position.x.clamp(-limit, limit);
            self.linvel.x = -self.linvel.x * RESTITUTION;
        }
        if self.position.z.abs() > limit {
            self.position.z = self.position.z.clamp(-limit, limit);
            self.linvel.z = -self.linvel.z * RESTITUTION;
        }
    }

    /// Angular acceleration pulling the most upward face normal onto +Y
    fn flatten_torque(&self) -> Vec3 {
        let normal = LOCAL_AXES
            .iter()
            .map(|axis| self.rotation * *axis)
            .fold(Vec3::NEG_Y, |best, n| if n.y > best.y { n } else { best });
        normal.cross(Vec3::Y) * FLATTEN_GAIN
    }
}

impl DieBody for ToyDie {
    fn set_pose(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linvel = velocity;
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angvel = velocity;
    }

    fn wake(&mut self) {
        self.awake = true;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.pending_impulse += impulse;
    }

    fn apply_torque_impulse(&mut self, torque_impulse: Vec3) {
        self.pending_torque += torque_impulse;
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linvel
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angvel
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }
}
