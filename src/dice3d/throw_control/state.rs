//! Throw Control State
//!
//! Throw parameters and the launcher that turns them into a randomized
//! pose plus linear/torque impulses for one die.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::dice3d::body::DieBody;

/// How the launcher picks a starting rotation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationSampling {
    /// Three independent angles in [0, 2π) composed as XYZ Euler angles.
    /// Not uniform over all rotations, which looks fine on screen.
    #[default]
    Euler,
    /// Uniformly distributed unit quaternion.
    Uniform,
}

/// Per-throw tuning. Immutable once a session is built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrowParameters {
    /// Centre of the spawn area
    pub spawn_position: Vec3,
    /// Full width of the horizontal impulse range, centred on zero
    pub linear_impulse_range: f32,
    /// Lower bound of the upward impulse; the upper bound is this plus 1.0
    pub vertical_impulse_bias: f32,
    /// Full width of each torque impulse axis range, centred on zero
    pub torque_impulse_range: f32,
}

impl Default for ThrowParameters {
    fn default() -> Self {
        Self {
            spawn_position: Vec3::new(0.0, 1.0, 0.0),
            linear_impulse_range: 1.0,
            vertical_impulse_bias: 0.5,
            torque_impulse_range: 0.5,
        }
    }
}

impl ThrowParameters {
    /// Check the values before any RNG range is built from them.
    ///
    /// Every field must be finite, the ranges non-negative and the
    /// vertical bias positive so every throw leaves the floor.
    pub fn validate(&self) -> Result<(), String> {
        if !self.spawn_position.is_finite() {
            return Err(format!(
                "spawn_position must be finite, got {}",
                self.spawn_position
            ));
        }
        let ranges = [
            ("linear_impulse_range", self.linear_impulse_range),
            ("torque_impulse_range", self.torque_impulse_range),
        ];
        for (name, value) in ranges {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                ));
            }
        }
        if !self.vertical_impulse_bias.is_finite() || self.vertical_impulse_bias <= 0.0 {
            return Err(format!(
                "vertical_impulse_bias must be finite and positive, got {}",
                self.vertical_impulse_bias
            ));
        }
        Ok(())
    }
}

/// Everything one launch decided, handy for logging and tests
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrowPlan {
    pub position: Vec3,
    pub rotation: Quat,
    pub impulse: Vec3,
    pub torque_impulse: Vec3,
}

/// Produces randomized throws and applies them to bodies
#[derive(Clone, Debug)]
pub struct ThrowLauncher<R: Rng = StdRng> {
    params: ThrowParameters,
    sampling: RotationSampling,
    rng: R,
}

impl ThrowLauncher<StdRng> {
    /// Launcher with an entropy-seeded RNG
    pub fn from_entropy(params: ThrowParameters) -> Self {
        Self::new(params, StdRng::from_entropy())
    }

    /// Launcher whose throws repeat exactly for the same seed
    pub fn seeded(params: ThrowParameters, seed: u64) -> Self {
        Self::new(params, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ThrowLauncher<R> {
    pub fn new(params: ThrowParameters, rng: R) -> Self {
        Self {
            params,
            sampling: RotationSampling::default(),
            rng,
        }
    }

    pub fn with_sampling(mut self, sampling: RotationSampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn params(&self) -> &ThrowParameters {
        &self.params
    }

    /// Draw a throw starting from `spawn`.
    pub fn plan(&mut self, spawn: Vec3) -> ThrowPlan {
        let rotation = self.random_rotation();

        let half_linear = self.params.linear_impulse_range / 2.0;
        let bias = self.params.vertical_impulse_bias;
        let impulse = Vec3::new(
            symmetric(&mut self.rng, half_linear),
            self.rng.gen_range(bias..=bias + 1.0),
            symmetric(&mut self.rng, half_linear),
        );

        let half_torque = self.params.torque_impulse_range / 2.0;
        let torque_impulse = Vec3::new(
            symmetric(&mut self.rng, half_torque),
            symmetric(&mut self.rng, half_torque),
            symmetric(&mut self.rng, half_torque),
        );

        ThrowPlan {
            position: spawn,
            rotation,
            impulse,
            torque_impulse,
        }
    }

    /// Throw `body` from `spawn`: teleport at rest, randomize rotation,
    /// wake it, then kick it with one impulse and one torque impulse.
    pub fn launch<B: DieBody + ?Sized>(&mut self, body: &mut B, spawn: Vec3) -> ThrowPlan {
        let plan = self.plan(spawn);

        body.set_pose(plan.position, plan.rotation);
        body.set_linear_velocity(Vec3::ZERO);
        body.set_angular_velocity(Vec3::ZERO);
        body.wake();
        body.apply_impulse(plan.impulse);
        body.apply_torque_impulse(plan.torque_impulse);

        plan
    }

    fn random_rotation(&mut self) -> Quat {
        match self.sampling {
            RotationSampling::Euler => Quat::from_euler(
                EulerRot::XYZ,
                self.rng.gen_range(0.0..TAU),
                self.rng.gen_range(0.0..TAU),
                self.rng.gen_range(0.0..TAU),
            ),
            RotationSampling::Uniform => {
                // Shoemake's subgroup algorithm
                let u1: f32 = self.rng.gen_range(0.0..1.0);
                let u2: f32 = self.rng.gen_range(0.0..TAU);
                let u3: f32 = self.rng.gen_range(0.0..TAU);
                let a = (1.0 - u1).sqrt();
                let b = u1.sqrt();
                Quat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos())
                    .normalize()
            }
        }
    }
}

/// Uniform sample in [-half, +half]; zero when the range is empty.
fn symmetric(rng: &mut impl Rng, half: f32) -> f32 {
    if half > 0.0 {
        rng.gen_range(-half..=half)
    } else {
        0.0
    }
}

/// Spawn point for die `index` of `total`, laid out on a square grid
/// centred on `base` so dice don't start inside each other.
pub fn calculate_dice_position(base: Vec3, index: usize, total: usize, spacing: f32) -> Vec3 {
    let total = total.max(1);
    let cols = ((total as f32).sqrt().ceil() as usize).max(1);
    let rows = total.div_ceil(cols);
    let row = index / cols;
    let col = index % cols;

    let start_x = -((cols - 1) as f32 * spacing) / 2.0;
    let start_z = -((rows - 1) as f32 * spacing) / 2.0;

    base + Vec3::new(
        start_x + col as f32 * spacing,
        0.0,
        start_z + row as f32 * spacing,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingBody {
        position: Vec3,
        rotation: Quat,
        linvel: Vec3,
        angvel: Vec3,
        awake: bool,
        impulses: Vec<Vec3>,
        torques: Vec<Vec3>,
    }

    impl DieBody for RecordingBody {
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
            self.impulses.push(impulse);
        }
        fn apply_torque_impulse(&mut self, torque_impulse: Vec3) {
            self.torques.push(torque_impulse);
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

    fn params() -> ThrowParameters {
        ThrowParameters {
            spawn_position: Vec3::new(0.0, 1.0, 0.0),
            linear_impulse_range: 3.0,
            vertical_impulse_bias: 2.5,
            torque_impulse_range: 4.0,
        }
    }

    #[test]
    fn test_launch_resets_and_kicks_body() {
        let mut launcher = ThrowLauncher::seeded(params(), 7);
        let mut body = RecordingBody {
            linvel: Vec3::new(4.0, -2.0, 1.0),
            angvel: Vec3::splat(3.0),
            ..Default::default()
        };

        let spawn = Vec3::new(0.5, 1.2, -0.5);
        let plan = launcher.launch(&mut body, spawn);

        assert_eq!(body.position, spawn);
        assert_eq!(body.rotation, plan.rotation);
        assert_eq!(body.linvel, Vec3::ZERO);
        assert_eq!(body.angvel, Vec3::ZERO);
        assert!(body.awake);
        assert_eq!(body.impulses, vec![plan.impulse]);
        assert_eq!(body.torques, vec![plan.torque_impulse]);
    }

    #[test]
    fn test_impulses_stay_in_range() {
        let p = params();
        let mut launcher = ThrowLauncher::seeded(p, 99);
        for _ in 0..500 {
            let plan = launcher.plan(p.spawn_position);
            assert!(plan.impulse.x.abs() <= p.linear_impulse_range / 2.0);
            assert!(plan.impulse.z.abs() <= p.linear_impulse_range / 2.0);
            assert!(plan.impulse.y >= p.vertical_impulse_bias);
            assert!(plan.impulse.y <= p.vertical_impulse_bias + 1.0);
            assert!(plan.impulse.y > 0.0);
            for axis in plan.torque_impulse.to_array() {
                assert!(axis.abs() <= p.torque_impulse_range / 2.0);
            }
            assert!((plan.rotation.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_same_seed_same_throws() {
        let mut a = ThrowLauncher::seeded(params(), 1234);
        let mut b = ThrowLauncher::seeded(params(), 1234);
        for _ in 0..10 {
            assert_eq!(a.plan(Vec3::ZERO), b.plan(Vec3::ZERO));
        }
    }

    #[test]
    fn test_consecutive_throws_differ() {
        let mut launcher = ThrowLauncher::seeded(params(), 5);
        let first = launcher.plan(Vec3::ZERO);
        let second = launcher.plan(Vec3::ZERO);
        assert_ne!(first, second);
    }

    #[test]
    fn test_zero_ranges_give_pure_lift() {
        let p = ThrowParameters {
            linear_impulse_range: 0.0,
            torque_impulse_range: 0.0,
            ..params()
        };
        let mut launcher = ThrowLauncher::seeded(p, 3);
        let plan = launcher.plan(Vec3::ZERO);
        assert_eq!(plan.impulse.x, 0.0);
        assert_eq!(plan.impulse.z, 0.0);
        assert!(plan.impulse.y >= p.vertical_impulse_bias);
        assert_eq!(plan.torque_impulse, Vec3::ZERO);
    }

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(ThrowParameters::default().validate().is_ok());
        assert!(params().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let nan_bias = ThrowParameters {
            vertical_impulse_bias: f32::NAN,
            ..params()
        };
        assert!(nan_bias.validate().unwrap_err().contains("vertical_impulse_bias"));

        let inf_range = ThrowParameters {
            linear_impulse_range: f32::INFINITY,
            ..params()
        };
        assert!(inf_range.validate().unwrap_err().contains("linear_impulse_range"));

        let nan_torque = ThrowParameters {
            torque_impulse_range: f32::NAN,
            ..params()
        };
        assert!(nan_torque.validate().is_err());

        let bad_spawn = ThrowParameters {
            spawn_position: Vec3::new(0.0, f32::INFINITY, 0.0),
            ..params()
        };
        assert!(bad_spawn.validate().unwrap_err().contains("spawn_position"));
    }

    #[test]
    fn test_validate_rejects_non_positive_bias() {
        for bias in [-3.0, 0.0] {
            let p = ThrowParameters {
                vertical_impulse_bias: bias,
                ..params()
            };
            assert!(p.validate().is_err(), "bias {bias} accepted");
        }
    }

    #[test]
    fn test_validate_rejects_negative_ranges() {
        let p = ThrowParameters {
            torque_impulse_range: -1.0,
            ..params()
        };
        assert!(p.validate().unwrap_err().contains("torque_impulse_range"));
    }

    #[test]
    fn test_uniform_sampling_gives_unit_quaternions() {
        let mut launcher =
            ThrowLauncher::seeded(params(), 42).with_sampling(RotationSampling::Uniform);
        for _ in 0..200 {
            let plan = launcher.plan(Vec3::ZERO);
            assert!((plan.rotation.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_calculate_dice_position_single_die_is_base() {
        let base = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(calculate_dice_position(base, 0, 1, 0.6), base);
    }

    #[test]
    fn test_calculate_dice_position_grid_is_centred() {
        let base = Vec3::new(0.0, 1.0, 0.0);
        let positions: Vec<Vec3> = (0..4)
            .map(|i| calculate_dice_position(base, i, 4, 1.0))
            .collect();
        assert_eq!(positions[0], Vec3::new(-0.5, 1.0, -0.5));
        assert_eq!(positions[3], Vec3::new(0.5, 1.0, 0.5));
        let centroid = positions.iter().copied().sum::<Vec3>() / 4.0;
        assert!(centroid.abs_diff_eq(base, 1e-6));
    }
}
