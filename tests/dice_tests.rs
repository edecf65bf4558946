//! Tests for dice rolling functionality

use bevy::math::{Quat, Vec3};
use dicesettle::dice3d::{
    DiceSettings, DieBody, FaceResolver, FaceSpec, IgnoreReason, RecordOutcome, RollEvent,
    RollId, RollSession, SettleDetector, SettleKind, ThrowLauncher, ThrowParameters,
};
use std::f32::consts::{FRAC_PI_2, PI};

/// A body that tumbles for a fixed number of ticks, then lies still in
/// whatever orientation the test chose.
#[derive(Clone, Debug, Default)]
struct ScriptedBody {
    rotation: Quat,
    resting_rotation: Quat,
    tumble_ticks: u32,
    ticks: u32,
    launched_with: Option<(Vec3, Vec3)>,
}

impl ScriptedBody {
    fn landing(resting_rotation: Quat, tumble_ticks: u32) -> Self {
        Self {
            resting_rotation,
            tumble_ticks,
            ..Default::default()
        }
    }

    fn step(&mut self) {
        self.ticks += 1;
        if self.ticks >= self.tumble_ticks {
            self.rotation = self.resting_rotation;
        }
    }

    fn moving(&self) -> bool {
        self.ticks < self.tumble_ticks
    }
}

impl DieBody for ScriptedBody {
    fn set_pose(&mut self, _position: Vec3, rotation: Quat) {
        self.rotation = rotation;
        self.ticks = 0;
    }
    fn set_linear_velocity(&mut self, _velocity: Vec3) {}
    fn set_angular_velocity(&mut self, _velocity: Vec3) {}
    fn wake(&mut self) {}
    fn apply_impulse(&mut self, impulse: Vec3) {
        let torque = self.launched_with.map(|(_, t)| t).unwrap_or(Vec3::ZERO);
        self.launched_with = Some((impulse, torque));
    }
    fn apply_torque_impulse(&mut self, torque_impulse: Vec3) {
        let impulse = self.launched_with.map(|(i, _)| i).unwrap_or(Vec3::ZERO);
        self.launched_with = Some((impulse, torque_impulse));
    }
    fn linear_velocity(&self) -> Vec3 {
        if self.moving() {
            Vec3::new(1.0, -0.5, 0.0)
        } else {
            Vec3::ZERO
        }
    }
    fn angular_velocity(&self) -> Vec3 {
        if self.moving() {
            Vec3::new(0.0, 3.0, 1.0)
        } else {
            Vec3::ZERO
        }
    }
    fn rotation(&self) -> Quat {
        self.rotation
    }
}

fn session(count: usize, seed: u64) -> RollSession {
    RollSession::new(
        count,
        FaceResolver::new(FaceSpec::standard_d6()),
        ThrowLauncher::seeded(ThrowParameters::default(), seed),
        SettleDetector::default(),
    )
}

fn step_all(bodies: &mut [Option<ScriptedBody>]) {
    for body in bodies.iter_mut().flatten() {
        body.step();
    }
}

fn completions(events: &[RollEvent]) -> Vec<Vec<u32>> {
    events
        .iter()
        .filter_map(|event| match event {
            RollEvent::RollComplete { values, .. } => Some(values.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_three_dice_roll_to_completion() {
    let mut s = session(3, 1);
    let mut bodies = vec![
        Some(ScriptedBody::landing(Quat::from_rotation_x(-FRAC_PI_2), 40)),
        Some(ScriptedBody::landing(Quat::from_rotation_x(FRAC_PI_2), 12)),
        Some(ScriptedBody::landing(Quat::IDENTITY, 25)),
    ];

    let roll = s.start_roll(&mut bodies);
    assert_eq!(roll, RollId(1));
    assert!(s.is_rolling());

    let mut events = Vec::new();
    for _ in 0..100 {
        step_all(&mut bodies);
        events.extend(s.tick(&bodies));
    }

    // Dice settle in landing order, values stay in die order
    let settled: Vec<(usize, u32)> = events
        .iter()
        .filter_map(|event| match event {
            RollEvent::DieSettled { die, value, .. } => Some((*die, *value)),
            _ => None,
        })
        .collect();
    assert_eq!(settled, vec![(1, 5), (2, 6), (0, 2)]);
    assert_eq!(completions(&events), vec![vec![2, 5, 6]]);
    assert_eq!(s.final_values(), Some(&[2, 5, 6][..]));
    assert!(!s.is_rolling());
}

#[test]
fn test_two_of_three_settled_is_not_complete() {
    let mut s = session(3, 2);
    let mut bodies = vec![
        Some(ScriptedBody::landing(Quat::IDENTITY, 3)),
        Some(ScriptedBody::landing(Quat::from_rotation_x(PI), 3)),
        Some(ScriptedBody::landing(Quat::IDENTITY, u32::MAX)),
    ];
    s.start_roll(&mut bodies);

    let mut events = Vec::new();
    for _ in 0..50 {
        step_all(&mut bodies);
        events.extend(s.tick(&bodies));
    }

    assert!(completions(&events).is_empty());
    assert_eq!(s.pending_values(), &[Some(6), Some(1), None]);
    assert!(s.final_values().is_none());
    assert!(s.is_rolling());
}

#[test]
fn test_restart_mid_roll_discards_old_results() {
    let mut s = session(2, 3);
    let mut bodies = vec![
        Some(ScriptedBody::landing(Quat::IDENTITY, 5)),
        Some(ScriptedBody::landing(Quat::IDENTITY, 30)),
    ];
    let first = s.start_roll(&mut bodies);
    for _ in 0..10 {
        step_all(&mut bodies);
        s.tick(&bodies);
    }
    assert_eq!(s.pending_values(), &[Some(6), None]);

    // Second throw lands on different faces
    for (body, rotation) in bodies
        .iter_mut()
        .zip([Quat::from_rotation_z(FRAC_PI_2), Quat::from_rotation_z(-FRAC_PI_2)])
    {
        if let Some(body) = body.as_mut() {
            body.resting_rotation = rotation;
        }
    }
    let second = s.start_roll(&mut bodies);
    assert_ne!(first, second);
    assert_eq!(s.pending_values(), &[None, None]);

    // A late report from the abandoned roll goes nowhere
    assert_eq!(
        s.record_result_for(first, 1, 6),
        RecordOutcome::Ignored(IgnoreReason::StaleRoll)
    );

    let mut events = Vec::new();
    for _ in 0..60 {
        step_all(&mut bodies);
        events.extend(s.tick(&bodies));
    }
    assert_eq!(completions(&events), vec![vec![3, 4]]);
    assert!(events.iter().all(|event| match event {
        RollEvent::DieSettled { roll, .. } | RollEvent::RollComplete { roll, .. } =>
            *roll == second,
    }));
}

#[test]
fn test_completion_fires_once_per_roll() {
    let mut s = session(2, 4);
    let mut bodies = vec![
        Some(ScriptedBody::landing(Quat::IDENTITY, 2)),
        Some(ScriptedBody::landing(Quat::IDENTITY, 2)),
    ];

    let mut total_completions = 0;
    for _ in 0..3 {
        s.start_roll(&mut bodies);
        for _ in 0..20 {
            step_all(&mut bodies);
            total_completions += completions(&s.tick(&bodies)).len();
        }
        // Extra reports after completion change nothing
        assert_eq!(
            s.record_result(0, 1),
            RecordOutcome::Ignored(IgnoreReason::NotRolling)
        );
        assert_eq!(s.final_values(), Some(&[6, 6][..]));
    }
    assert_eq!(total_completions, 3);
}

#[test]
fn test_die_that_never_rests_times_out() {
    let mut s = RollSession::new(
        1,
        FaceResolver::default(),
        ThrowLauncher::seeded(ThrowParameters::default(), 5),
        SettleDetector {
            max_rolling_ticks: Some(30),
            ..Default::default()
        },
    );
    let mut bodies = vec![Some(ScriptedBody::landing(Quat::IDENTITY, u32::MAX))];
    s.start_roll(&mut bodies);

    let mut events = Vec::new();
    for _ in 0..29 {
        step_all(&mut bodies);
        events.extend(s.tick(&bodies));
    }
    assert!(events.is_empty());

    step_all(&mut bodies);
    let events = s.tick(&bodies);
    assert!(matches!(
        events.first(),
        Some(RollEvent::DieSettled {
            kind: SettleKind::TimedOut,
            ..
        })
    ));
    assert_eq!(completions(&events).len(), 1);
}

#[test]
fn test_same_seed_same_throws() {
    let throw = |seed| {
        let mut s = session(3, seed);
        let mut bodies: Vec<Option<ScriptedBody>> =
            (0..3).map(|_| Some(ScriptedBody::default())).collect();
        s.start_roll(&mut bodies);
        bodies
            .into_iter()
            .map(|body| body.and_then(|b| b.launched_with))
            .collect::<Vec<_>>()
    };

    assert_eq!(throw(42), throw(42));
    assert_ne!(throw(42), throw(43));
}

#[test]
fn test_settings_build_a_working_session() {
    let settings = DiceSettings::from_ron_str("(dice_count: 2, seed: Some(8))").unwrap();
    let mut s = RollSession::from_settings(&settings).unwrap();
    assert_eq!(s.dice_count(), 2);

    let mut bodies = vec![
        Some(ScriptedBody::landing(Quat::from_rotation_x(PI), 1)),
        Some(ScriptedBody::landing(Quat::from_rotation_z(FRAC_PI_2), 1)),
    ];
    s.start_roll(&mut bodies);
    step_all(&mut bodies);
    let events = s.tick(&bodies);
    assert_eq!(completions(&events), vec![vec![1, 3]]);
}
