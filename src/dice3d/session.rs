//! Roll session
//!
//! Coordinates N dice through one roll cycle: launches every die, polls
//! them each tick, resolves faces and fires a single completion once all
//! dice have reported.

use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::Rng;

use crate::dice3d::body::DieBody;
use crate::dice3d::face::FaceResolver;
use crate::dice3d::systems::dice::{SettleDetector, SettleKind};
use crate::dice3d::throw_control::{calculate_dice_position, ThrowLauncher, ThrowParameters};
use crate::dice3d::types::{DiceSettings, DieState, DEFAULT_DICE_COUNT, DEFAULT_SPAWN_SPACING};

/// Identifies one roll cycle. Bumped by every `start_roll`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RollId(pub u64);

/// Something that happened during a tick or a recorded result
#[derive(Clone, Debug, PartialEq)]
pub enum RollEvent {
    DieSettled {
        roll: RollId,
        die: usize,
        value: u32,
        kind: SettleKind,
    },
    RollComplete {
        roll: RollId,
        values: Vec<u32>,
        /// Result of the completion predicate, if one is installed
        predicate: Option<bool>,
    },
}

/// Why a result was not recorded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The result belongs to an abandoned roll cycle
    StaleRoll,
    /// No die with that index in this session
    UnknownDie,
    /// The die already reported in this cycle (or was never launched)
    NotRolling,
}

/// What `record_result` did with a value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Accepted,
    /// Accepted, and it was the last die the roll was waiting on
    Completed,
    Ignored(IgnoreReason),
}

/// Callbacks for the presentation layer
pub trait RollObserver: Send + Sync {
    fn on_die_settled(&mut self, _die: usize, _value: u32) {}
    fn on_roll_complete(&mut self, _values: &[u32]) {}
}

/// Checked once per completed roll, e.g. "doubles" or "sum equals 7"
pub type CompletionPredicate = Box<dyn Fn(&[u32]) -> bool + Send + Sync>;

pub struct RollSession<R: Rng = StdRng> {
    dice: Vec<DieState>,
    pending_values: Vec<Option<u32>>,
    final_values: Option<Vec<u32>>,
    predicate_met: Option<bool>,
    roll: RollId,
    launcher: ThrowLauncher<R>,
    detector: SettleDetector,
    resolver: FaceResolver,
    spawn_spacing: f32,
    observers: Vec<Box<dyn RollObserver>>,
    predicate: Option<CompletionPredicate>,
    events: Vec<RollEvent>,
}

impl Default for RollSession<StdRng> {
    fn default() -> Self {
        Self::new(
            DEFAULT_DICE_COUNT,
            FaceResolver::default(),
            ThrowLauncher::from_entropy(ThrowParameters::default()),
            SettleDetector::default(),
        )
    }
}

impl RollSession<StdRng> {
    /// Build a session from loaded settings. Fails on an invalid face
    /// table or an empty dice count.
    pub fn from_settings(settings: &DiceSettings) -> Result<Self, String> {
        if settings.dice_count == 0 {
            return Err("dice_count must be at least 1".to_string());
        }
        let faces = settings.face_spec()?;
        let params = settings.throw.to_runtime();
        params
            .validate()
            .map_err(|e| format!("Invalid throw settings: {}", e))?;
        let launcher = match settings.seed {
            Some(seed) => ThrowLauncher::seeded(params, seed),
            None => ThrowLauncher::from_entropy(params),
        }
        .with_sampling(settings.rotation_sampling);

        Ok(Self::new(
            settings.dice_count,
            FaceResolver::new(faces),
            launcher,
            settings.settle.to_runtime(),
        )
        .with_spawn_spacing(settings.spawn_spacing))
    }
}

impl<R: Rng> RollSession<R> {
    /// # Panics
    ///
    /// Panics if `dice_count` is zero; such a session could never complete.
    /// [`RollSession::from_settings`] reports that case as an error instead.
    pub fn new(
        dice_count: usize,
        resolver: FaceResolver,
        launcher: ThrowLauncher<R>,
        detector: SettleDetector,
    ) -> Self {
        assert!(dice_count > 0, "a roll session needs at least one die");
        Self {
            dice: vec![DieState::default(); dice_count],
            pending_values: vec![None; dice_count],
            final_values: None,
            predicate_met: None,
            roll: RollId::default(),
            launcher,
            detector,
            resolver,
            spawn_spacing: DEFAULT_SPAWN_SPACING,
            observers: Vec::new(),
            predicate: None,
            events: Vec::new(),
        }
    }

    pub fn with_spawn_spacing(mut self, spacing: f32) -> Self {
        self.spawn_spacing = spacing;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn RollObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn RollObserver>) {
        self.observers.push(observer);
    }

    pub fn with_completion_predicate(
        mut self,
        predicate: impl Fn(&[u32]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn dice_count(&self) -> usize {
        self.dice.len()
    }

    pub fn die_state(&self, die: usize) -> Option<&DieState> {
        self.dice.get(die)
    }

    pub fn pending_values(&self) -> &[Option<u32>] {
        &self.pending_values
    }

    /// Values in die order, once every die of the current roll reported
    pub fn final_values(&self) -> Option<&[u32]> {
        self.final_values.as_deref()
    }

    pub fn predicate_met(&self) -> Option<bool> {
        self.predicate_met
    }

    pub fn current_roll(&self) -> RollId {
        self.roll
    }

    /// True while any die of the current roll is still in flight
    pub fn is_rolling(&self) -> bool {
        self.dice.iter().any(DieState::is_rolling)
    }

    /// Start a new roll cycle for every die.
    ///
    /// Abandons whatever the previous roll had collected. `bodies` is
    /// indexed by die; a `None` slot still counts as rolling and is polled
    /// once its body shows up, but it gets no throw.
    pub fn start_roll<B: DieBody>(&mut self, bodies: &mut [Option<B>]) -> RollId {
        self.roll = RollId(self.roll.0 + 1);
        self.pending_values.iter_mut().for_each(|v| *v = None);
        self.final_values = None;
        self.predicate_met = None;
        self.events.clear();

        let total = self.dice.len();
        let base = self.launcher.params().spawn_position;

        for (index, state) in self.dice.iter_mut().enumerate() {
            state.begin_rolling();

            let Some(Some(body)) = bodies.get_mut(index) else {
                warn!("Die {} has no body yet, skipping its throw", index);
                continue;
            };
            let spawn = calculate_dice_position(base, index, total, self.spawn_spacing);
            let plan = self.launcher.launch(body, spawn);
            debug!(
                "Die {} launched from {:?} with impulse {:?}",
                index, plan.position, plan.impulse
            );
        }

        info!("Roll {} started with {} dice", self.roll.0, total);
        self.roll
    }

    /// Poll every rolling die once. Call after the physics step.
    ///
    /// Returns the events produced this tick, including any from results
    /// recorded directly since the last tick.
    pub fn tick<B: DieBody>(&mut self, bodies: &[Option<B>]) -> Vec<RollEvent> {
        for index in 0..self.dice.len() {
            // Not ready: try again next tick
            let Some(Some(body)) = bodies.get(index) else {
                continue;
            };
            let Some(settle) = self.detector.poll(&mut self.dice[index], body) else {
                continue;
            };

            let mut kind = settle.kind;
            let value = match self.resolver.resolve(settle.orientation) {
                Ok(value) => value,
                Err(e) => {
                    let state = &mut self.dice[index];
                    state.rejected_ticks = state.rejected_ticks.saturating_add(1);
                    if !self.detector.is_expired(state) {
                        if state.rejected_ticks == 1 {
                            warn!("Die {} settled with a bad orientation: {}", index, e);
                        } else {
                            debug!("Die {} still has a bad orientation: {}", index, e);
                        }
                        continue;
                    }
                    kind = SettleKind::TimedOut;
                    self.resolver.resolve_degraded(settle.orientation)
                }
            };

            if kind == SettleKind::TimedOut {
                warn!(
                    "Die {} never came to rest, taking face {} after {} ticks",
                    index, value, self.dice[index].rolling_ticks
                );
            }

            self.record(self.roll, index, value, kind);
        }

        self.drain_events()
    }

    /// Record a settled value for `die` in the current roll.
    pub fn record_result(&mut self, die: usize, value: u32) -> RecordOutcome {
        self.record(self.roll, die, value, SettleKind::Still)
    }

    /// Record a settled value for `die`, rejecting it if `roll` is no
    /// longer the current cycle.
    pub fn record_result_for(&mut self, roll: RollId, die: usize, value: u32) -> RecordOutcome {
        self.record(roll, die, value, SettleKind::Still)
    }

    /// Take the events queued since the last tick or drain
    pub fn drain_events(&mut self) -> Vec<RollEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, roll: RollId, die: usize, value: u32, kind: SettleKind) -> RecordOutcome {
        if roll != self.roll {
            debug!("Ignoring die {} result from old roll {}", die, roll.0);
            return RecordOutcome::Ignored(IgnoreReason::StaleRoll);
        }
        let Some(state) = self.dice.get_mut(die) else {
            warn!("Ignoring result for unknown die {}", die);
            return RecordOutcome::Ignored(IgnoreReason::UnknownDie);
        };
        if !state.is_rolling() {
            debug!("Die {} already reported this roll", die);
            return RecordOutcome::Ignored(IgnoreReason::NotRolling);
        }

        state.finish(value);
        self.pending_values[die] = Some(value);
        debug!("Die {} settled on {}", die, value);

        for observer in self.observers.iter_mut() {
            observer.on_die_settled(die, value);
        }
        self.events.push(RollEvent::DieSettled {
            roll,
            die,
            value,
            kind,
        });

        let Some(values) = self.pending_values.iter().copied().collect::<Option<Vec<u32>>>()
        else {
            return RecordOutcome::Accepted;
        };

        let predicate = self.predicate.as_ref().map(|p| p(&values));
        info!("Roll {} complete: {:?}", roll.0, values);

        for observer in self.observers.iter_mut() {
            observer.on_roll_complete(&values);
        }
        self.events.push(RollEvent::RollComplete {
            roll,
            values: values.clone(),
            predicate,
        });
        self.predicate_met = predicate;
        self.final_values = Some(values);

        RecordOutcome::Completed
    }
}
