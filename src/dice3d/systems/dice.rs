//! Dice settle systems
//!
//! This module contains the settle detector, the messages the roll
//! session publishes, and the system that polls dice after each physics
//! step.

use bevy::prelude::*;

use crate::dice3d::body::{collect_die_bodies, DieBody, DieBodyQuery};
use crate::dice3d::plugin::DiceRoller;
use crate::dice3d::session::{RollEvent, RollId};
use crate::dice3d::types::DieState;

/// Default linear speed below which a die counts as still
pub const DEFAULT_LINEAR_THRESHOLD: f32 = 0.05;
/// Default angular speed below which a die counts as still
pub const DEFAULT_ANGULAR_THRESHOLD: f32 = 0.05;
/// Default cap on rolling time, 10 seconds at 60 ticks per second
pub const DEFAULT_MAX_ROLLING_TICKS: u32 = 600;

/// How a die came to be considered settled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleKind {
    /// Both velocities dropped under their thresholds
    Still,
    /// Rolled too long; the current orientation was taken as-is
    TimedOut,
}

/// A settle signal: the orientation to resolve and how it was reached
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settle {
    pub orientation: Quat,
    pub kind: SettleKind,
}

/// Decides, tick by tick, whether a rolling die has come to rest
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettleDetector {
    pub linear_threshold: f32,
    pub angular_threshold: f32,
    /// Consecutive still ticks needed before settling (1 = immediately)
    pub required_still_ticks: u32,
    /// Force a settle after this many rolling ticks; `None` waits forever
    pub max_rolling_ticks: Option<u32>,
}

impl Default for SettleDetector {
    fn default() -> Self {
        Self {
            linear_threshold: DEFAULT_LINEAR_THRESHOLD,
            angular_threshold: DEFAULT_ANGULAR_THRESHOLD,
            required_still_ticks: 1,
            max_rolling_ticks: Some(DEFAULT_MAX_ROLLING_TICKS),
        }
    }
}

impl SettleDetector {
    /// Sample `body` once. Returns nothing while the die is idle or still
    /// moving.
    ///
    /// Only the tick counters on `state` are touched; the Rolling -> Idle
    /// transition happens when the session accepts the result.
    pub fn poll<B: DieBody + ?Sized>(&self, state: &mut DieState, body: &B) -> Option<Settle> {
        if !state.is_rolling() {
            return None;
        }

        state.rolling_ticks = state.rolling_ticks.saturating_add(1);

        let speed = body.linear_velocity().length();
        let spin = body.angular_velocity().length();

        if speed < self.linear_threshold && spin < self.angular_threshold {
            state.still_ticks = state.still_ticks.saturating_add(1);
            if state.still_ticks >= self.required_still_ticks.max(1) {
                return Some(Settle {
                    orientation: body.rotation(),
                    kind: SettleKind::Still,
                });
            }
        } else {
            state.still_ticks = 0;
        }

        if self.is_expired(state) {
            return Some(Settle {
                orientation: body.rotation(),
                kind: SettleKind::TimedOut,
            });
        }
        None
    }

    /// True once `state` has rolled for the full timeout
    pub fn is_expired(&self, state: &DieState) -> bool {
        matches!(self.max_rolling_ticks, Some(max) if state.rolling_ticks >= max)
    }
}

/// Ask the roll session to throw every die
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct RollRequested;

/// One die came to rest
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct DieSettled {
    pub roll: RollId,
    pub die: usize,
    pub value: u32,
    pub timed_out: bool,
}

/// Every die of a roll came to rest
#[derive(Message, Clone, Debug, PartialEq)]
pub struct RollCompleted {
    pub roll: RollId,
    pub values: Vec<u32>,
    pub predicate: Option<bool>,
}

impl RollCompleted {
    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

/// System to poll dice after the physics step and publish settle results
pub fn tick_roll_session(
    mut roller: ResMut<DiceRoller>,
    mut dice_query: DieBodyQuery,
    mut settled: MessageWriter<DieSettled>,
    mut completed: MessageWriter<RollCompleted>,
) {
    // Results recorded directly on the session still need publishing
    let events = if roller.is_rolling() {
        let bodies = collect_die_bodies(&mut dice_query, roller.dice_count());
        roller.tick(&bodies)
    } else {
        roller.drain_events()
    };

    for event in events {
        match event {
            RollEvent::DieSettled {
                roll,
                die,
                value,
                kind,
            } => {
                settled.write(DieSettled {
                    roll,
                    die,
                    value,
                    timed_out: kind == SettleKind::TimedOut,
                });
            }
            RollEvent::RollComplete {
                roll,
                values,
                predicate,
            } => {
                completed.write(RollCompleted {
                    roll,
                    values,
                    predicate,
                });
            }
        }
    }
}
