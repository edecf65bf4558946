//! Dice-related types and components
//!
//! This module contains the face table (`FaceSpec`), the per-die state
//! machine (`DieState`) and the `Die` component that ties a physics body
//! to its slot in a roll session.

use bevy::prelude::*;
use thiserror::Error;

/// How far an orientation's norm may drift from 1.0 before it is rejected.
pub const ORIENTATION_TOLERANCE: f32 = 1e-3;

/// Tolerance used when checking that a face direction is axis aligned.
const AXIS_TOLERANCE: f32 = 1e-4;

/// The six signed axis directions a cube face can point along.
pub const AXIS_DIRECTIONS: [Vec3; 6] = [
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Errors raised by face tables and face resolution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FaceError {
    #[error("face table needs exactly 6 entries, found {found}")]
    WrongFaceCount { found: usize },

    #[error("face direction {direction} is not an axis-aligned unit vector")]
    NotAxisAligned { direction: Vec3 },

    #[error("face direction {direction} appears more than once")]
    DuplicateDirection { direction: Vec3 },

    #[error("face value {value} appears more than once")]
    DuplicateValue { value: u32 },

    #[error("orientation is not a unit quaternion (length {length})")]
    NonUnitOrientation { length: f32 },
}

/// One face of a die: the outward normal in the body's local frame and
/// the label printed on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceEntry {
    pub local_direction: Vec3,
    pub face_value: u32,
}

impl FaceEntry {
    pub fn new(local_direction: Vec3, face_value: u32) -> Self {
        Self {
            local_direction,
            face_value,
        }
    }
}

/// Validated table mapping the six local face normals of a cube to labels.
///
/// Table order matters: when two faces are equally upward, the one listed
/// first wins.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceSpec {
    entries: [FaceEntry; 6],
}

impl FaceSpec {
    /// Build a face table, checking that every signed axis is used exactly
    /// once and that no label repeats.
    pub fn new(entries: &[FaceEntry]) -> Result<Self, FaceError> {
        let table: [FaceEntry; 6] = entries
            .try_into()
            .map_err(|_| FaceError::WrongFaceCount {
                found: entries.len(),
            })?;

        let mut seen_axes = [false; 6];
        for (i, entry) in table.iter().enumerate() {
            let axis = AXIS_DIRECTIONS
                .iter()
                .position(|a| a.abs_diff_eq(entry.local_direction, AXIS_TOLERANCE))
                .ok_or(FaceError::NotAxisAligned {
                    direction: entry.local_direction,
                })?;
            if seen_axes[axis] {
                return Err(FaceError::DuplicateDirection {
                    direction: entry.local_direction,
                });
            }
            seen_axes[axis] = true;

            if table[..i].iter().any(|e| e.face_value == entry.face_value) {
                return Err(FaceError::DuplicateValue {
                    value: entry.face_value,
                });
            }
        }

        // Snap to the exact axis so resolution never sees rounding noise
        let entries = table.map(|e| FaceEntry {
            local_direction: e.local_direction.round(),
            ..e
        });

        Ok(Self { entries })
    }

    /// Same as [`FaceSpec::new`], from `(normal, value)` pairs.
    pub fn from_pairs(pairs: &[(Vec3, u32)]) -> Result<Self, FaceError> {
        let entries: Vec<FaceEntry> = pairs
            .iter()
            .map(|(dir, value)| FaceEntry::new(*dir, *value))
            .collect();
        Self::new(&entries)
    }

    /// A standard six-sided die: opposite faces sum to 7.
    pub fn standard_d6() -> Self {
        Self {
            entries: [
                FaceEntry::new(Vec3::Y, 6),
                FaceEntry::new(Vec3::NEG_Y, 1),
                FaceEntry::new(Vec3::X, 3),
                FaceEntry::new(Vec3::NEG_X, 4),
                FaceEntry::new(Vec3::Z, 2),
                FaceEntry::new(Vec3::NEG_Z, 5),
            ],
        }
    }

    pub fn entries(&self) -> &[FaceEntry] {
        &self.entries
    }

    /// The label on the face whose local normal is `direction`, if any.
    pub fn value_for(&self, direction: Vec3) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.local_direction.abs_diff_eq(direction, AXIS_TOLERANCE))
            .map(|e| e.face_value)
    }
}

impl Default for FaceSpec {
    fn default() -> Self {
        Self::standard_d6()
    }
}

/// Whether a die is in flight or at rest
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DiePhase {
    #[default]
    Idle,
    Rolling,
}

/// Per-die roll state, owned by the roll session
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DieState {
    pub phase: DiePhase,
    pub last_value: Option<u32>,
    /// Ticks polled since the die was launched (for timeout detection)
    pub rolling_ticks: u32,
    /// Consecutive ticks spent below both stillness thresholds
    pub still_ticks: u32,
    /// Settles this roll whose orientation could not be resolved
    pub rejected_ticks: u32,
}

impl DieState {
    pub fn is_rolling(&self) -> bool {
        self.phase == DiePhase::Rolling
    }

    /// Idle -> Rolling. Clears the counters but keeps the previous value
    /// until the die lands again.
    pub fn begin_rolling(&mut self) {
        self.phase = DiePhase::Rolling;
        self.rolling_ticks = 0;
        self.still_ticks = 0;
        self.rejected_ticks = 0;
    }

    /// Rolling -> Idle with the value the die landed on.
    pub fn finish(&mut self, value: u32) {
        self.phase = DiePhase::Idle;
        self.last_value = Some(value);
        self.still_ticks = 0;
    }
}

/// Component attached to each die entity, linking it to its slot in the
/// roll session.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Die {
    pub index: usize,
}

/// Marker component for the dice box/container
#[derive(Component)]
pub struct DiceBox;
