//! Systems module for dice3d
//!
//! This module contains the Bevy systems that drive dice through a roll,
//! organized into submodules by functionality:
//!
//! - `dice`: Settle detection and post-physics roll session ticking
//! - `input`: Keyboard input for requesting rolls
//! - `setup`: Scene initialization (camera, light, dice box, dice)

pub(crate) mod dice;
mod input;
mod setup;

// Re-export all public systems
pub use dice::{
    tick_roll_session, DieSettled, RollCompleted, RollRequested, Settle, SettleDetector,
    SettleKind, DEFAULT_ANGULAR_THRESHOLD, DEFAULT_LINEAR_THRESHOLD, DEFAULT_MAX_ROLLING_TICKS,
};
pub use input::{handle_input, log_roll_results};
pub use setup::{setup, spawn_die, DIE_SIZE};
