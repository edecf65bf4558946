//! Input handling systems
//!
//! Keyboard controls for the dice demo and logging of roll results.

use bevy::log::info;
use bevy::prelude::*;

use crate::dice3d::systems::dice::{DieSettled, RollCompleted, RollRequested};

/// Handle keyboard input for rolling dice
///
/// SPACE throws every die. Pressing it again mid-roll abandons the roll in
/// flight and starts over.
pub fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut roll_requests: MessageWriter<RollRequested>,
) {
    if keyboard.just_pressed(KeyCode::Space) {
        roll_requests.write(RollRequested);
    }
}

/// Log every settle and every completed roll
pub fn log_roll_results(
    mut settled: MessageReader<DieSettled>,
    mut completed: MessageReader<RollCompleted>,
) {
    for event in settled.read() {
        if event.timed_out {
            info!(
                "Die {} gave up rolling, showing {}",
                event.die, event.value
            );
        } else {
            info!("Die {} landed on {}", event.die, event.value);
        }
    }

    for event in completed.read() {
        let values: Vec<String> = event.values.iter().map(|v| v.to_string()).collect();
        info!(
            "Roll {}: {} = {}",
            event.roll.0,
            values.join(" + "),
            event.total()
        );
    }
}
