//! Throw Control Systems
//!
//! Contains the system that turns roll requests into throws on the
//! Rapier bodies of every die.

use bevy::prelude::*;

use crate::dice3d::body::{collect_die_bodies, DieBodyQuery};
use crate::dice3d::plugin::DiceRoller;
use crate::dice3d::systems::dice::RollRequested;

/// System to launch every die when a roll is requested
///
/// Runs before the physics backend sync so the teleport, the velocity
/// reset and the impulses reach Rapier together. Several requests in one
/// frame collapse into a single roll.
pub fn launch_requested_rolls(
    mut requests: MessageReader<RollRequested>,
    mut roller: ResMut<DiceRoller>,
    mut dice_query: DieBodyQuery,
) {
    if requests.read().count() == 0 {
        return;
    }

    let mut bodies = collect_die_bodies(&mut dice_query, roller.dice_count());
    roller.start_roll(&mut bodies);
}
