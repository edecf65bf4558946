//! Bevy plugin wiring the roll session into an app
//!
//! Throws are applied in `Update`, before Rapier syncs its backend; the
//! session is ticked in `PostUpdate` once Rapier has written velocities
//! and poses back, so settle checks always see post-step motion.

use bevy::log::{error, info};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use std::ops::{Deref, DerefMut};

use crate::dice3d::session::RollSession;
use crate::dice3d::systems::dice::{
    tick_roll_session, DieSettled, RollCompleted, RollRequested,
};
use crate::dice3d::throw_control::launch_requested_rolls;
use crate::dice3d::types::DiceSettings;

/// Resource holding the app's one roll session
#[derive(Resource)]
pub struct DiceRoller(pub RollSession);

impl Deref for DiceRoller {
    type Target = RollSession;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DiceRoller {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Adds the roll session, its messages and its systems.
///
/// Rapier itself is not added here; the app decides how physics runs.
#[derive(Default)]
pub struct DicePlugin {
    pub settings: DiceSettings,
}

impl DicePlugin {
    pub fn new(settings: DiceSettings) -> Self {
        Self { settings }
    }
}

impl Plugin for DicePlugin {
    fn build(&self, app: &mut App) {
        let (settings, session) = match RollSession::from_settings(&self.settings) {
            Ok(session) => (self.settings.clone(), session),
            Err(e) => {
                error!("Invalid dice settings ({}), falling back to defaults", e);
                (DiceSettings::default(), RollSession::default())
            }
        };
        info!("Dice plugin ready with {} dice", settings.dice_count);

        app.insert_resource(DiceRoller(session))
            .insert_resource(settings)
            .add_message::<RollRequested>()
            .add_message::<DieSettled>()
            .add_message::<RollCompleted>()
            .add_systems(Update, launch_requested_rolls)
            .add_systems(
                PostUpdate,
                tick_roll_session.after(PhysicsSet::Writeback),
            );
    }
}
