// Hide console window on Windows for release builds (GUI app).
// In debug builds, keep the console so panics/backtraces are visible.
#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use clap::Parser;
use std::path::PathBuf;

use dicesettle::dice3d::{
    handle_input, log_roll_results, setup, DicePlugin, DiceSettings, RotationSampling,
};

/// Dice Settle - physically simulated dice
#[derive(Parser)]
#[command(name = "dicesettle")]
#[command(author, version, about = "Throw physically simulated dice and read the faces")]
struct Cli {
    /// RON settings file (missing file = defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of dice to throw (overrides the settings file)
    #[arg(short, long)]
    dice: Option<usize>,

    /// Fixed RNG seed for reproducible throws
    #[arg(short, long)]
    seed: Option<u64>,

    /// Sample starting rotations uniformly instead of from Euler angles
    #[arg(long)]
    uniform_rotation: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => DiceSettings::load_or_default(path),
        None => DiceSettings::default(),
    };
    if let Some(dice) = cli.dice {
        settings.dice_count = dice;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    if cli.uniform_rotation {
        settings.rotation_sampling = RotationSampling::Uniform;
    }

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Dice Settle - press SPACE to roll".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(DicePlugin::new(settings))
        .add_systems(Startup, setup)
        .add_systems(Update, (handle_input, log_roll_results))
        .run();
}
