//! Dice Settle CLI
//!
//! Throws simulated dice without a window: the roll session drives a
//! small built-in integrator and prints the faces the dice settle on.

mod toy_body;

use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use dicesettle::dice3d::{DiceSettings, RollEvent, RollSession, SettleKind};
use toy_body::ToyDie;

/// Simulation rate of the built-in integrator
const TICKS_PER_SECOND: f32 = 60.0;
const DIE_SIZE: f32 = 0.4;
const DIE_DENSITY: f32 = 1.5;
const BOX_HALF_WIDTH: f32 = 2.0;

/// Dice Settle - headless dice roller
#[derive(Parser)]
#[command(name = "dicesettle-roll")]
#[command(
    author,
    version,
    about = "Dice Settle - roll simulated dice and report the settled faces"
)]
struct Cli {
    /// Number of dice to throw (overrides the settings file)
    #[arg(short, long)]
    dice: Option<usize>,

    /// Fixed RNG seed for reproducible rolls
    #[arg(short, long)]
    seed: Option<u64>,

    /// RON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How many rolls to make in a row
    #[arg(short, long, default_value = "1")]
    rolls: usize,

    /// Give up on a roll after this many simulation ticks
    #[arg(long, default_value = "6000")]
    max_ticks: u32,

    /// Report whether the dice add up to this number
    #[arg(short, long)]
    target_sum: Option<u32>,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, PartialEq, Serialize)]
struct RollReport {
    roll: u64,
    values: Vec<u32>,
    total: u32,
    ticks: u32,
    /// Dice that hit the rolling timeout and were read as they lay
    timed_out: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_hit: Option<bool>,
}

fn main() {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => match DiceSettings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        },
        None => DiceSettings::default(),
    };
    if let Some(dice) = cli.dice {
        settings.dice_count = dice;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }

    let mut session = match RollSession::from_settings(&settings) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    if let Some(target) = cli.target_sum {
        session = session.with_completion_predicate(move |values| {
            values.iter().sum::<u32>() == target
        });
    }

    let mut bodies = toy_bodies(settings.dice_count);

    let mut reports = Vec::with_capacity(cli.rolls);
    for _ in 0..cli.rolls {
        match run_roll(&mut session, &mut bodies, cli.max_ticks) {
            Ok(report) => {
                if !cli.json {
                    print_report(&report, cli.target_sum);
                }
                reports.push(report);
            }
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{} Failed to encode results: {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        }
    }
}

fn toy_bodies(count: usize) -> Vec<Option<ToyDie>> {
    (0..count)
        .map(|_| Some(ToyDie::new(DIE_SIZE, DIE_DENSITY, BOX_HALF_WIDTH)))
        .collect()
}

/// Throw every die and step the simulation until the session completes.
fn run_roll(
    session: &mut RollSession,
    bodies: &mut [Option<ToyDie>],
    max_ticks: u32,
) -> Result<RollReport, String> {
    let dt = 1.0 / TICKS_PER_SECOND;
    let roll = session.start_roll(bodies);
    let mut timed_out = Vec::new();

    for tick in 1..=max_ticks {
        // Physics first, then settle checks against post-step velocities
        for body in bodies.iter_mut().flatten() {
            body.step(dt);
        }

        for event in session.tick(bodies) {
            match event {
                RollEvent::DieSettled { die, kind, .. } => {
                    if kind == SettleKind::TimedOut {
                        timed_out.push(die);
                    }
                }
                RollEvent::RollComplete {
                    values, predicate, ..
                } => {
                    return Ok(RollReport {
                        roll: roll.0,
                        total: values.iter().sum(),
                        values,
                        ticks: tick,
                        timed_out,
                        target_hit: predicate,
                    });
                }
            }
        }
    }

    Err(format!(
        "Roll {} did not finish within {} ticks",
        roll.0, max_ticks
    ))
}

fn print_report(report: &RollReport, target: Option<u32>) {
    println!("\n{}", "═══════════════════════════════════════".cyan());
    println!(
        "{} {}",
        "Roll:".bold().white(),
        format!("#{}", report.roll).yellow().bold()
    );

    let faces: Vec<String> = report
        .values
        .iter()
        .enumerate()
        .map(|(die, value)| {
            let face = format!("[{}]", value);
            if report.timed_out.contains(&die) {
                face.dimmed().to_string()
            } else {
                face.bright_green().bold().to_string()
            }
        })
        .collect();
    println!("{} {}", "Dice:".bold().white(), faces.join(" "));
    println!(
        "{} {:.2}s",
        "Settled after:".bold().white(),
        report.ticks as f32 / TICKS_PER_SECOND
    );
    if !report.timed_out.is_empty() {
        println!(
            "{} {} die(s) never came to rest and were read as they lay",
            "Warning:".yellow().bold(),
            report.timed_out.len()
        );
    }

    println!(
        "{} {}",
        "Total:".bold().white(),
        report.total.to_string().white().bold()
    );

    match (target, report.target_hit) {
        (Some(target), Some(true)) => {
            println!("{}", format!("HIT {}!", target).bright_green().bold())
        }
        (Some(target), Some(false)) => println!("{}", format!("Missed {}", target).red()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_session(dice_count: usize, seed: u64) -> RollSession {
        let settings = DiceSettings {
            dice_count,
            seed: Some(seed),
            ..Default::default()
        };
        RollSession::from_settings(&settings).unwrap()
    }

    #[test]
    fn test_seeded_roll_finishes_with_d6_values() {
        let mut session = seeded_session(3, 17);
        let mut bodies = toy_bodies(3);

        let report = run_roll(&mut session, &mut bodies, 6000).unwrap();
        assert_eq!(report.roll, 1);
        assert_eq!(report.values.len(), 3);
        assert!(report.values.iter().all(|v| (1..=6).contains(v)));
        assert_eq!(report.total, report.values.iter().sum::<u32>());
        assert!(report.ticks <= 6000);
        assert!(report.target_hit.is_none());
    }

    #[test]
    fn test_same_seed_same_report() {
        let roll = |seed| {
            let mut session = seeded_session(2, seed);
            let mut bodies = toy_bodies(2);
            run_roll(&mut session, &mut bodies, 6000).unwrap()
        };
        assert_eq!(roll(5), roll(5));
    }

    #[test]
    fn test_running_out_of_ticks_is_an_error() {
        let mut session = seeded_session(2, 9);
        let mut bodies = toy_bodies(2);
        let err = run_roll(&mut session, &mut bodies, 1).unwrap_err();
        assert!(err.contains("did not finish within 1 ticks"), "{err}");
    }

    #[test]
    fn test_target_hit_follows_predicate() {
        let mut session = seeded_session(2, 3)
            .with_completion_predicate(|values| values.iter().sum::<u32>() % 2 == 0);
        let mut bodies = toy_bodies(2);

        for expected_roll in 1..=3 {
            let report = run_roll(&mut session, &mut bodies, 6000).unwrap();
            assert_eq!(report.roll, expected_roll);
            assert_eq!(report.target_hit, Some(report.total % 2 == 0));
        }
    }
}
