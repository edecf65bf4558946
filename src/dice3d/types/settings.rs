//! Dice settings types and persistence
//!
//! This module handles loading and saving the tunables of a roll session
//! as RON. Every field has a serde default, so partial files work.

use bevy::log::{info, warn};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::dice::{FaceEntry, FaceSpec};
use crate::dice3d::systems::dice::{
    SettleDetector, DEFAULT_ANGULAR_THRESHOLD, DEFAULT_LINEAR_THRESHOLD,
    DEFAULT_MAX_ROLLING_TICKS,
};
use crate::dice3d::throw_control::{RotationSampling, ThrowParameters};

/// Number of dice a session rolls unless configured otherwise
pub const DEFAULT_DICE_COUNT: usize = 3;
/// Distance between neighbouring spawn points
pub const DEFAULT_SPAWN_SPACING: f32 = 0.6;

// ============================================================================
// Face table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceSetting {
    pub direction: [f32; 3],
    pub value: u32,
}

impl FaceSetting {
    pub fn from_runtime(entry: &FaceEntry) -> Self {
        Self {
            direction: entry.local_direction.to_array(),
            value: entry.face_value,
        }
    }

    pub fn to_runtime(&self) -> FaceEntry {
        FaceEntry::new(Vec3::from_array(self.direction), self.value)
    }
}

fn default_faces() -> Vec<FaceSetting> {
    FaceSpec::standard_d6()
        .entries()
        .iter()
        .map(FaceSetting::from_runtime)
        .collect()
}

// ============================================================================
// Throw
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowSetting {
    #[serde(default = "default_spawn_position")]
    pub spawn_position: [f32; 3],

    #[serde(default = "default_linear_impulse_range")]
    pub linear_impulse_range: f32,

    #[serde(default = "default_vertical_impulse_bias")]
    pub vertical_impulse_bias: f32,

    #[serde(default = "default_torque_impulse_range")]
    pub torque_impulse_range: f32,
}

fn default_spawn_position() -> [f32; 3] {
    ThrowParameters::default().spawn_position.to_array()
}
fn default_linear_impulse_range() -> f32 {
    ThrowParameters::default().linear_impulse_range
}
fn default_vertical_impulse_bias() -> f32 {
    ThrowParameters::default().vertical_impulse_bias
}
fn default_torque_impulse_range() -> f32 {
    ThrowParameters::default().torque_impulse_range
}

impl Default for ThrowSetting {
    fn default() -> Self {
        Self::from_runtime(&ThrowParameters::default())
    }
}

impl ThrowSetting {
    pub fn from_runtime(params: &ThrowParameters) -> Self {
        Self {
            spawn_position: params.spawn_position.to_array(),
            linear_impulse_range: params.linear_impulse_range,
            vertical_impulse_bias: params.vertical_impulse_bias,
            torque_impulse_range: params.torque_impulse_range,
        }
    }

    pub fn to_runtime(&self) -> ThrowParameters {
        ThrowParameters {
            spawn_position: Vec3::from_array(self.spawn_position),
            linear_impulse_range: self.linear_impulse_range,
            vertical_impulse_bias: self.vertical_impulse_bias,
            torque_impulse_range: self.torque_impulse_range,
        }
    }
}

// ============================================================================
// Settle detection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettleSetting {
    #[serde(default = "default_linear_threshold")]
    pub linear_threshold: f32,

    #[serde(default = "default_angular_threshold")]
    pub angular_threshold: f32,

    #[serde(default = "default_required_still_ticks")]
    pub required_still_ticks: u32,

    /// `None` disables the rolling timeout
    #[serde(default = "default_max_rolling_ticks")]
    pub max_rolling_ticks: Option<u32>,
}

fn default_linear_threshold() -> f32 {
    DEFAULT_LINEAR_THRESHOLD
}
fn default_angular_threshold() -> f32 {
    DEFAULT_ANGULAR_THRESHOLD
}
fn default_required_still_ticks() -> u32 {
    1
}
fn default_max_rolling_ticks() -> Option<u32> {
    Some(DEFAULT_MAX_ROLLING_TICKS)
}

impl Default for SettleSetting {
    fn default() -> Self {
        Self::from_runtime(&SettleDetector::default())
    }
}

impl SettleSetting {
    pub fn from_runtime(detector: &SettleDetector) -> Self {
        Self {
            linear_threshold: detector.linear_threshold,
            angular_threshold: detector.angular_threshold,
            required_still_ticks: detector.required_still_ticks,
            max_rolling_ticks: detector.max_rolling_ticks,
        }
    }

    pub fn to_runtime(&self) -> SettleDetector {
        SettleDetector {
            linear_threshold: self.linear_threshold,
            angular_threshold: self.angular_threshold,
            required_still_ticks: self.required_still_ticks,
            max_rolling_ticks: self.max_rolling_ticks,
        }
    }
}

// ============================================================================
// Top level
// ============================================================================

/// Everything needed to build a roll session
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceSettings {
    #[serde(default = "default_dice_count")]
    pub dice_count: usize,

    #[serde(default = "default_faces")]
    pub faces: Vec<FaceSetting>,

    #[serde(default)]
    pub throw: ThrowSetting,

    #[serde(default = "default_spawn_spacing")]
    pub spawn_spacing: f32,

    #[serde(default)]
    pub settle: SettleSetting,

    #[serde(default)]
    pub rotation_sampling: RotationSampling,

    /// Fixed RNG seed for reproducible throws
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_dice_count() -> usize {
    DEFAULT_DICE_COUNT
}
fn default_spawn_spacing() -> f32 {
    DEFAULT_SPAWN_SPACING
}

impl Default for DiceSettings {
    fn default() -> Self {
        Self {
            dice_count: DEFAULT_DICE_COUNT,
            faces: default_faces(),
            throw: ThrowSetting::default(),
            spawn_spacing: DEFAULT_SPAWN_SPACING,
            settle: SettleSetting::default(),
            rotation_sampling: RotationSampling::default(),
            seed: None,
        }
    }
}

impl DiceSettings {
    /// Validated face table
    pub fn face_spec(&self) -> Result<FaceSpec, String> {
        let entries: Vec<FaceEntry> = self.faces.iter().map(FaceSetting::to_runtime).collect();
        FaceSpec::new(&entries).map_err(|e| format!("Invalid face table: {}", e))
    }

    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|e| format!("Failed to parse dice settings: {}", e))
    }

    pub fn to_ron_string(&self) -> Result<String, String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| format!("Failed to serialize dice settings: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_ron_str(&text)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No dice settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => {
                info!("Loaded dice settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let text = self.to_ron_string()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
            }
        }
        fs::write(path, text).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }
}
