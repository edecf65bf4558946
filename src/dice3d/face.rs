//! Face resolution
//!
//! Maps a die's world orientation to the label on its most upward face.

use bevy::prelude::*;

use crate::dice3d::types::{FaceError, FaceSpec, ORIENTATION_TOLERANCE};

/// Resolves settled orientations against a fixed face table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceResolver {
    faces: FaceSpec,
}

impl FaceResolver {
    pub fn new(faces: FaceSpec) -> Self {
        Self { faces }
    }

    pub fn faces(&self) -> &FaceSpec {
        &self.faces
    }

    /// Determine the upward-facing value of a die from its rotation.
    ///
    /// Each local face normal is rotated into world space and compared
    /// against world up; the largest dot product wins. Ties go to the entry
    /// listed first in the table.
    pub fn resolve(&self, orientation: Quat) -> Result<u32, FaceError> {
        check_orientation(orientation)?;

        let up = Vec3::Y;
        let mut best_match = self.faces.entries()[0].face_value;
        let mut best_dot = f32::NEG_INFINITY;

        for entry in self.faces.entries() {
            let world_normal = orientation * entry.local_direction;
            let dot = world_normal.dot(up);

            if dot > best_dot {
                best_dot = dot;
                best_match = entry.face_value;
            }
        }

        Ok(best_match)
    }

    /// Best-effort face for an orientation `resolve` rejected.
    ///
    /// Renormalizes when the quaternion is finite and non-zero; otherwise
    /// falls back to the first entry of the table.
    pub fn resolve_degraded(&self, orientation: Quat) -> u32 {
        let fallback = self.faces.entries()[0].face_value;
        let length = orientation.length();
        if !orientation.is_finite() || length <= f32::EPSILON {
            return fallback;
        }
        self.resolve(orientation / length).unwrap_or(fallback)
    }
}

/// Reject orientations that are not unit quaternions.
pub fn check_orientation(orientation: Quat) -> Result<(), FaceError> {
    let length = orientation.length();
    if !length.is_finite() || (length - 1.0).abs() > ORIENTATION_TOLERANCE {
        return Err(FaceError::NonUnitOrientation { length });
    }
    Ok(())
}
