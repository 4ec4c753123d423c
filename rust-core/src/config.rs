// Constants and run configuration

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::errors::TwinMergeError;
use crate::interfaces::Connectivity;
use crate::orientation::TwinCriterion;
use crate::symmetries::CrystalSymmetry;
use crate::Result;

// Tolerances
pub const ORTHONORMALITY_TOLERANCE: f64 = 1e-6; // For validating orientation matrices
pub const QUATERNION_NORM_TOLERANCE: f64 = 1e-2; // EBSD quaternions are often stored as f32
pub const SYMMETRY_TOLERANCE: f64 = 1e-8; // For deduplicating operators during group closure
pub const AXIS_DEGENERACY_TOLERANCE: f64 = 1e-10; // Below this the skew part carries no axis

// Sigma-3 twin defaults
pub const DEFAULT_TWIN_ANGLE_DEG: f64 = 60.0;
pub const DEFAULT_ANGLE_TOLERANCE_DEG: f64 = 15.0;
pub const DEFAULT_AXIS_TOLERANCE: f64 = 0.02;

/// Configuration of one twin-merge run.
///
/// Angles are given in degrees here and converted to radians when the
/// [`TwinCriterion`] is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinMergeConfig {
    /// Crystal class whose rotation group is used for every comparison
    pub symmetry: CrystalSymmetry,
    /// Target misorientation angle of the twin relation
    pub twin_angle_deg: f64,
    /// Target misorientation axis (normalized on use)
    pub twin_axis: [f64; 3],
    /// Absolute tolerance on the misorientation angle
    pub angle_tolerance_deg: f64,
    /// Per-component tolerance on the unit axis
    pub axis_tolerance: f64,
    /// Only accept the axis with the exact sign of `twin_axis`
    pub signed_axis: bool,
    /// Average the background region like any other grain
    pub average_background: bool,
    /// Pixel connectivity used when adjacency is derived from the grain map
    pub connectivity: Connectivity,
}

impl Default for TwinMergeConfig {
    fn default() -> Self {
        Self {
            symmetry: CrystalSymmetry::Cubic,
            twin_angle_deg: DEFAULT_TWIN_ANGLE_DEG,
            twin_axis: [1.0, 1.0, 1.0],
            angle_tolerance_deg: DEFAULT_ANGLE_TOLERANCE_DEG,
            axis_tolerance: DEFAULT_AXIS_TOLERANCE,
            signed_axis: false,
            average_background: true,
            connectivity: Connectivity::Four,
        }
    }
}

impl TwinMergeConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.angle_tolerance_deg.is_finite() && self.angle_tolerance_deg >= 0.0) {
            return Err(TwinMergeError::InvalidConfig(format!(
                "angle tolerance must be a non-negative number, got {}",
                self.angle_tolerance_deg
            )));
        }
        if !(self.axis_tolerance.is_finite() && self.axis_tolerance >= 0.0) {
            return Err(TwinMergeError::InvalidConfig(format!(
                "axis tolerance must be a non-negative number, got {}",
                self.axis_tolerance
            )));
        }
        if !self.twin_angle_deg.is_finite() || !(0.0..=180.0).contains(&self.twin_angle_deg) {
            return Err(TwinMergeError::InvalidConfig(format!(
                "twin angle must lie in [0, 180] degrees, got {}",
                self.twin_angle_deg
            )));
        }
        let axis = Vector3::from(self.twin_axis);
        if !axis.iter().all(|c| c.is_finite()) || axis.norm() < AXIS_DEGENERACY_TOLERANCE {
            return Err(TwinMergeError::InvalidConfig(format!(
                "twin axis must be a finite non-zero vector, got {:?}",
                self.twin_axis
            )));
        }
        Ok(())
    }

    /// Build the twin criterion described by this configuration.
    pub fn twin_criterion(&self) -> Result<TwinCriterion> {
        self.validate()?;
        let axis = Vector3::from(self.twin_axis).normalize();
        Ok(TwinCriterion {
            angle: self.twin_angle_deg.to_radians(),
            axis,
            angle_tolerance: self.angle_tolerance_deg.to_radians(),
            axis_tolerance: self.axis_tolerance,
            signed_axis: self.signed_axis,
        })
    }
}
