use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_AXIS_TOLERANCE, DEFAULT_ANGLE_TOLERANCE_DEG, DEFAULT_TWIN_ANGLE_DEG};
use crate::orientation::misorientation::{find_misorientation, Misorientation};
use crate::orientation::orientation::Orientation;
use crate::symmetries::SymmetryOperatorSet;

/// Geometric twin relation with its tolerance policy.
///
/// A candidate misorientation matches when its angle is within
/// `angle_tolerance` of `angle` and every axis component is within
/// `axis_tolerance` of `axis`. Unless `signed_axis` is set the negated axis is
/// accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwinCriterion {
    /// Target angle (radians)
    pub angle: f64,
    /// Target unit axis
    pub axis: Vector3<f64>,
    /// Absolute angle tolerance (radians)
    pub angle_tolerance: f64,
    /// Per-component tolerance on the axis difference
    pub axis_tolerance: f64,
    pub signed_axis: bool,
}

impl TwinCriterion {
    /// Σ3: 60° about <111>, 15° angle tolerance, 0.02 axis tolerance
    pub fn sigma3() -> Self {
        Self {
            angle: DEFAULT_TWIN_ANGLE_DEG.to_radians(),
            axis: Vector3::new(1.0, 1.0, 1.0).normalize(),
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE_DEG.to_radians(),
            axis_tolerance: DEFAULT_AXIS_TOLERANCE,
            signed_axis: false,
        }
    }

    pub fn with_angle_tolerance(mut self, tolerance: f64) -> Self {
        self.angle_tolerance = tolerance.clamp(0.0, PI);
        self
    }

    pub fn with_axis_tolerance(mut self, tolerance: f64) -> Self {
        self.axis_tolerance = tolerance.max(0.0);
        self
    }

    pub fn with_signed_axis(mut self, signed: bool) -> Self {
        self.signed_axis = signed;
        self
    }

    /// Whether one candidate misorientation satisfies both tolerances
    pub fn matches(&self, candidate: &Misorientation) -> bool {
        if (candidate.angle - self.angle).abs() > self.angle_tolerance {
            return false;
        }
        if axis_within(&candidate.axis, &self.axis, self.axis_tolerance) {
            return true;
        }
        !self.signed_axis && axis_within(&candidate.axis, &(-self.axis), self.axis_tolerance)
    }

    /// First operator combination, in either direction, that satisfies the criterion
    pub fn twin_misorientation(
        &self,
        first: &Orientation,
        second: &Orientation,
        symmetry: &SymmetryOperatorSet,
    ) -> Option<Misorientation> {
        find_misorientation(first, second, symmetry, |m| self.matches(m))
    }

    pub fn is_twin(
        &self,
        first: &Orientation,
        second: &Orientation,
        symmetry: &SymmetryOperatorSet,
    ) -> bool {
        self.twin_misorientation(first, second, symmetry).is_some()
    }
}

impl Default for TwinCriterion {
    fn default() -> Self {
        Self::sigma3()
    }
}

fn axis_within(axis: &Vector3<f64>, target: &Vector3<f64>, tolerance: f64) -> bool {
    (axis - target).amax() <= tolerance
}

/// Σ3 twin test with the default tolerances
pub fn is_sigma3_twin(
    first: &Orientation,
    second: &Orientation,
    symmetry: &SymmetryOperatorSet,
) -> bool {
    TwinCriterion::sigma3().is_twin(first, second, symmetry)
}
