use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::{ORTHONORMALITY_TOLERANCE, QUATERNION_NORM_TOLERANCE};
use crate::errors::TwinMergeError;
use crate::symmetries::{is_proper_rotation, positive_scalar, SymmetryOperatorSet};
use crate::Result;

/// Crystal orientation stored as its orientation matrix `g`.
///
/// `g` maps sample coordinates to crystal coordinates, so crystal symmetry
/// operators act from the left (`S·g`). The quaternion form is the unit
/// quaternion of the same matrix and is exchanged scalar-first, `[w, x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    g: Matrix3<f64>,
}

impl Orientation {
    /// Construct from an orientation matrix, which must be a proper rotation
    pub fn from_matrix(g: Matrix3<f64>) -> Result<Self> {
        if !is_proper_rotation(&g, ORTHONORMALITY_TOLERANCE) {
            return Err(TwinMergeError::InvalidOrientation(format!(
                "matrix is not a proper rotation: {g}"
            )));
        }
        Ok(Self { g })
    }

    /// Construct from a raw quaternion.
    ///
    /// Norms within [`QUATERNION_NORM_TOLERANCE`] of one are renormalized;
    /// anything else (zero, NaN, garbage) is rejected.
    pub fn from_quaternion(q: Quaternion<f64>) -> Result<Self> {
        let norm = q.norm();
        if !norm.is_finite() || (norm - 1.0).abs() > QUATERNION_NORM_TOLERANCE {
            return Err(TwinMergeError::InvalidOrientation(format!(
                "quaternion norm {norm} is not close to 1"
            )));
        }
        Ok(Self::from_unit_quaternion(UnitQuaternion::from_quaternion(q)))
    }

    /// Construct from scalar-first components `[w, x, y, z]`
    pub fn from_wxyz(components: [f64; 4]) -> Result<Self> {
        let [w, x, y, z] = components;
        Self::from_quaternion(Quaternion::new(w, x, y, z))
    }

    pub fn from_unit_quaternion(q: UnitQuaternion<f64>) -> Self {
        Self {
            g: q.to_rotation_matrix().into_inner(),
        }
    }

    /// Construct from Bunge Euler angles (φ1, Φ, φ2) in radians
    pub fn from_euler_bunge(phi1: f64, phi: f64, phi2: f64) -> Self {
        let (s1, c1) = phi1.sin_cos();
        let (s, c) = phi.sin_cos();
        let (s2, c2) = phi2.sin_cos();
        let g = Matrix3::new(
            c1 * c2 - s1 * s2 * c,
            s1 * c2 + c1 * s2 * c,
            s2 * s,
            -c1 * s2 - s1 * c2 * c,
            -s1 * s2 + c1 * c2 * c,
            c2 * s,
            s1 * s,
            -c1 * s,
            c,
        );
        Self { g }
    }

    /// Construct from Bunge Euler angles in degrees
    pub fn from_euler_bunge_deg(angles: [f64; 3]) -> Self {
        Self::from_euler_bunge(
            angles[0].to_radians(),
            angles[1].to_radians(),
            angles[2].to_radians(),
        )
    }

    pub fn identity() -> Self {
        Self {
            g: Matrix3::identity(),
        }
    }

    /// The orientation matrix `g`
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.g
    }

    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(self.g))
    }

    /// Scalar-first quaternion components with a non-negative scalar part
    pub fn to_wxyz(&self) -> [f64; 4] {
        let q = positive_scalar(self.quaternion());
        [q.w, q.i, q.j, q.k]
    }

    /// Rodrigues vector `axis * tan(angle / 2)`; `None` for half turns
    pub fn rodrigues(&self) -> Option<Vector3<f64>> {
        let q = positive_scalar(self.quaternion());
        if q.w.abs() < f64::EPSILON {
            return None;
        }
        Some(q.imag() / q.w)
    }

    /// Symmetrically equivalent orientation with the smallest rotation angle
    pub fn to_fundamental_zone(&self, symmetry: &SymmetryOperatorSet) -> Self {
        Self::from_unit_quaternion(symmetry.reduce_to_fundamental_zone(&self.quaternion()))
    }

    /// Apply a symmetry operator from the left
    pub fn apply_symmetry(&self, rotation: &Matrix3<f64>) -> Self {
        Self { g: rotation * self.g }
    }
}
