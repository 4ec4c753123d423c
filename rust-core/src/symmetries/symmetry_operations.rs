use nalgebra::{Matrix3, Rotation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::{ORTHONORMALITY_TOLERANCE, SYMMETRY_TOLERANCE};
use crate::errors::TwinMergeError;
use crate::Result;

/// Highest order of a crystallographic rotation
const MAX_ROTATION_ORDER: usize = 6;

/// Check that `m` is orthonormal with determinant +1
pub fn is_proper_rotation(m: &Matrix3<f64>, tol: f64) -> bool {
    if !m.iter().all(|x| x.is_finite()) {
        return false;
    }
    let gram = m.transpose() * m;
    (gram - Matrix3::identity()).amax() < tol && (m.determinant() - 1.0).abs() < tol
}

/// A single point-group operation: a proper rotation acting on crystal coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymmetryOperation {
    /// Orthonormal rotation matrix with determinant +1
    pub rotation: Matrix3<f64>,
}

impl SymmetryOperation {
    /// Create a new symmetry operation, rejecting anything but a proper rotation
    pub fn new(rotation: Matrix3<f64>) -> Result<Self> {
        if !is_proper_rotation(&rotation, ORTHONORMALITY_TOLERANCE) {
            return Err(TwinMergeError::InvalidSymmetry(format!(
                "operator is not a proper rotation: {rotation}"
            )));
        }
        Ok(Self { rotation })
    }

    /// Create an operation from an integer matrix (cubic and orthorhombic settings)
    pub fn from_integer_matrix(rotation: Matrix3<i8>) -> Result<Self> {
        Self::new(rotation.map(|x| x as f64))
    }

    /// Rotation by `angle` radians about `axis` (normalized internally)
    pub fn from_axis_angle(axis: Vector3<f64>, angle: f64) -> Self {
        let rotation = Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle);
        Self {
            rotation: rotation.into_inner(),
        }
    }

    /// Create identity operation
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
        }
    }

    /// Apply symmetry operation to a vector
    pub fn apply(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.rotation * v
    }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            rotation: self.rotation.transpose(),
        }
    }

    /// Number of applications needed to return to the identity.
    ///
    /// `None` when the rotation is not crystallographic (order above 6).
    pub fn order(&self) -> Option<usize> {
        let mut power = self.rotation;
        for n in 1..=MAX_ROTATION_ORDER {
            if (power - Matrix3::identity()).amax() < SYMMETRY_TOLERANCE.sqrt() {
                return Some(n);
            }
            power = self.rotation * power;
        }
        None
    }

    /// Check if this is the identity operation
    pub fn is_identity(&self) -> bool {
        (self.rotation - Matrix3::identity()).amax() < SYMMETRY_TOLERANCE
    }

    /// Unit quaternion of the rotation
    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(self.rotation))
    }

    /// Whether two operations are the same rotation within tolerance
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (self.rotation - other.rotation).amax() < tol
    }
}
