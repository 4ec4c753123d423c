use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, UnitQuaternion};
use serde::{Deserialize, Serialize};

use crate::config::{ORTHONORMALITY_TOLERANCE, SYMMETRY_TOLERANCE};
use crate::errors::TwinMergeError;
use crate::symmetries::symmetry_operations::{is_proper_rotation, SymmetryOperation};
use crate::Result;

/// Crystal classes with a built-in proper rotation group.
///
/// Each class resolves to a fixed [`SymmetryOperatorSet`] at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CrystalSymmetry {
    /// Point group 432, 24 operators
    #[default]
    Cubic,
    /// Point group 622, 12 operators
    Hexagonal,
    /// Point group 422, 8 operators
    Tetragonal,
    /// Point group 32, 6 operators
    Trigonal,
    /// Point group 222, 4 operators
    Orthorhombic,
    /// Point group 2 (unique axis b), 2 operators
    Monoclinic,
    /// Point group 1
    Triclinic,
}

impl CrystalSymmetry {
    pub const ALL: [CrystalSymmetry; 7] = [
        CrystalSymmetry::Cubic,
        CrystalSymmetry::Hexagonal,
        CrystalSymmetry::Tetragonal,
        CrystalSymmetry::Trigonal,
        CrystalSymmetry::Orthorhombic,
        CrystalSymmetry::Monoclinic,
        CrystalSymmetry::Triclinic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrystalSymmetry::Cubic => "cubic",
            CrystalSymmetry::Hexagonal => "hexagonal",
            CrystalSymmetry::Tetragonal => "tetragonal",
            CrystalSymmetry::Trigonal => "trigonal",
            CrystalSymmetry::Orthorhombic => "orthorhombic",
            CrystalSymmetry::Monoclinic => "monoclinic",
            CrystalSymmetry::Triclinic => "triclinic",
        }
    }

    /// Number of proper rotations in the point group
    pub fn group_order(&self) -> usize {
        match self {
            CrystalSymmetry::Cubic => 24,
            CrystalSymmetry::Hexagonal => 12,
            CrystalSymmetry::Tetragonal => 8,
            CrystalSymmetry::Trigonal => 6,
            CrystalSymmetry::Orthorhombic => 4,
            CrystalSymmetry::Monoclinic => 2,
            CrystalSymmetry::Triclinic => 1,
        }
    }

    /// Generators of the rotation group, in the standard Cartesian setting
    /// (c along z, a along x for hexagonal and trigonal).
    fn generators(&self) -> Vec<Matrix3<f64>> {
        let half_sqrt3 = 3.0_f64.sqrt() / 2.0;
        // 4-fold about z
        let c4z = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        // 3-fold about [111] (cyclic permutation of axes)
        let c3_111 = Matrix3::new(0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        // 6-fold and 3-fold about z
        let c6z = Matrix3::new(0.5, -half_sqrt3, 0.0, half_sqrt3, 0.5, 0.0, 0.0, 0.0, 1.0);
        let c3z = Matrix3::new(-0.5, -half_sqrt3, 0.0, half_sqrt3, -0.5, 0.0, 0.0, 0.0, 1.0);
        // 2-folds
        let c2x = Matrix3::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0);
        let c2y = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0);
        let c2z = Matrix3::new(-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0);

        match self {
            CrystalSymmetry::Cubic => vec![c4z, c3_111],
            CrystalSymmetry::Hexagonal => vec![c6z, c2x],
            CrystalSymmetry::Tetragonal => vec![c4z, c2x],
            CrystalSymmetry::Trigonal => vec![c3z, c2x],
            CrystalSymmetry::Orthorhombic => vec![c2z, c2x],
            CrystalSymmetry::Monoclinic => vec![c2y],
            CrystalSymmetry::Triclinic => vec![],
        }
    }

    /// Build the operator set of this class
    pub fn operator_set(&self) -> SymmetryOperatorSet {
        let operations = generate_point_group(&self.generators());
        debug_assert_eq!(operations.len(), self.group_order());
        SymmetryOperatorSet::with_class(*self, operations)
    }
}

impl fmt::Display for CrystalSymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrystalSymmetry {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        CrystalSymmetry::ALL
            .into_iter()
            .find(|sym| sym.as_str() == lowered)
            .ok_or_else(|| format!("unknown crystal symmetry '{s}'"))
    }
}

/// Close a set of generators under composition.
///
/// The identity comes first; further operators appear in breadth-first
/// order, so the result is deterministic for a given generator list.
pub fn generate_point_group(generators: &[Matrix3<f64>]) -> Vec<SymmetryOperation> {
    let mut group = vec![Matrix3::<f64>::identity()];
    let mut cursor = 0;
    while cursor < group.len() {
        let current = group[cursor];
        for generator in generators {
            let candidate = generator * current;
            let known = group
                .iter()
                .any(|m| (m - candidate).amax() < SYMMETRY_TOLERANCE.sqrt());
            if !known {
                group.push(candidate);
            }
        }
        cursor += 1;
    }
    group
        .into_iter()
        .map(|rotation| SymmetryOperation { rotation })
        .collect()
}

/// Ordered, read-only set of point-group rotations.
///
/// Also provides the canonical fundamental-zone reduction: the symmetric
/// equivalent with the smallest rotation angle, scalar part non-negative.
#[derive(Debug, Clone)]
pub struct SymmetryOperatorSet {
    class: Option<CrystalSymmetry>,
    operations: Vec<SymmetryOperation>,
    quaternions: Vec<UnitQuaternion<f64>>,
}

impl SymmetryOperatorSet {
    fn with_class(class: CrystalSymmetry, operations: Vec<SymmetryOperation>) -> Self {
        let quaternions = operations.iter().map(SymmetryOperation::quaternion).collect();
        Self {
            class: Some(class),
            operations,
            quaternions,
        }
    }

    /// Operator set supplied by the caller.
    ///
    /// The list must be non-empty and hold proper rotations only.
    pub fn from_operations(operations: Vec<SymmetryOperation>) -> Result<Self> {
        if operations.is_empty() {
            return Err(TwinMergeError::InvalidSymmetry(
                "operator set must contain at least one operator".to_string(),
            ));
        }
        for (index, op) in operations.iter().enumerate() {
            if !is_proper_rotation(&op.rotation, ORTHONORMALITY_TOLERANCE) {
                return Err(TwinMergeError::InvalidSymmetry(format!(
                    "operator {index} is not a proper rotation"
                )));
            }
        }
        let quaternions = operations.iter().map(SymmetryOperation::quaternion).collect();
        Ok(Self {
            class: None,
            operations,
            quaternions,
        })
    }

    /// Crystal class this set was built from, `None` for custom sets
    pub fn class(&self) -> Option<CrystalSymmetry> {
        self.class
    }

    pub fn operations(&self) -> &[SymmetryOperation] {
        &self.operations
    }

    pub fn quaternions(&self) -> &[UnitQuaternion<f64>] {
        &self.quaternions
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Every symmetric equivalent `S·q` of an orientation quaternion
    pub fn equivalents<'a>(
        &'a self,
        q: &'a UnitQuaternion<f64>,
    ) -> impl Iterator<Item = UnitQuaternion<f64>> + 'a {
        self.quaternions.iter().map(move |s| s * q)
    }

    /// Fundamental-zone representative of an orientation quaternion.
    ///
    /// Ties keep the first operator in set order.
    pub fn reduce_to_fundamental_zone(&self, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        let mut best = *q;
        let mut best_w = f64::NEG_INFINITY;
        for candidate in self.equivalents(q) {
            let w = candidate.w.abs();
            if w > best_w + SYMMETRY_TOLERANCE {
                best = candidate;
                best_w = w;
            }
        }
        positive_scalar(best)
    }
}

/// Resolve the antipodal ambiguity by keeping the scalar part non-negative
pub fn positive_scalar(q: UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    if q.w < 0.0 {
        UnitQuaternion::new_unchecked(-q.into_inner())
    } else {
        q
    }
}
