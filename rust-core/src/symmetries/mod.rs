// Symmetries module: Contains point-group rotations and the fundamental-zone reduction
// This module provides the crystal symmetry used by every orientation comparison

// ======================== MODULE DECLARATIONS ========================
pub mod point_groups;
pub mod symmetry_operations;


// ======================== SYMMETRY OPERATIONS ========================
pub use symmetry_operations::{
    SymmetryOperation,  // struct - proper rotation acting on crystal coordinates
    is_proper_rotation, // fn(m: &Matrix3<f64>, tol: f64) -> bool - orthonormal with determinant +1
};
// SymmetryOperation impl methods:
//   new(rotation: Matrix3<f64>) -> Result<Self>                   - validated constructor
//   from_integer_matrix(rotation: Matrix3<i8>) -> Result<Self>    - constructor for integer settings
//   from_axis_angle(axis: Vector3<f64>, angle: f64) -> Self       - rotation about an axis
//   identity() -> Self                                            - identity operation
//   apply(&self, v: Vector3<f64>) -> Vector3<f64>                 - rotates a vector
//   compose(&self, other: &Self) -> Self                          - self after other
//   inverse(&self) -> Self                                        - transpose
//   order(&self) -> Option<usize>                                 - rotation order (1, 2, 3, 4, 6)
//   quaternion(&self) -> UnitQuaternion<f64>                      - quaternion form

// ======================== POINT GROUPS ========================
pub use point_groups::{
    CrystalSymmetry,      // enum - crystal classes (Cubic, Hexagonal, Tetragonal, Trigonal, Orthorhombic, Monoclinic, Triclinic)
    SymmetryOperatorSet,  // struct - ordered operator list + fundamental-zone reduction
    generate_point_group, // fn(generators: &[Matrix3<f64>]) -> Vec<SymmetryOperation> - group closure
    positive_scalar,      // fn(q: UnitQuaternion<f64>) -> UnitQuaternion<f64> - antipodal sign convention
};
// SymmetryOperatorSet impl methods:
//   from_operations(ops: Vec<SymmetryOperation>) -> Result<Self>  - custom operator set
//   operations(&self) -> &[SymmetryOperation]                     - operators, identity first for built-in classes
//   quaternions(&self) -> &[UnitQuaternion<f64>]                  - operators as quaternions
//   equivalents(&self, q) -> impl Iterator<UnitQuaternion<f64>>   - all S·q
//   reduce_to_fundamental_zone(&self, q) -> UnitQuaternion<f64>   - minimal-angle equivalent, w >= 0
