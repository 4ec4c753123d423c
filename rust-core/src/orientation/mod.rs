// Orientation module: Contains crystal orientations, misorientations and the twin test
// This module provides the symmetry-aware orientation math used by the merge pipeline

// ======================== MODULE DECLARATIONS ========================
pub mod mean_orientation;
pub mod misorientation;
pub mod orientation;
pub mod twin_criterion;


// ======================== ORIENTATIONS ========================
pub use orientation::Orientation; // struct - orientation matrix g (sample -> crystal)
// Orientation impl methods:
//   from_matrix(g: Matrix3<f64>) -> Result<Self>                  - validated constructor
//   from_quaternion(q: Quaternion<f64>) -> Result<Self>           - validated, renormalized constructor
//   from_wxyz(components: [f64; 4]) -> Result<Self>               - scalar-first components
//   from_euler_bunge(phi1, phi, phi2) -> Self                     - Bunge Euler angles (radians)
//   matrix(&self) -> &Matrix3<f64>                                - orientation matrix
//   quaternion(&self) -> UnitQuaternion<f64>                      - quaternion form
//   to_wxyz(&self) -> [f64; 4]                                    - scalar-first, w >= 0
//   rodrigues(&self) -> Option<Vector3<f64>>                      - Rodrigues vector
//   to_fundamental_zone(&self, symmetry) -> Self                  - minimal-angle equivalent

// ======================== MISORIENTATION ENGINE ========================
pub use misorientation::{
    Misorientation,                 // struct - (angle, axis) pair
    candidate_misorientations,      // fn(o1, o2, symmetry) -> impl Iterator<Misorientation> - all 2·S² candidates
    find_misorientation,            // fn(o1, o2, symmetry, predicate) -> Option<Misorientation> - short-circuit search
    misorientation,                 // fn(o1, o2, symmetry) -> Misorientation - minimal-angle candidate
    misorientation_angle_from_delta, // fn(delta: &Matrix3<f64>) -> f64
    misorientation_axis_from_delta, // fn(delta: &Matrix3<f64>) -> Vector3<f64> - zero vector when degenerate
};

// ======================== TWIN CLASSIFIER ========================
pub use twin_criterion::{
    TwinCriterion,  // struct - target angle/axis with tolerances
    is_sigma3_twin, // fn(o1, o2, symmetry) -> bool - default Σ3 test
};

// ======================== MEAN ORIENTATION ========================
pub use mean_orientation::{
    mean_orientation, // fn(orientations: &[Orientation], symmetry) -> Option<Orientation>
    mean_quaternion,  // fn(orientations: &[Orientation], symmetry) -> Option<[f64; 4]>
};
