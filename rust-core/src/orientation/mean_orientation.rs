use nalgebra::{Matrix4, Quaternion, UnitQuaternion};

use crate::orientation::orientation::Orientation;
use crate::symmetries::SymmetryOperatorSet;

/// Mean of a set of orientations in the fundamental zone.
///
/// 1. every orientation is reduced to its fundamental-zone representative,
/// 2. each member is replaced by the symmetric equivalent closest to the first
///    member, with the sign chosen so both lie in the same hemisphere,
/// 3. the average is the dominant eigenvector of Σ q qᵀ,
/// 4. the result is reduced to the fundamental zone again.
///
/// Returns `None` for an empty input.
pub fn mean_orientation(
    orientations: &[Orientation],
    symmetry: &SymmetryOperatorSet,
) -> Option<Orientation> {
    let reduced: Vec<UnitQuaternion<f64>> = orientations
        .iter()
        .map(|o| symmetry.reduce_to_fundamental_zone(&o.quaternion()))
        .collect();
    let reference = *reduced.first()?;

    let mut scatter = Matrix4::<f64>::zeros();
    for q in &reduced {
        let aligned = align_to_reference(q, &reference, symmetry);
        let v = aligned.coords;
        scatter += v * v.transpose();
    }

    let eigen = scatter.symmetric_eigen();
    let dominant = eigen.eigenvalues.imax();
    let v = eigen.eigenvectors.column(dominant).into_owned();
    let mean = UnitQuaternion::from_quaternion(Quaternion::from_vector(v));

    Some(Orientation::from_unit_quaternion(
        symmetry.reduce_to_fundamental_zone(&mean),
    ))
}

/// Symmetric equivalent of `q` closest to `reference`, in the reference hemisphere
fn align_to_reference(
    q: &UnitQuaternion<f64>,
    reference: &UnitQuaternion<f64>,
    symmetry: &SymmetryOperatorSet,
) -> UnitQuaternion<f64> {
    let mut best = *q;
    let mut best_dot = f64::NEG_INFINITY;
    for candidate in symmetry.equivalents(q) {
        let dot = candidate.coords.dot(&reference.coords).abs();
        if dot > best_dot {
            best = candidate;
            best_dot = dot;
        }
    }
    if best.coords.dot(&reference.coords) < 0.0 {
        best = UnitQuaternion::new_unchecked(-best.into_inner());
    }
    best
}

/// Mean orientation as scalar-first components with `w >= 0`
pub fn mean_quaternion(
    orientations: &[Orientation],
    symmetry: &SymmetryOperatorSet,
) -> Option<[f64; 4]> {
    mean_orientation(orientations, symmetry).map(|o| o.to_wxyz())
}
