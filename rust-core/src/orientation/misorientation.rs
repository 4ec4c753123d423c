use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::AXIS_DEGENERACY_TOLERANCE;
use crate::orientation::orientation::Orientation;
use crate::symmetries::SymmetryOperatorSet;

/// Relative rotation between two orientations as an (angle, axis) pair.
///
/// The angle is in radians, in [0, π]. The axis is a unit vector, or the zero
/// vector when the rotation is (numerically) the identity or a half turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Misorientation {
    pub angle: f64,
    pub axis: Vector3<f64>,
}

impl Misorientation {
    pub fn from_delta(delta: &Matrix3<f64>) -> Self {
        Self {
            angle: misorientation_angle_from_delta(delta),
            axis: misorientation_axis_from_delta(delta),
        }
    }

    pub fn angle_deg(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Whether the axis carries a direction
    pub fn has_axis(&self) -> bool {
        self.axis.norm_squared() > 0.0
    }
}

/// Rotation angle of `delta` from its trace, clamped against rounding
pub fn misorientation_angle_from_delta(delta: &Matrix3<f64>) -> f64 {
    let cosine = ((delta.trace() - 1.0) / 2.0).clamp(-1.0, 1.0);
    cosine.acos()
}

/// Rotation axis of `delta` from its skew-symmetric part.
///
/// `delta` is read as a passive rotation, like the orientation matrices it is
/// built from, so an active rotation about `a` yields `-a`.
pub fn misorientation_axis_from_delta(delta: &Matrix3<f64>) -> Vector3<f64> {
    let skew = Vector3::new(
        delta[(1, 2)] - delta[(2, 1)],
        delta[(2, 0)] - delta[(0, 2)],
        delta[(0, 1)] - delta[(1, 0)],
    );
    let norm = skew.norm();
    if norm < AXIS_DEGENERACY_TOLERANCE {
        return Vector3::zeros();
    }
    skew / norm
}

/// Every relative rotation `(op_i·g2)·(op_j·g1)^T`, over all operator pairs
/// and in both directions (g1 against g2, then g2 against g1).
///
/// Lazily evaluated, so callers can stop at the first candidate they accept.
pub fn candidate_misorientations<'a>(
    first: &Orientation,
    second: &Orientation,
    symmetry: &'a SymmetryOperatorSet,
) -> impl Iterator<Item = Misorientation> + 'a {
    let directions = [
        (*first.matrix(), *second.matrix()),
        (*second.matrix(), *first.matrix()),
    ];
    directions.into_iter().flat_map(move |(g1, g2)| {
        symmetry.operations().iter().flat_map(move |op_j| {
            let oj = op_j.rotation * g1;
            symmetry.operations().iter().map(move |op_i| {
                let oi = op_i.rotation * g2;
                Misorientation::from_delta(&(oi * oj.transpose()))
            })
        })
    })
}

/// First candidate misorientation accepted by `predicate`
pub fn find_misorientation<P>(
    first: &Orientation,
    second: &Orientation,
    symmetry: &SymmetryOperatorSet,
    predicate: P,
) -> Option<Misorientation>
where
    P: FnMut(&Misorientation) -> bool,
{
    candidate_misorientations(first, second, symmetry).find(predicate)
}

/// Minimal-angle misorientation (disorientation) between two orientations
pub fn misorientation(
    first: &Orientation,
    second: &Orientation,
    symmetry: &SymmetryOperatorSet,
) -> Misorientation {
    candidate_misorientations(first, second, symmetry)
        .min_by(|a, b| a.angle.total_cmp(&b.angle))
        .unwrap_or_else(|| {
            Misorientation::from_delta(&(second.matrix() * first.matrix().transpose()))
        })
}
