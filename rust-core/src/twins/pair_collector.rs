use log::debug;
use serde::{Deserialize, Serialize};

use crate::interfaces::{GrainAdjacency, GrainId, BACKGROUND_GRAIN_ID};
use crate::microstructure::GrainOrientations;
use crate::orientation::TwinCriterion;
use crate::symmetries::SymmetryOperatorSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Two adjacent grains found to be twin related, in the order they were tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TwinPair {
    pub grain_id: GrainId,
    pub neighbor_id: GrainId,
}

impl TwinPair {
    pub fn new(grain_id: GrainId, neighbor_id: GrainId) -> Self {
        Self {
            grain_id,
            neighbor_id,
        }
    }
}

/// Twin pairs among adjacent grains.
///
/// Grains are visited in the order of `grain_ids`, neighbours in the order the
/// adjacency reports them. Background grains and grains without a
/// representative orientation never produce a pair. Both `(a, b)` and
/// `(b, a)` are reported when both grains are visited.
pub fn collect_twin_pairs<A>(
    grain_ids: &[GrainId],
    orientations: &GrainOrientations,
    adjacency: &A,
    symmetry: &SymmetryOperatorSet,
    criterion: &TwinCriterion,
) -> Vec<TwinPair>
where
    A: GrainAdjacency + Sync,
{
    let twins_of =
        |&grain_id: &GrainId| twins_of_grain(grain_id, orientations, adjacency, symmetry, criterion);

    #[cfg(feature = "parallel")]
    let pairs: Vec<TwinPair> = grain_ids.par_iter().flat_map_iter(twins_of).collect();

    #[cfg(not(feature = "parallel"))]
    let pairs: Vec<TwinPair> = grain_ids.iter().flat_map(twins_of).collect();

    pairs
}

fn twins_of_grain<A>(
    grain_id: GrainId,
    orientations: &GrainOrientations,
    adjacency: &A,
    symmetry: &SymmetryOperatorSet,
    criterion: &TwinCriterion,
) -> Vec<TwinPair>
where
    A: GrainAdjacency,
{
    if grain_id == BACKGROUND_GRAIN_ID {
        return Vec::new();
    }
    let Some(orientation) = orientations.get(&grain_id) else {
        debug!("skipping grain {grain_id}: no representative orientation");
        return Vec::new();
    };

    adjacency
        .neighbors(grain_id)
        .into_iter()
        .filter(|&neighbor_id| neighbor_id != BACKGROUND_GRAIN_ID && neighbor_id != grain_id)
        .filter_map(|neighbor_id| {
            let Some(other) = orientations.get(&neighbor_id) else {
                debug!("skipping pair ({grain_id}, {neighbor_id}): no representative orientation");
                return None;
            };
            let found = criterion.twin_misorientation(orientation, other, symmetry)?;
            debug!(
                "grain {grain_id} and neighbor {neighbor_id} are twins ({:.2}° about [{:.3}, {:.3}, {:.3}])",
                found.angle_deg(),
                found.axis.x,
                found.axis.y,
                found.axis.z
            );
            Some(TwinPair::new(grain_id, neighbor_id))
        })
        .collect()
}
