use std::collections::BTreeMap;

use log::debug;

use crate::errors::TwinMergeError;
use crate::interfaces::{GrainId, BACKGROUND_GRAIN_ID};
use crate::microstructure::grain_map::GrainMap;
use crate::microstructure::orientation_map::OrientationMap;
use crate::orientation::{mean_orientation, Orientation};
use crate::symmetries::SymmetryOperatorSet;
use crate::Result;

/// Representative orientation of each grain
pub type GrainOrientations = BTreeMap<GrainId, Orientation>;

/// A segmented EBSD map: grain labels plus per-pixel orientations.
///
/// Grain representative orientations may be supplied by the segmentation;
/// otherwise they are the fundamental-zone mean of each grain's pixels.
#[derive(Debug, Clone)]
pub struct Microstructure {
    grain_map: GrainMap,
    orientations: OrientationMap,
    grain_orientations: Option<GrainOrientations>,
}

impl Microstructure {
    pub fn new(grain_map: GrainMap, orientations: OrientationMap) -> Result<Self> {
        if grain_map.shape() != orientations.shape() {
            return Err(TwinMergeError::MapShapeMismatch {
                grain_shape: grain_map.shape(),
                orientation_shape: orientations.shape(),
            });
        }
        Ok(Self {
            grain_map,
            orientations,
            grain_orientations: None,
        })
    }

    /// Use explicit grain orientations instead of pixel means
    pub fn with_grain_orientations(mut self, grain_orientations: GrainOrientations) -> Self {
        self.grain_orientations = Some(grain_orientations);
        self
    }

    pub fn grain_map(&self) -> &GrainMap {
        &self.grain_map
    }

    pub fn orientations(&self) -> &OrientationMap {
        &self.orientations
    }

    /// Representative orientation per non-background grain.
    ///
    /// Grains without a single valid pixel are left out, so any pair involving
    /// them is skipped by the twin search.
    pub fn grain_orientations(&self, symmetry: &SymmetryOperatorSet) -> Result<GrainOrientations> {
        if let Some(explicit) = &self.grain_orientations {
            return Ok(explicit.clone());
        }
        let groups = self.orientations.partition_by(&self.grain_map)?;
        let mut representatives = GrainOrientations::new();
        for (id, members) in groups {
            if id == BACKGROUND_GRAIN_ID {
                continue;
            }
            match mean_orientation(&members, symmetry) {
                Some(mean) => {
                    representatives.insert(id, mean);
                }
                None => debug!("grain {id} has no valid orientation"),
            }
        }
        Ok(representatives)
    }
}
