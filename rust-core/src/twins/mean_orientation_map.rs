use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::TwinMergeError;
use crate::interfaces::{GrainId, BACKGROUND_GRAIN_ID};
use crate::microstructure::{GrainMap, OrientationMap};
use crate::orientation::{mean_orientation, Orientation};
use crate::symmetries::SymmetryOperatorSet;
use crate::Result;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Mean orientation of every merged grain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanOrientationTable {
    entries: BTreeMap<GrainId, Orientation>,
}

impl MeanOrientationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, grain_id: GrainId, orientation: Orientation) -> Option<Orientation> {
        self.entries.insert(grain_id, orientation)
    }

    pub fn get(&self, grain_id: GrainId) -> Option<&Orientation> {
        self.entries.get(&grain_id)
    }

    pub fn contains(&self, grain_id: GrainId) -> bool {
        self.entries.contains_key(&grain_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GrainId, &Orientation)> {
        self.entries.iter().map(|(&id, o)| (id, o))
    }
}

impl FromIterator<(GrainId, Orientation)> for MeanOrientationTable {
    fn from_iter<I: IntoIterator<Item = (GrainId, Orientation)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// H×W×4 map of scalar-first quaternions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuaternionMap {
    height: usize,
    width: usize,
    data: Vec<[f64; 4]>,
}

impl QuaternionMap {
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<[f64; 4]> {
        if row < self.height && col < self.width {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// Row-major pixel quaternions
    pub fn pixels(&self) -> &[[f64; 4]] {
        &self.data
    }

    pub fn rows(&self) -> Vec<Vec<[f64; 4]>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.data.chunks(self.width).map(<[[f64; 4]]>::to_vec).collect()
    }
}

/// Mean orientation of every label in `grain_map`.
///
/// The background is averaged like any grain when `average_background` is
/// set, and recorded as the identity otherwise. A label without any valid
/// pixel orientation is recorded as the identity as well.
pub fn compute_mean_orientations(
    grain_map: &GrainMap,
    orientations: &OrientationMap,
    symmetry: &SymmetryOperatorSet,
    average_background: bool,
) -> Result<MeanOrientationTable> {
    let groups = orientations.partition_by(grain_map)?;

    let mean_of = |(grain_id, members): (GrainId, Vec<Orientation>)| {
        if grain_id == BACKGROUND_GRAIN_ID && !average_background {
            return (grain_id, Orientation::identity());
        }
        let mean = mean_orientation(&members, symmetry).unwrap_or_else(|| {
            warn!("grain {grain_id} has no valid pixel orientation, using the identity");
            Orientation::identity()
        });
        (grain_id, mean)
    };

    #[cfg(feature = "parallel")]
    let table: MeanOrientationTable = groups
        .into_par_iter()
        .map(mean_of)
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    #[cfg(not(feature = "parallel"))]
    let table: MeanOrientationTable = groups.into_iter().map(mean_of).collect();

    Ok(table)
}

/// Write each pixel's grain mean into an H×W×4 map.
///
/// Every label must have an entry; otherwise nothing is produced.
pub fn broadcast_mean_orientations(
    grain_map: &GrainMap,
    table: &MeanOrientationTable,
) -> Result<QuaternionMap> {
    let mut resolved: BTreeMap<GrainId, [f64; 4]> = BTreeMap::new();
    for grain_id in grain_map.unique_ids() {
        let orientation = table
            .get(grain_id)
            .ok_or(TwinMergeError::IncompleteMeanOrientationTable(grain_id))?;
        resolved.insert(grain_id, orientation.to_wxyz());
    }

    let data = grain_map
        .ids()
        .iter()
        .map(|id| resolved[id])
        .collect();
    Ok(QuaternionMap {
        height: grain_map.height(),
        width: grain_map.width(),
        data,
    })
}
