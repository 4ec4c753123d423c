use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::interfaces::{Connectivity, GrainAdjacency, GrainId};
use crate::microstructure::grain_map::GrainMap;

/// Grain adjacency derived from touching pixels of a grain map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelAdjacency {
    neighbors: BTreeMap<GrainId, BTreeSet<GrainId>>,
}

impl PixelAdjacency {
    pub fn from_grain_map(map: &GrainMap, connectivity: Connectivity) -> Self {
        let mut neighbors: BTreeMap<GrainId, BTreeSet<GrainId>> = BTreeMap::new();
        let (height, width) = map.shape();
        for row in 0..height {
            for col in 0..width {
                let Some(id) = map.get(row, col) else {
                    continue;
                };
                neighbors.entry(id).or_default();
                for &(dr, dc) in connectivity.forward_offsets() {
                    let (Some(r), Some(c)) = (row.checked_add_signed(dr), col.checked_add_signed(dc))
                    else {
                        continue;
                    };
                    match map.get(r, c) {
                        Some(other) if other != id => {
                            neighbors.entry(id).or_default().insert(other);
                            neighbors.entry(other).or_default().insert(id);
                        }
                        _ => {}
                    }
                }
            }
        }
        Self { neighbors }
    }

    pub fn grain_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn are_adjacent(&self, a: GrainId, b: GrainId) -> bool {
        self.neighbors.get(&a).is_some_and(|set| set.contains(&b))
    }
}

impl GrainAdjacency for PixelAdjacency {
    fn neighbors(&self, grain_id: GrainId) -> Vec<GrainId> {
        self.neighbors
            .get(&grain_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Explicit neighbour lists supplied by an external segmentation.
///
/// Lists are symmetrized on construction, so `a` listing `b` is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<GrainId, Vec<GrainId>>", into = "BTreeMap<GrainId, Vec<GrainId>>")]
pub struct NeighborList {
    neighbors: BTreeMap<GrainId, BTreeSet<GrainId>>,
}

impl From<BTreeMap<GrainId, Vec<GrainId>>> for NeighborList {
    fn from(lists: BTreeMap<GrainId, Vec<GrainId>>) -> Self {
        let mut neighbors: BTreeMap<GrainId, BTreeSet<GrainId>> = BTreeMap::new();
        for (id, list) in lists {
            neighbors.entry(id).or_default();
            for other in list.into_iter().filter(|&other| other != id) {
                neighbors.entry(id).or_default().insert(other);
                neighbors.entry(other).or_default().insert(id);
            }
        }
        Self { neighbors }
    }
}

impl From<NeighborList> for BTreeMap<GrainId, Vec<GrainId>> {
    fn from(list: NeighborList) -> Self {
        list.neighbors
            .into_iter()
            .map(|(id, set)| (id, set.into_iter().collect()))
            .collect()
    }
}

impl GrainAdjacency for NeighborList {
    fn neighbors(&self, grain_id: GrainId) -> Vec<GrainId> {
        self.neighbors
            .get(&grain_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}
