use std::collections::BTreeMap;

use log::{info, warn};

use crate::interfaces::{GrainId, BACKGROUND_GRAIN_ID};
use crate::microstructure::GrainMap;
use crate::twins::pair_collector::TwinPair;
use crate::twins::union_find::GrainUnionFind;
use crate::Result;

/// Grain map after twin merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGrains {
    /// Every pixel relabelled with the root of its cluster
    pub map: GrainMap,
    /// Original id -> cluster root
    pub roots: BTreeMap<GrainId, GrainId>,
}

/// Merge twin-connected grains.
///
/// Pairs are applied in order, which fixes the surviving root of each
/// cluster. Pairs touching the background are ignored; a pair naming a grain
/// absent from `grain_map` aborts with `UnknownGrainId`.
pub fn merge_twins(pairs: &[TwinPair], grain_map: &GrainMap) -> Result<MergedGrains> {
    let mut forest = GrainUnionFind::from_grain_map(grain_map);
    for pair in pairs {
        if pair.grain_id == BACKGROUND_GRAIN_ID || pair.neighbor_id == BACKGROUND_GRAIN_ID {
            warn!(
                "ignoring twin pair ({}, {}) involving the background",
                pair.grain_id, pair.neighbor_id
            );
            continue;
        }
        forest.union(pair.grain_id, pair.neighbor_id)?;
    }

    // roots are finalized before a single relabelling pass
    let roots = forest.root_table()?;
    let map = grain_map.relabel(|id| roots.get(&id).copied().unwrap_or(id));

    let merged = roots.iter().filter(|(id, root)| id != root).count();
    info!(
        "merged {merged} grains into twin families, {} labels remain",
        forest.roots().len()
    );
    Ok(MergedGrains { map, roots })
}
