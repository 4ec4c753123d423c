// Twins module: Contains twin detection, grain merging and merged-grain averaging
// This module turns a segmented map into one where every twin family is a single grain

// ======================== MODULE DECLARATIONS ========================
pub mod mean_orientation_map;
pub mod merge;
pub mod pair_collector;
pub mod pipeline;
pub mod union_find;

// Test modules
mod _tests_pipeline;

// ======================== TWIN SEARCH ========================
pub use pair_collector::{
    TwinPair,           // struct - (grain_id, neighbor_id) found to be twin related
    collect_twin_pairs, // fn(grain_ids, orientations, adjacency, symmetry, criterion) -> Vec<TwinPair>
};

// ======================== MERGING ========================
pub use union_find::GrainUnionFind; // struct - disjoint-set forest weighted by pixel count
// GrainUnionFind impl methods:
//   from_grain_map(map: &GrainMap) -> Self                        - one singleton per label
//   insert(&mut self, id, size) -> bool                           - register a singleton
//   find(&mut self, id) -> Result<GrainId>                        - root with path compression
//   union(&mut self, x, y) -> Result<GrainId>                     - union by size, x wins ties
//   roots(&self) -> Vec<GrainId>                                  - current roots, ascending
//   root_table(&mut self) -> Result<BTreeMap<GrainId, GrainId>>   - final root of every id

pub use merge::{
    MergedGrains, // struct - relabelled map + root table
    merge_twins,  // fn(pairs: &[TwinPair], grain_map: &GrainMap) -> Result<MergedGrains>
};

// ======================== MEAN ORIENTATIONS ========================
pub use mean_orientation_map::{
    MeanOrientationTable,        // struct - GrainId -> mean orientation
    QuaternionMap,               // struct - H×W×4 scalar-first quaternions
    broadcast_mean_orientations, // fn(grain_map, table) -> Result<QuaternionMap> - all-or-nothing
    compute_mean_orientations,   // fn(grain_map, orientations, symmetry, average_background) -> Result<MeanOrientationTable>
};

// ======================== PIPELINE ========================
pub use pipeline::{
    TwinMergeResult,  // struct - merged map, roots, pairs, means, summary
    TwinMergeSummary, // struct - grain counts before/after, pair and unindexed counts
    TwinMerger,       // struct - configured driver
};
// TwinMerger impl methods:
//   new(config: TwinMergeConfig) -> Result<Self>                  - resolves symmetry and criterion
//   with_symmetry(config, symmetry: SymmetryOperatorSet) -> Result<Self>
//   find_twin_pairs(&self, grain_map, orientations, adjacency) -> Vec<TwinPair>
//   run(&self, microstructure, adjacency) -> Result<TwinMergeResult>
//   run_with_pixel_adjacency(&self, microstructure) -> Result<TwinMergeResult>
