// Microstructure module: Contains the segmented EBSD map representation
// This module provides grain labels, per-pixel orientations and grain adjacency

// ======================== MODULE DECLARATIONS ========================
pub mod adjacency;
pub mod ebsd_map;
pub mod grain_map;
pub mod orientation_map;

// Test modules
mod _tests_microstructure;

// ======================== MAPS ========================
pub use grain_map::GrainMap; // struct - H×W grain labels (row-major)
// GrainMap impl methods:
//   new(height, width, ids: Vec<GrainId>) -> Result<Self>         - validated constructor
//   from_rows(rows: &[Vec<GrainId>]) -> Result<Self>              - from nested rows
//   get(&self, row, col) -> Option<GrainId>                       - label lookup
//   unique_ids(&self) -> Vec<GrainId>                             - sorted distinct labels
//   pixel_counts(&self) -> BTreeMap<GrainId, usize>               - pixels per label
//   relabel(&self, f: FnMut(GrainId) -> GrainId) -> Self          - label rewrite

pub use orientation_map::OrientationMap; // struct - H×W per-pixel orientations (None = unindexed)
// OrientationMap impl methods:
//   from_quaternions(height, width, &[[f64; 4]]) -> Result<Self>  - scalar-first quaternions
//   from_euler_bunge_deg(height, width, &[[f64; 3]]) -> Result<Self> - Bunge Euler angles
//   partition_by(&self, labels: &GrainMap) -> Result<BTreeMap<GrainId, Vec<Orientation>>>

pub use ebsd_map::{
    GrainOrientations, // type - BTreeMap<GrainId, Orientation>
    Microstructure,    // struct - grain map + orientation map (+ optional grain orientations)
};

// ======================== ADJACENCY ========================
pub use adjacency::{
    NeighborList,   // struct - explicit, symmetrized neighbour lists
    PixelAdjacency, // struct - neighbours from touching pixels (4- or 8-connected)
};
