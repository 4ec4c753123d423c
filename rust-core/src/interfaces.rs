// Definitions that are used throughout all modules

use serde::{Deserialize, Serialize};

/// Integer label of a grain in a segmented EBSD map
pub type GrainId = u32;

/// Label reserved for unindexed or background pixels
pub const BACKGROUND_GRAIN_ID: GrainId = 0;

// Enumeration for pixel neighbourhoods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Edge-sharing neighbours only
    #[default]
    Four,
    /// Edge- and corner-sharing neighbours
    Eight,
}

impl Connectivity {
    /// Row/column offsets of the neighbourhood, forward half only.
    ///
    /// Scanning every pixel with these offsets visits each unordered pixel
    /// pair exactly once.
    pub fn forward_offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(0, 1), (1, 0)],
            Connectivity::Eight => &[(0, 1), (1, -1), (1, 0), (1, 1)],
        }
    }
}

/// Source of grain neighbourhoods.
///
/// The relation is expected to be symmetric. Implementations may or may not
/// report the background label; callers filter it.
pub trait GrainAdjacency {
    fn neighbors(&self, grain_id: GrainId) -> Vec<GrainId>;
}
