use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::TwinMergeConfig;
use crate::interfaces::{GrainAdjacency, GrainId, BACKGROUND_GRAIN_ID};
use crate::microstructure::{GrainMap, GrainOrientations, Microstructure, PixelAdjacency};
use crate::orientation::TwinCriterion;
use crate::symmetries::SymmetryOperatorSet;
use crate::twins::mean_orientation_map::{
    broadcast_mean_orientations, compute_mean_orientations, MeanOrientationTable, QuaternionMap,
};
use crate::twins::merge::merge_twins;
use crate::twins::pair_collector::{collect_twin_pairs, TwinPair};
use crate::Result;

/// Counts describing one merge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinMergeSummary {
    /// Distinct non-background labels before merging
    pub grains_before: usize,
    /// Distinct non-background labels after merging
    pub grains_after: usize,
    /// Twin pairs found, counting both directions
    pub twin_pairs: usize,
    /// Pixels without a usable orientation
    pub unindexed_pixels: usize,
}

/// Everything a merge run produces
#[derive(Debug, Clone)]
pub struct TwinMergeResult {
    pub merged_map: GrainMap,
    /// Original id -> merged id
    pub roots: BTreeMap<GrainId, GrainId>,
    pub twin_pairs: Vec<TwinPair>,
    pub mean_orientations: MeanOrientationTable,
    pub mean_orientation_map: QuaternionMap,
    pub summary: TwinMergeSummary,
}

/// Twin merging with a fixed symmetry and twin criterion
#[derive(Debug, Clone)]
pub struct TwinMerger {
    config: TwinMergeConfig,
    symmetry: SymmetryOperatorSet,
    criterion: TwinCriterion,
}

impl TwinMerger {
    pub fn new(config: TwinMergeConfig) -> Result<Self> {
        let symmetry = config.symmetry.operator_set();
        Self::with_symmetry(config, symmetry)
    }

    /// Use a custom operator set instead of the configured crystal class
    pub fn with_symmetry(config: TwinMergeConfig, symmetry: SymmetryOperatorSet) -> Result<Self> {
        let criterion = config.twin_criterion()?;
        Ok(Self {
            config,
            symmetry,
            criterion,
        })
    }

    pub fn config(&self) -> &TwinMergeConfig {
        &self.config
    }

    pub fn symmetry(&self) -> &SymmetryOperatorSet {
        &self.symmetry
    }

    pub fn criterion(&self) -> &TwinCriterion {
        &self.criterion
    }

    /// Twin pairs among the grains of `grain_map`, in ascending grain order
    pub fn find_twin_pairs<A>(
        &self,
        grain_map: &GrainMap,
        orientations: &GrainOrientations,
        adjacency: &A,
    ) -> Vec<TwinPair>
    where
        A: GrainAdjacency + Sync,
    {
        let grain_ids: Vec<GrainId> = grain_map
            .unique_ids()
            .into_iter()
            .filter(|&id| id != BACKGROUND_GRAIN_ID)
            .collect();
        collect_twin_pairs(
            &grain_ids,
            orientations,
            adjacency,
            &self.symmetry,
            &self.criterion,
        )
    }

    /// Find twins, merge them and average each merged grain.
    pub fn run<A>(&self, microstructure: &Microstructure, adjacency: &A) -> Result<TwinMergeResult>
    where
        A: GrainAdjacency + Sync,
    {
        let grain_map = microstructure.grain_map();
        let orientations = microstructure.orientations();

        let representatives = microstructure.grain_orientations(&self.symmetry)?;
        let twin_pairs = self.find_twin_pairs(grain_map, &representatives, adjacency);
        info!("found {} twin pairs", twin_pairs.len());

        let merged = merge_twins(&twin_pairs, grain_map)?;
        let mean_orientations = compute_mean_orientations(
            &merged.map,
            orientations,
            &self.symmetry,
            self.config.average_background,
        )?;
        let mean_orientation_map = broadcast_mean_orientations(&merged.map, &mean_orientations)?;

        let summary = TwinMergeSummary {
            grains_before: count_grains(grain_map),
            grains_after: count_grains(&merged.map),
            twin_pairs: twin_pairs.len(),
            unindexed_pixels: orientations.len() - orientations.valid_count(),
        };
        info!(
            "{} grains -> {} grains ({} unindexed pixels)",
            summary.grains_before, summary.grains_after, summary.unindexed_pixels
        );

        Ok(TwinMergeResult {
            merged_map: merged.map,
            roots: merged.roots,
            twin_pairs,
            mean_orientations,
            mean_orientation_map,
            summary,
        })
    }

    /// [`run`](Self::run) with adjacency taken from touching pixels
    pub fn run_with_pixel_adjacency(&self, microstructure: &Microstructure) -> Result<TwinMergeResult> {
        let adjacency =
            PixelAdjacency::from_grain_map(microstructure.grain_map(), self.config.connectivity);
        self.run(microstructure, &adjacency)
    }
}

fn count_grains(map: &GrainMap) -> usize {
    map.unique_ids()
        .into_iter()
        .filter(|&id| id != BACKGROUND_GRAIN_ID)
        .count()
}
