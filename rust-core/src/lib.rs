//! Twin merging for EBSD orientation maps
//!
//! This library detects Σ3 twin boundaries between adjacent grains, merges every
//! twin-connected family of grains into one labelled region, and computes a
//! symmetry-aware mean orientation per merged region.
//!
//! Quick reference
//! - Symmetry: [`symmetries::CrystalSymmetry`], [`symmetries::SymmetryOperatorSet`]
//! - Orientations: [`orientation::Orientation`], [`orientation::misorientation`],
//!   [`orientation::is_sigma3_twin`], [`orientation::mean_orientation`]
//! - Maps: [`microstructure::GrainMap`], [`microstructure::OrientationMap`],
//!   [`microstructure::PixelAdjacency`]
//! - Merging: [`twins::collect_twin_pairs`], [`twins::GrainUnionFind`],
//!   [`twins::merge_twins`], [`twins::TwinMerger`]

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod microstructure;
pub mod orientation;
pub mod scan_io;
pub mod symmetries;
pub mod twins;

pub use errors::TwinMergeError;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, TwinMergeError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
