// JSON scan files and merge reports

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::TwinMergeConfig;
use crate::interfaces::GrainId;
use crate::microstructure::{GrainMap, GrainOrientations, Microstructure, NeighborList, OrientationMap};
use crate::orientation::Orientation;
use crate::symmetries::CrystalSymmetry;
use crate::twins::{TwinMergeResult, TwinMergeSummary, TwinMerger, TwinPair};
use crate::Result;

/// Per-pixel orientations of a scan, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrientations {
    /// Scalar-first unit quaternions
    Quaternions(Vec<[f64; 4]>),
    /// Bunge Euler angles in degrees
    EulerBungeDeg(Vec<[f64; 3]>),
}

/// A segmented scan as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFile {
    pub height: usize,
    pub width: usize,
    /// Row-major grain labels, 0 marks the background
    pub grain_ids: Vec<GrainId>,
    pub orientations: ScanOrientations,
    /// Overrides the configured crystal symmetry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symmetry: Option<CrystalSymmetry>,
    /// Explicit grain adjacency; derived from touching pixels when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<NeighborList>,
    /// Representative orientation per grain as scalar-first quaternions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grain_orientations: Option<BTreeMap<GrainId, [f64; 4]>>,
}

impl ScanFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn into_microstructure(self) -> Result<Microstructure> {
        let grain_map = GrainMap::new(self.height, self.width, self.grain_ids)?;
        let orientations = match &self.orientations {
            ScanOrientations::Quaternions(q) => {
                OrientationMap::from_quaternions(self.height, self.width, q)?
            }
            ScanOrientations::EulerBungeDeg(angles) => {
                OrientationMap::from_euler_bunge_deg(self.height, self.width, angles)?
            }
        };
        let microstructure = Microstructure::new(grain_map, orientations)?;

        match self.grain_orientations {
            Some(table) => {
                let mut explicit = GrainOrientations::new();
                for (id, q) in table {
                    match Orientation::from_wxyz(q) {
                        Ok(orientation) => {
                            explicit.insert(id, orientation);
                        }
                        Err(err) => warn!("Ignoring orientation of grain {id}: {err}"),
                    }
                }
                Ok(microstructure.with_grain_orientations(explicit))
            }
            None => Ok(microstructure),
        }
    }
}

/// Output of one merge run as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinMergeReport {
    /// Merged grain labels, one row per scan line
    pub merged_ids: Vec<Vec<GrainId>>,
    /// Mean orientation of each pixel's merged grain, `[w, x, y, z]`
    pub mean_orientations: Vec<Vec<[f64; 4]>>,
    pub twin_pairs: Vec<TwinPair>,
    pub summary: TwinMergeSummary,
}

impl From<&TwinMergeResult> for TwinMergeReport {
    fn from(result: &TwinMergeResult) -> Self {
        Self {
            merged_ids: result.merged_map.rows(),
            mean_orientations: result.mean_orientation_map.rows(),
            twin_pairs: result.twin_pairs.clone(),
            summary: result.summary,
        }
    }
}

impl TwinMergeReport {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the report; either the whole file appears or nothing does
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json_atomic(path.as_ref(), self)
    }
}

/// Removes the temporary file unless the write was committed
struct TempFileGuard {
    path: PathBuf,
    committed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(mut self, destination: &Path) -> Result<()> {
        fs::rename(&self.path, destination)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            debug!("removing partial output {}", self.path.display());
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `value` next to `path` and rename it into place
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let guard = TempFileGuard::new(temp_path_for(path));
    {
        let mut writer = BufWriter::new(File::create(&guard.path)?);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    guard.commit(path)
}

/// Merge the twins of one scan file and write the report.
///
/// The scan's own symmetry, when present, overrides `config.symmetry`.
pub fn merge_scan_file(
    input: &Path,
    output: &Path,
    config: &TwinMergeConfig,
) -> Result<TwinMergeSummary> {
    let scan = ScanFile::load(input)?;
    let mut config = config.clone();
    if let Some(symmetry) = scan.symmetry {
        config.symmetry = symmetry;
    }
    let neighbors = scan.neighbors.clone();
    let microstructure = scan.into_microstructure()?;

    let merger = TwinMerger::new(config)?;
    let result = match &neighbors {
        Some(adjacency) => merger.run(&microstructure, adjacency)?,
        None => merger.run_with_pixel_adjacency(&microstructure)?,
    };

    TwinMergeReport::from(&result).save(output)?;
    info!("wrote {}", output.display());
    Ok(result.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Unit, Vector3};
    use tempfile::tempdir;

    fn twin_scan() -> ScanFile {
        let g1 = Orientation::from_euler_bunge_deg([10.0, 20.0, 30.0]);
        let sigma3 = Rotation3::from_axis_angle(
            &Unit::new_normalize(Vector3::new(1.0, 1.0, 1.0)),
            60f64.to_radians(),
        );
        let g2 = Orientation::from_matrix(sigma3.matrix() * g1.matrix()).unwrap();
        let grain_ids = vec![1, 1, 2, 1, 2, 2];
        let quaternions = grain_ids
            .iter()
            .map(|&id| if id == 1 { g1.to_wxyz() } else { g2.to_wxyz() })
            .collect();
        ScanFile {
            height: 2,
            width: 3,
            grain_ids,
            orientations: ScanOrientations::Quaternions(quaternions),
            symmetry: None,
            neighbors: None,
            grain_orientations: None,
        }
    }

    #[test]
    fn test_scan_file_format() {
        let json = r#"{
            "height": 1,
            "width": 2,
            "grain_ids": [3, 0],
            "orientations": {"euler_bunge_deg": [[0.0, 0.0, 0.0], [90.0, 0.0, 0.0]]},
            "symmetry": "hexagonal",
            "neighbors": {"3": [0]}
        }"#;
        let scan: ScanFile = serde_json::from_str(json).unwrap();
        assert_eq!(scan.symmetry, Some(CrystalSymmetry::Hexagonal));
        assert!(matches!(scan.orientations, ScanOrientations::EulerBungeDeg(ref a) if a.len() == 2));

        let micro = scan.into_microstructure().unwrap();
        assert_eq!(micro.grain_map().shape(), (1, 2));
        assert_eq!(micro.orientations().valid_count(), 2);
    }

    #[test]
    fn test_invalid_grain_orientation_is_skipped() {
        let json = r#"{
            "height": 1,
            "width": 3,
            "grain_ids": [1, 2, 3],
            "orientations": {"quaternions": [[1, 0, 0, 0], [1, 0, 0, 0], [1, 0, 0, 0]]},
            "grain_orientations": {"1": [1, 0, 0, 0], "2": [0, 0, 0, 0], "3": [1, 0, 0, 0]}
        }"#;
        let scan: ScanFile = serde_json::from_str(json).unwrap();
        let micro = scan.into_microstructure().unwrap();
        let table = micro
            .grain_orientations(&CrystalSymmetry::Cubic.operator_set())
            .unwrap();
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![1, 3]);

        let dir = tempdir().unwrap();
        let input = dir.path().join("scan.json");
        let output = dir.path().join("merged.json");
        fs::write(&input, json).unwrap();
        let summary = merge_scan_file(&input, &output, &TwinMergeConfig::default()).unwrap();
        assert_eq!(summary.grains_after, 3);
        assert_eq!(TwinMergeReport::load(&output).unwrap().merged_ids, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_scan_shape_errors_propagate() {
        let mut scan = twin_scan();
        scan.grain_ids.pop();
        assert!(scan.into_microstructure().is_err());

        let mut scan = twin_scan();
        scan.height = usize::MAX / 2 + 1;
        scan.width = 2;
        scan.grain_ids.clear();
        scan.orientations = ScanOrientations::Quaternions(Vec::new());
        assert!(matches!(
            scan.into_microstructure(),
            Err(crate::TwinMergeError::ShapeOverflow { .. })
        ));
    }

    #[test]
    fn test_merge_scan_file_writes_report() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("scan.json");
        let output = dir.path().join("merged.json");
        fs::write(&input, serde_json::to_string(&twin_scan()).unwrap()).unwrap();

        let summary = merge_scan_file(&input, &output, &TwinMergeConfig::default()).unwrap();
        assert_eq!(summary.grains_before, 2);
        assert_eq!(summary.grains_after, 1);

        let report = TwinMergeReport::load(&output).unwrap();
        assert_eq!(report.merged_ids, vec![vec![1, 1, 1], vec![1, 1, 1]]);
        assert_eq!(report.mean_orientations.len(), 2);
        assert_eq!(report.mean_orientations[0].len(), 3);
        assert!(!temp_path_for(&output).exists());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("report.json");
        // JSON object keys must be strings
        let bad: BTreeMap<Vec<u8>, u8> = BTreeMap::from([(vec![1], 1)]);
        assert!(write_json_atomic(&output, &bad).is_err());
        assert!(!output.exists());
        assert!(!temp_path_for(&output).exists());
    }

    #[test]
    fn test_missing_input_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = merge_scan_file(
            &dir.path().join("absent.json"),
            &dir.path().join("out.json"),
            &TwinMergeConfig::default(),
        );
        assert!(matches!(result, Err(crate::TwinMergeError::Io(_))));
        assert!(!dir.path().join("out.json").exists());
    }
}
