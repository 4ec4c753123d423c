use std::collections::BTreeMap;

use log::debug;

use crate::errors::TwinMergeError;
use crate::interfaces::GrainId;
use crate::microstructure::grain_map::{pixel_count, GrainMap};
use crate::orientation::Orientation;
use crate::Result;

/// H×W map of per-pixel orientations.
///
/// Pixels whose raw data could not be turned into a valid orientation are
/// kept as `None` and ignored downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationMap {
    height: usize,
    width: usize,
    pixels: Vec<Option<Orientation>>,
}

impl OrientationMap {
    pub fn new(height: usize, width: usize, pixels: Vec<Option<Orientation>>) -> Result<Self> {
        let expected = pixel_count(height, width)?;
        if pixels.len() != expected {
            return Err(TwinMergeError::ShapeMismatch {
                height,
                width,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            height,
            width,
            pixels,
        })
    }

    /// Build from scalar-first quaternions; invalid entries become `None`
    pub fn from_quaternions(height: usize, width: usize, quaternions: &[[f64; 4]]) -> Result<Self> {
        let pixels: Vec<Option<Orientation>> = quaternions
            .iter()
            .map(|&q| Orientation::from_wxyz(q).ok())
            .collect();
        let map = Self::new(height, width, pixels)?;
        let invalid = map.len() - map.valid_count();
        if invalid > 0 {
            debug!("{invalid} of {} pixels carry no valid orientation", map.len());
        }
        Ok(map)
    }

    /// Build from Bunge Euler angles in degrees; non-finite entries become `None`
    pub fn from_euler_bunge_deg(height: usize, width: usize, angles: &[[f64; 3]]) -> Result<Self> {
        let pixels = angles
            .iter()
            .map(|a| {
                a.iter()
                    .all(|x| x.is_finite())
                    .then(|| Orientation::from_euler_bunge_deg(*a))
            })
            .collect();
        Self::new(height, width, pixels)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Orientation> {
        if row < self.height && col < self.width {
            self.pixels[row * self.width + col].as_ref()
        } else {
            None
        }
    }

    pub fn pixels(&self) -> &[Option<Orientation>] {
        &self.pixels
    }

    pub fn valid_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_some()).count()
    }

    /// Valid orientations grouped by the label each pixel has in `labels`.
    ///
    /// Every label of the map gets an entry, even when none of its pixels is valid.
    pub fn partition_by(&self, labels: &GrainMap) -> Result<BTreeMap<GrainId, Vec<Orientation>>> {
        if labels.shape() != self.shape() {
            return Err(TwinMergeError::MapShapeMismatch {
                grain_shape: labels.shape(),
                orientation_shape: self.shape(),
            });
        }
        let mut groups: BTreeMap<GrainId, Vec<Orientation>> = BTreeMap::new();
        for (&id, pixel) in labels.ids().iter().zip(&self.pixels) {
            let group = groups.entry(id).or_default();
            if let Some(orientation) = pixel {
                group.push(*orientation);
            }
        }
        Ok(groups)
    }
}
