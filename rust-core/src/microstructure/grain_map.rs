use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::TwinMergeError;
use crate::interfaces::GrainId;
use crate::Result;

/// Number of pixels of an H×W map
pub(crate) fn pixel_count(height: usize, width: usize) -> Result<usize> {
    height
        .checked_mul(width)
        .ok_or(TwinMergeError::ShapeOverflow { height, width })
}

/// H×W map of grain labels, stored row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrainMap {
    height: usize,
    width: usize,
    ids: Vec<GrainId>,
}

impl GrainMap {
    pub fn new(height: usize, width: usize, ids: Vec<GrainId>) -> Result<Self> {
        let expected = pixel_count(height, width)?;
        if ids.len() != expected {
            return Err(TwinMergeError::ShapeMismatch {
                height,
                width,
                expected,
                actual: ids.len(),
            });
        }
        Ok(Self { height, width, ids })
    }

    /// Build from nested rows; every row must have the same length
    pub fn from_rows(rows: &[Vec<GrainId>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let ids: Vec<GrainId> = rows.iter().flatten().copied().collect();
        if rows.iter().any(|row| row.len() != width) {
            return Err(TwinMergeError::ShapeMismatch {
                height,
                width,
                expected: height.saturating_mul(width),
                actual: ids.len(),
            });
        }
        Self::new(height, width, ids)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<GrainId> {
        if row < self.height && col < self.width {
            Some(self.ids[row * self.width + col])
        } else {
            None
        }
    }

    /// Row-major pixel labels
    pub fn ids(&self) -> &[GrainId] {
        &self.ids
    }

    pub fn rows(&self) -> Vec<Vec<GrainId>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.ids.chunks(self.width).map(<[GrainId]>::to_vec).collect()
    }

    /// Distinct labels in ascending order
    pub fn unique_ids(&self) -> Vec<GrainId> {
        self.pixel_counts().into_keys().collect()
    }

    /// Number of pixels carrying each label
    pub fn pixel_counts(&self) -> BTreeMap<GrainId, usize> {
        let mut counts = BTreeMap::new();
        for &id in &self.ids {
            *counts.entry(id).or_insert(0) += 1;
        }
        counts
    }

    /// New map of the same shape with every label passed through `f`
    pub fn relabel<F>(&self, mut f: F) -> Self
    where
        F: FnMut(GrainId) -> GrainId,
    {
        Self {
            height: self.height,
            width: self.width,
            ids: self.ids.iter().map(|&id| f(id)).collect(),
        }
    }
}
