use std::collections::{BTreeMap, HashMap};

use crate::errors::TwinMergeError;
use crate::interfaces::GrainId;
use crate::microstructure::GrainMap;
use crate::Result;

/// Disjoint-set forest over grain ids, weighted by pixel count.
///
/// Invariants: every parent chain ends at a root `r` with `parent[r] == r`,
/// and a root's size is the pixel count of its whole cluster. Ids must be
/// registered up front; operations on unknown ids fail instead of creating
/// new singletons.
#[derive(Debug, Clone, Default)]
pub struct GrainUnionFind {
    parent: HashMap<GrainId, GrainId>,
    size: HashMap<GrainId, usize>,
}

impl GrainUnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// One singleton per label of `map`, sized by its pixel count
    pub fn from_grain_map(map: &GrainMap) -> Self {
        let mut forest = Self::new();
        for (id, count) in map.pixel_counts() {
            forest.insert(id, count);
        }
        forest
    }

    /// Register a singleton set. Returns `false` if the id was already known.
    pub fn insert(&mut self, id: GrainId, size: usize) -> bool {
        if self.parent.contains_key(&id) {
            return false;
        }
        self.parent.insert(id, id);
        self.size.insert(id, size);
        true
    }

    pub fn contains(&self, id: GrainId) -> bool {
        self.parent.contains_key(&id)
    }

    /// Number of registered ids
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Root of `id`'s set, compressing the traversed chain onto the root
    pub fn find(&mut self, id: GrainId) -> Result<GrainId> {
        let mut root = id;
        loop {
            let parent = *self
                .parent
                .get(&root)
                .ok_or(TwinMergeError::UnknownGrainId(root))?;
            if parent == root {
                break;
            }
            root = parent;
        }

        let mut current = id;
        while current != root {
            match self.parent.insert(current, root) {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(root)
    }

    /// Merge the sets of `x` and `y`; returns the surviving root.
    ///
    /// The smaller cluster is attached below the larger one. On equal sizes
    /// the root of `x` survives.
    pub fn union(&mut self, x: GrainId, y: GrainId) -> Result<GrainId> {
        let x_root = self.find(x)?;
        let y_root = self.find(y)?;
        if x_root == y_root {
            return Ok(x_root);
        }

        let x_size = self.root_size(x_root);
        let y_size = self.root_size(y_root);
        let (survivor, absorbed) = if x_size < y_size {
            (y_root, x_root)
        } else {
            (x_root, y_root)
        };
        self.parent.insert(absorbed, survivor);
        self.size.insert(survivor, x_size + y_size);
        Ok(survivor)
    }

    /// Pixel count of the cluster containing `id`
    pub fn cluster_size(&mut self, id: GrainId) -> Result<usize> {
        let root = self.find(id)?;
        Ok(self.root_size(root))
    }

    fn root_size(&self, root: GrainId) -> usize {
        self.size.get(&root).copied().unwrap_or_default()
    }

    /// Current roots in ascending order
    pub fn roots(&self) -> Vec<GrainId> {
        let mut roots: Vec<GrainId> = self
            .parent
            .iter()
            .filter(|(id, parent)| id == parent)
            .map(|(&id, _)| id)
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Final root of every registered id, resolved before any relabelling
    pub fn root_table(&mut self) -> Result<BTreeMap<GrainId, GrainId>> {
        let mut ids: Vec<GrainId> = self.parent.keys().copied().collect();
        ids.sort_unstable();
        let mut table = BTreeMap::new();
        for id in ids {
            let root = self.find(id)?;
            table.insert(id, root);
        }
        Ok(table)
    }
}
