#[cfg(test)]
mod _tests_microstructure {
    use super::super::adjacency::*;
    use super::super::ebsd_map::Microstructure;
    use super::super::grain_map::GrainMap;
    use super::super::orientation_map::OrientationMap;
    use crate::errors::TwinMergeError;
    use crate::interfaces::{Connectivity, GrainAdjacency};
    use crate::orientation::Orientation;
    use crate::symmetries::CrystalSymmetry;
    use std::collections::BTreeMap;

    fn sample_map() -> GrainMap {
        // 1 1 2
        // 1 3 2
        // 0 3 3
        GrainMap::from_rows(&[vec![1, 1, 2], vec![1, 3, 2], vec![0, 3, 3]]).unwrap()
    }

    // ==================== GrainMap ====================

    #[test]
    fn test_grain_map_shape_and_lookup() {
        let map = sample_map();
        assert_eq!(map.shape(), (3, 3));
        assert_eq!(map.get(0, 2), Some(2));
        assert_eq!(map.get(2, 0), Some(0));
        assert_eq!(map.get(3, 0), None);
        assert_eq!(map.rows()[1], vec![1, 3, 2]);
    }

    #[test]
    fn test_grain_map_rejects_bad_shapes() {
        assert!(matches!(
            GrainMap::new(2, 2, vec![1, 2, 3]),
            Err(TwinMergeError::ShapeMismatch { expected: 4, actual: 3, .. })
        ));
        assert!(GrainMap::from_rows(&[vec![1, 2], vec![3]]).is_err());
    }

    #[test]
    fn test_oversized_shapes_are_rejected() {
        let huge = usize::MAX / 2 + 1;
        assert!(matches!(
            GrainMap::new(huge, 2, Vec::new()),
            Err(TwinMergeError::ShapeOverflow { width: 2, .. })
        ));
        assert!(matches!(
            OrientationMap::new(2, huge, Vec::new()),
            Err(TwinMergeError::ShapeOverflow { height: 2, .. })
        ));
    }

    #[test]
    fn test_pixel_counts_and_unique_ids() {
        let map = sample_map();
        assert_eq!(map.unique_ids(), vec![0, 1, 2, 3]);
        let counts = map.pixel_counts();
        assert_eq!(counts[&1], 3);
        assert_eq!(counts[&2], 2);
        assert_eq!(counts[&3], 3);
        assert_eq!(counts[&0], 1);
    }

    #[test]
    fn test_relabel_keeps_shape() {
        let map = sample_map();
        let merged = map.relabel(|id| if id == 3 { 1 } else { id });
        assert_eq!(merged.shape(), map.shape());
        assert_eq!(merged.unique_ids(), vec![0, 1, 2]);
    }

    // ==================== Adjacency ====================

    #[test]
    fn test_four_connected_adjacency() {
        let adjacency = PixelAdjacency::from_grain_map(&sample_map(), Connectivity::Four);
        assert_eq!(adjacency.neighbors(1), vec![0, 2, 3]);
        assert_eq!(adjacency.neighbors(2), vec![1, 3]);
        assert_eq!(adjacency.neighbors(3), vec![0, 1, 2]);
        assert!(adjacency.are_adjacent(2, 1));
        assert!(adjacency.neighbors(42).is_empty());
    }

    #[test]
    fn test_eight_connectivity_adds_diagonals() {
        // 1 2
        // 3 4
        let map = GrainMap::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        let four = PixelAdjacency::from_grain_map(&map, Connectivity::Four);
        let eight = PixelAdjacency::from_grain_map(&map, Connectivity::Eight);
        assert!(!four.are_adjacent(1, 4));
        assert!(!four.are_adjacent(2, 3));
        assert!(eight.are_adjacent(1, 4));
        assert!(eight.are_adjacent(2, 3));
        assert_eq!(eight.grain_count(), 4);
    }

    #[test]
    fn test_neighbor_lists_are_symmetrized() {
        let mut lists = BTreeMap::new();
        lists.insert(1, vec![2, 1]);
        lists.insert(3, vec![]);
        let adjacency = NeighborList::from(lists);
        assert_eq!(adjacency.neighbors(1), vec![2]);
        assert_eq!(adjacency.neighbors(2), vec![1]);
        assert!(adjacency.neighbors(3).is_empty());

        let json = serde_json::to_string(&adjacency).unwrap();
        let back: NeighborList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, adjacency);
    }

    // ==================== Orientation maps ====================

    #[test]
    fn test_invalid_quaternions_become_unindexed() {
        let quats = [[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0], [f64::NAN, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
        let map = OrientationMap::from_quaternions(2, 2, &quats).unwrap();
        assert_eq!(map.valid_count(), 2);
        assert!(map.get(0, 1).is_none());
        assert!(map.get(1, 1).is_some());
        assert!(OrientationMap::from_quaternions(3, 2, &quats).is_err());
    }

    #[test]
    fn test_euler_map() {
        let angles = [[0.0, 0.0, 0.0], [f64::INFINITY, 0.0, 0.0]];
        let map = OrientationMap::from_euler_bunge_deg(1, 2, &angles).unwrap();
        assert_eq!(map.valid_count(), 1);
    }

    #[test]
    fn test_partition_keeps_grains_without_valid_pixels() {
        let grains = GrainMap::from_rows(&[vec![1, 2]]).unwrap();
        let orientations =
            OrientationMap::from_quaternions(1, 2, &[[1.0, 0.0, 0.0, 0.0], [0.0; 4]]).unwrap();
        let groups = orientations.partition_by(&grains).unwrap();
        assert_eq!(groups[&1].len(), 1);
        assert!(groups[&2].is_empty());

        let wrong = GrainMap::from_rows(&[vec![1], vec![2]]).unwrap();
        assert!(matches!(
            orientations.partition_by(&wrong),
            Err(TwinMergeError::MapShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_grain_orientations_skip_background_and_empty_grains() {
        let cubic = CrystalSymmetry::Cubic.operator_set();
        let grains = GrainMap::from_rows(&[vec![0, 1, 1, 2]]).unwrap();
        let q = Orientation::from_euler_bunge_deg([10.0, 20.0, 30.0]).to_wxyz();
        let orientations =
            OrientationMap::from_quaternions(1, 4, &[q, q, q, [0.0; 4]]).unwrap();
        let micro = Microstructure::new(grains, orientations).unwrap();
        let representatives = micro.grain_orientations(&cubic).unwrap();
        assert_eq!(representatives.keys().copied().collect::<Vec<_>>(), vec![1]);

        let explicit = BTreeMap::from([(2, Orientation::identity())]);
        let micro = micro.with_grain_orientations(explicit.clone());
        assert_eq!(micro.grain_orientations(&cubic).unwrap(), explicit);
    }

    #[test]
    fn test_microstructure_shape_check() {
        let grains = GrainMap::from_rows(&[vec![1, 2]]).unwrap();
        let orientations = OrientationMap::from_quaternions(2, 1, &[[1.0, 0.0, 0.0, 0.0]; 2]).unwrap();
        assert!(Microstructure::new(grains, orientations).is_err());
    }
}
