#[cfg(test)]
mod _tests_pipeline {
    use super::super::mean_orientation_map::*;
    use super::super::pair_collector::*;
    use super::super::pipeline::*;
    use crate::config::TwinMergeConfig;
    use crate::errors::TwinMergeError;
    use crate::interfaces::{Connectivity, GrainId};
    use crate::microstructure::{
        GrainMap, Microstructure, NeighborList, OrientationMap, PixelAdjacency,
    };
    use crate::orientation::{misorientation, Orientation, TwinCriterion};
    use crate::symmetries::CrystalSymmetry;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
    use std::collections::BTreeMap;

    const TOL: f64 = 1e-9;

    fn rotation(axis: [f64; 3], angle_deg: f64) -> Matrix3<f64> {
        Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::from(axis)), angle_deg.to_radians())
            .into_inner()
    }

    fn parent() -> Orientation {
        Orientation::from_euler_bunge_deg([10.0, 20.0, 30.0])
    }

    fn twin_of(g: &Orientation) -> Orientation {
        Orientation::from_matrix(rotation([1.0, 1.0, 1.0], 60.0) * g.matrix()).unwrap()
    }

    fn rotated_about_z(g: &Orientation, angle_deg: f64) -> Orientation {
        Orientation::from_matrix(rotation([0.0, 0.0, 1.0], angle_deg) * g.matrix()).unwrap()
    }

    /// Build a microstructure whose pixels take the orientation of their grain
    fn microstructure(rows: &[Vec<GrainId>], grains: &[(GrainId, Orientation)]) -> Microstructure {
        let grain_map = GrainMap::from_rows(rows).unwrap();
        let lookup: BTreeMap<GrainId, Orientation> = grains.iter().copied().collect();
        let pixels = grain_map
            .ids()
            .iter()
            .map(|id| lookup.get(id).copied())
            .collect();
        let orientations =
            OrientationMap::new(grain_map.height(), grain_map.width(), pixels).unwrap();
        Microstructure::new(grain_map, orientations).unwrap()
    }

    fn merger() -> TwinMerger {
        TwinMerger::new(TwinMergeConfig::default()).unwrap()
    }

    fn assert_unit_and_uniform(result: &TwinMergeResult) {
        let mut per_grain: BTreeMap<GrainId, [f64; 4]> = BTreeMap::new();
        for (id, q) in result
            .merged_map
            .ids()
            .iter()
            .zip(result.mean_orientation_map.pixels())
        {
            let norm = q.iter().map(|c| c * c).sum::<f64>().sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-9);
            assert!(q[0] >= 0.0);
            let first = per_grain.entry(*id).or_insert(*q);
            assert_eq!(*first, *q);
        }
    }

    // ==================== End to end ====================

    #[test]
    fn test_two_twins_merge_into_the_first_grain() {
        let g1 = parent();
        let micro = microstructure(&[vec![1, 1, 2], vec![1, 2, 2]], &[(1, g1), (2, twin_of(&g1))]);
        let result = merger().run_with_pixel_adjacency(&micro).unwrap();

        assert_eq!(result.merged_map.rows(), vec![vec![1, 1, 1], vec![1, 1, 1]]);
        assert_eq!(result.twin_pairs.len(), 2);
        assert_eq!(result.twin_pairs[0].grain_id, 1);
        assert_eq!(result.twin_pairs[0].neighbor_id, 2);
        assert_eq!(result.summary.grains_before, 2);
        assert_eq!(result.summary.grains_after, 1);
        assert_eq!(result.summary.unindexed_pixels, 0);
        assert_eq!(result.mean_orientation_map.shape(), (2, 3));
        assert_unit_and_uniform(&result);
    }

    #[test]
    fn test_non_adjacent_twins_are_not_merged() {
        let g1 = parent();
        let micro = microstructure(&[vec![1, 0, 2]], &[(1, g1), (2, twin_of(&g1))]);
        let result = merger().run_with_pixel_adjacency(&micro).unwrap();
        assert!(result.twin_pairs.is_empty());
        assert_eq!(result.merged_map, *micro.grain_map());

        // explicit neighbour lists follow the same rule
        let result = merger().run(&micro, &NeighborList::default()).unwrap();
        assert!(result.twin_pairs.is_empty());
    }

    #[test]
    fn test_low_angle_neighbors_are_not_merged() {
        let g1 = parent();
        let micro = microstructure(&[vec![1, 2]], &[(1, g1), (2, rotated_about_z(&g1, 5.0))]);
        let result = merger().run_with_pixel_adjacency(&micro).unwrap();
        assert_eq!(result.summary.grains_after, 2);
    }

    #[test]
    fn test_relabelled_pixels_match_roots() {
        let g1 = parent();
        let g3 = rotated_about_z(&g1, 5.0);
        let rows = [vec![3, 1, 1, 2], vec![3, 1, 2, 2]];
        let micro = microstructure(&rows, &[(1, g1), (2, twin_of(&g1)), (3, g3)]);
        let result = merger().run_with_pixel_adjacency(&micro).unwrap();

        for (original, merged) in micro.grain_map().ids().iter().zip(result.merged_map.ids()) {
            assert_eq!(result.roots[original], *merged);
        }
        let mut roots: Vec<GrainId> = result.roots.values().copied().collect();
        roots.sort_unstable();
        roots.dedup();
        assert_eq!(result.merged_map.unique_ids(), roots);
        assert_eq!(roots, vec![1, 3]);
        assert_unit_and_uniform(&result);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let g1 = parent();
        let g3 = rotated_about_z(&g1, 5.0);
        let rows = [vec![3, 1, 1, 2], vec![3, 1, 2, 2]];
        let micro = microstructure(&rows, &[(1, g1), (2, twin_of(&g1)), (3, g3)]);
        let first = merger().run_with_pixel_adjacency(&micro).unwrap();

        let again = Microstructure::new(first.merged_map.clone(), micro.orientations().clone()).unwrap();
        let second = merger().run_with_pixel_adjacency(&again).unwrap();
        assert!(second.twin_pairs.is_empty());
        assert_eq!(second.merged_map, first.merged_map);
    }

    #[test]
    fn test_explicit_grain_orientations_drive_the_search() {
        let g1 = parent();
        // the pixels say "unrelated", the segmentation says "twins"
        let micro = microstructure(&[vec![1, 2]], &[(1, g1), (2, rotated_about_z(&g1, 5.0))])
            .with_grain_orientations(BTreeMap::from([(1, g1), (2, twin_of(&g1))]));
        let result = merger().run_with_pixel_adjacency(&micro).unwrap();
        assert_eq!(result.merged_map.unique_ids(), vec![1]);
    }

    #[test]
    fn test_eight_connectivity_finds_diagonal_twins() {
        let g1 = parent();
        let rows = [vec![1, 0], vec![0, 2]];
        let micro = microstructure(&rows, &[(1, g1), (2, twin_of(&g1))]);

        let four = merger().run_with_pixel_adjacency(&micro).unwrap();
        assert_eq!(four.summary.grains_after, 2);

        let config = TwinMergeConfig {
            connectivity: Connectivity::Eight,
            ..TwinMergeConfig::default()
        };
        let eight = TwinMerger::new(config).unwrap().run_with_pixel_adjacency(&micro).unwrap();
        assert_eq!(eight.summary.grains_after, 1);
    }

    #[test]
    fn test_grain_without_valid_pixels_is_left_alone() {
        let g1 = parent();
        // grain 2 has no indexed pixel; 3 is a twin of 1
        let rows = [vec![2, 1, 3], vec![2, 1, 3]];
        let micro = microstructure(&rows, &[(1, g1), (3, twin_of(&g1))]);
        let result = merger().run_with_pixel_adjacency(&micro).unwrap();

        assert_eq!(result.merged_map.rows(), vec![vec![2, 1, 1], vec![2, 1, 1]]);
        assert_eq!(result.roots[&2], 2);
        assert!(result.twin_pairs.iter().all(|p| p.grain_id != 2 && p.neighbor_id != 2));
        assert_eq!(result.summary.grains_after, 2);
        assert_eq!(result.summary.unindexed_pixels, 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TwinMergeConfig {
            angle_tolerance_deg: -1.0,
            ..TwinMergeConfig::default()
        };
        assert!(matches!(TwinMerger::new(config), Err(TwinMergeError::InvalidConfig(_))));
    }

    // ==================== Pair collection ====================

    #[test]
    fn test_pairs_come_in_grain_then_neighbor_order() {
        let g1 = parent();
        let g2 = twin_of(&g1);
        // 0 is background, 5 has no orientation
        let grain_map = GrainMap::from_rows(&[vec![0, 1, 2, 3, 4, 5]]).unwrap();
        let orientations = BTreeMap::from([(1, g1), (2, g2), (3, g1), (4, g2)]);
        let adjacency = PixelAdjacency::from_grain_map(&grain_map, Connectivity::Four);
        let cubic = CrystalSymmetry::Cubic.operator_set();

        let pairs = collect_twin_pairs(
            &grain_map.unique_ids(),
            &orientations,
            &adjacency,
            &cubic,
            &TwinCriterion::sigma3(),
        );
        let expected: Vec<TwinPair> = [(1, 2), (2, 1), (2, 3), (3, 2), (3, 4), (4, 3)]
            .into_iter()
            .map(|(a, b)| TwinPair::new(a, b))
            .collect();
        assert_eq!(pairs, expected);
    }

    // ==================== Mean orientations ====================

    #[test]
    fn test_mean_table_covers_every_label() {
        let g1 = parent();
        let grain_map = GrainMap::from_rows(&[vec![0, 1, 2]]).unwrap();
        let orientations =
            OrientationMap::new(1, 3, vec![Some(rotated_about_z(&g1, 40.0)), Some(g1), None]).unwrap();
        let cubic = CrystalSymmetry::Cubic.operator_set();

        let table = compute_mean_orientations(&grain_map, &orientations, &cubic, true).unwrap();
        assert_eq!(table.len(), 3);
        // no valid pixel: identity
        assert_abs_diff_eq!(*table.get(2).unwrap().matrix(), Matrix3::identity(), epsilon = TOL);
        assert!(misorientation(table.get(1).unwrap(), &g1, &cubic).angle < 1e-6);
        assert!(misorientation(table.get(0).unwrap(), &g1, &cubic).angle > 0.1);

        let table = compute_mean_orientations(&grain_map, &orientations, &cubic, false).unwrap();
        assert!((table.get(0).unwrap().matrix() - Matrix3::identity()).amax() < TOL);
    }

    #[test]
    fn test_broadcast_fills_every_pixel() {
        let grain_map = GrainMap::from_rows(&[vec![1, 2], vec![2, 2]]).unwrap();
        let g1 = parent();
        let table: MeanOrientationTable =
            [(1, g1), (2, Orientation::identity())].into_iter().collect();
        let map = broadcast_mean_orientations(&grain_map, &table).unwrap();
        assert_eq!(map.get(0, 0), Some(g1.to_wxyz()));
        assert_eq!(map.get(1, 1), Some([1.0, 0.0, 0.0, 0.0]));
        assert_eq!(map.get(2, 0), None);
        assert_eq!(map.rows().len(), 2);
    }

    #[test]
    fn test_broadcast_rejects_incomplete_tables() {
        let grain_map = GrainMap::from_rows(&[vec![1, 2]]).unwrap();
        let mut table = MeanOrientationTable::new();
        table.insert(1, parent());
        let result = broadcast_mean_orientations(&grain_map, &table);
        assert!(matches!(result, Err(TwinMergeError::IncompleteMeanOrientationTable(2))));
    }
}
