/// Example merging a small synthetic twinned microstructure
///
/// Grain 1 is the parent, grain 2 a Σ3 twin lamella through it and grain 3
/// an unrelated neighbour. After merging, grains 1 and 2 share one label and
/// one mean orientation.
use nalgebra::{Rotation3, Unit, Vector3};
use twin_merge::config::TwinMergeConfig;
use twin_merge::microstructure::{GrainMap, Microstructure, OrientationMap};
use twin_merge::orientation::{misorientation, Orientation};
use twin_merge::twins::TwinMerger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Sigma-3 twin merging ===\n");

    let parent = Orientation::from_euler_bunge_deg([30.0, 45.0, 10.0]);
    let sigma3 = Rotation3::from_axis_angle(
        &Unit::new_normalize(Vector3::new(1.0, 1.0, 1.0)),
        60f64.to_radians(),
    );
    let twin = parent.apply_symmetry(sigma3.matrix());
    let neighbour = Orientation::from_euler_bunge_deg([100.0, 20.0, 70.0]);

    let rows = vec![
        vec![1, 1, 2, 1, 3, 3],
        vec![1, 1, 2, 1, 3, 3],
        vec![1, 1, 2, 1, 3, 3],
    ];
    let grain_map = GrainMap::from_rows(&rows)?;
    let pixels = grain_map
        .ids()
        .iter()
        .map(|id| match id {
            1 => Some(parent),
            2 => Some(twin),
            _ => Some(neighbour),
        })
        .collect();
    let orientations = OrientationMap::new(grain_map.height(), grain_map.width(), pixels)?;
    let micro = Microstructure::new(grain_map, orientations)?;

    let merger = TwinMerger::new(TwinMergeConfig::default())?;
    let m = misorientation(&parent, &twin, merger.symmetry());
    println!(
        "1. Parent/twin disorientation: {:.2}° about [{:.3}, {:.3}, {:.3}]",
        m.angle_deg(),
        m.axis.x,
        m.axis.y,
        m.axis.z
    );

    let result = merger.run_with_pixel_adjacency(&micro)?;
    println!("2. Twin pairs found: {:?}", result.twin_pairs);
    println!("3. Merged grain map:");
    for row in result.merged_map.rows() {
        println!("   {row:?}");
    }
    println!("4. Mean orientations:");
    for (id, orientation) in result.mean_orientations.iter() {
        let q = orientation.to_wxyz();
        println!(
            "   grain {id}: [{:.4}, {:.4}, {:.4}, {:.4}]",
            q[0], q[1], q[2], q[3]
        );
    }
    println!(
        "\n{} grains -> {} grains",
        result.summary.grains_before, result.summary.grains_after
    );
    Ok(())
}
