use glam::DVec3;
use phantom_source::prelude::*;
use phantom_source_examples::{init_tracing, render_map_slice_to_png};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // A liquid-xenon ring detector: cryostat walls, quartz windows and a
    // vacuum gap around an air-filled bore.
    let mut tree = VolumeTree::new("World", Solid::cuboid(DVec3::splat(500.0)), Material::air());
    let shells = [
        ("Cryostat", 450.0, Material::stainless_steel()),
        ("LXe", 430.0, Material::liquid_xenon()),
        ("Window", 360.0, Material::quartz()),
        ("Vacuum", 350.0, Material::galactic()),
        ("InnerWall", 340.0, Material::stainless_steel()),
        ("Bore", 330.0, Material::air()),
    ];
    let mut parent = tree.world();
    for (name, radius, material) in shells {
        parent = tree.place(name, Solid::cylinder(radius, 200.0), material, parent)?;
    }
    tree.close()?;
    let classifier = SpatialClassifier::from_provider(tree)?;

    let table = AttenuationTable::at_511_kev();
    let config = VoxelMapConfig::new(DVec3::new(1000.0, 1000.0, 500.0), [250, 250, 5])
        .with_attribute(MapAttribute::Attenuation)
        .with_threads(4);
    let map = VoxelMapExporter::try_new(config, &classifier)?
        .with_attenuation(&table)
        .export("detector-attenuation.raw")?;

    render_map_slice_to_png(&map, 2, true, "detector-attenuation.png")?;

    Ok(())
}
