use glam::DVec3;
use phantom_source::prelude::*;
use phantom_source_examples::{init_tracing, render_map_slice_to_png};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let phantom = JaszczakPhantom::default();
    let classifier = phantom.classifier()?;

    // 1 mm voxels covering the body with a little air around it.
    let config = VoxelMapConfig::new(DVec3::new(230.0, 230.0, 200.0), [230, 230, 200])
        .with_attribute(MapAttribute::Density)
        .with_threads(std::thread::available_parallelism().map_or(1, |n| n.get()));

    let exporter = VoxelMapExporter::try_new(config, &classifier)?;
    let map = exporter.export("jaszczak-density.raw")?;

    // Slices through the rod sectors and through the sphere ring.
    render_map_slice_to_png(&map, 50, false, "jaszczak-density-rods.png")?;
    render_map_slice_to_png(&map, 134, false, "jaszczak-density-spheres.png")?;

    Ok(())
}
