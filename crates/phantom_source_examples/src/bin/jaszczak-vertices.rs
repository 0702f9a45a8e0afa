use phantom_source::prelude::*;
use phantom_source_examples::{init_tracing, render_vertices_to_png, Projection, ProjectionConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let phantom = JaszczakPhantom::default();
    let mut generator = phantom.vertex_generator()?;
    let mut rng = StdRng::seed_from_u64(2025);

    let count = 200_000;
    let mut sink = VecSink::with_capacity(count);
    generate_primaries(&mut generator, &mut sink, count, &mut rng)?;
    generator.log_counters();

    let vertices = sink.into_inner();
    let half_extent = phantom.body_radius * 1.05;

    // Transverse view: rods and spheres overlap on the axis.
    let xy = ProjectionConfig::new((800, 800), half_extent);
    render_vertices_to_png(&vertices, &xy, "jaszczak-vertices-xy.png")?;

    // Side view: rods below, sphere ring above.
    let xz = ProjectionConfig::new((800, 800), half_extent).with_projection(Projection::Xz);
    render_vertices_to_png(&vertices, &xz, "jaszczak-vertices-xz.png")?;

    Ok(())
}
