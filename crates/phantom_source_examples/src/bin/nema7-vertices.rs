use phantom_source::prelude::*;
use phantom_source_examples::{init_tracing, render_vertices_to_png, ProjectionConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let phantom = Nema7Phantom::standard();
    let mut source = phantom.vertex_source()?;
    for (region, share) in source.region_shares() {
        tracing::info!(?region, share, "Region share.");
    }

    let mut rng = StdRng::seed_from_u64(7);
    let mut sink = VecSink::new();
    generate_primaries(&mut source, &mut sink, 300_000, &mut rng)?;

    // Hot spheres on the ring, cold spheres and the lung insert as holes.
    let xy = ProjectionConfig::new((800, 800), phantom.outer_radius * 1.05);
    render_vertices_to_png(sink.as_slice(), &xy, "nema7-vertices-xy.png")?;

    Ok(())
}
