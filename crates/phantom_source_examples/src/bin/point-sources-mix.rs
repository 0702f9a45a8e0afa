use phantom_source::prelude::*;
use phantom_source_examples::{init_tracing, render_vertices_to_png, Projection, ProjectionConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Spatial-resolution point sources for a 1 m axial field of view, sharing
    // a quarter of the vertices with a hot-sphere Jaszczak phantom.
    let points = PointSources::spatial_resolution(1000.0)?;
    let phantom = JaszczakPhantom::default()
        .with_rod_activity(0.0)
        .with_body_activity(0.05);
    let mut mix = SourceMix::new(vec![
        (Box::new(points) as Box<dyn VertexSource>, 1.0),
        (Box::new(phantom.vertex_generator()?) as Box<dyn VertexSource>, 3.0),
    ])?;

    let mut rng = StdRng::seed_from_u64(7);
    let mut sink = VecSink::new();
    generate_primaries(&mut mix, &mut sink, 100_000, &mut rng)?;

    let yz = ProjectionConfig::new((900, 900), 450.0)
        .with_projection(Projection::Yz)
        .with_color([120, 220, 255]);
    render_vertices_to_png(sink.as_slice(), &yz, "point-sources-mix-yz.png")?;

    Ok(())
}
