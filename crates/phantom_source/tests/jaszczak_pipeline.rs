use glam::DVec3;
use phantom_source::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn coarse_config(attribute: MapAttribute) -> VoxelMapConfig {
    VoxelMapConfig::new(DVec3::new(240.0, 240.0, 200.0), [24, 24, 20])
        .with_attribute(attribute)
        .with_threads(3)
}

#[test]
fn density_map_export_round_trips_through_disk() {
    let phantom = JaszczakPhantom::default();
    let classifier = phantom.classifier().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jaszczak-density.raw");

    let exporter = VoxelMapExporter::try_new(coarse_config(MapAttribute::Density), &classifier)
        .unwrap();
    let written = exporter.export(&path).unwrap();
    let loaded = VoxelMap::load(&path).unwrap();
    assert_eq!(loaded, written);
    assert_eq!(loaded.n_voxels(), [24, 24, 20]);

    let bytes = std::fs::metadata(&path).unwrap().len();
    assert_eq!(bytes, 6 + 12 + 4 * 24 * 24 * 20);

    // The central voxel sits in water, the corners in air.
    assert_eq!(loaded.get(12, 12, 10), Some(1000.0));
    assert_eq!(loaded.get(0, 0, 0), Some(1.20479f64 as f32));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn attenuation_map_scales_density() {
    let phantom = JaszczakPhantom::default();
    let classifier = phantom.classifier().unwrap();
    let table = AttenuationTable::at_511_kev();

    let density = VoxelMapExporter::try_new(coarse_config(MapAttribute::Density), &classifier)
        .unwrap()
        .rasterize()
        .unwrap();
    let attenuation =
        VoxelMapExporter::try_new(coarse_config(MapAttribute::Attenuation), &classifier)
            .unwrap()
            .with_attenuation(&table)
            .rasterize()
            .unwrap();

    let water = attenuation.get(12, 12, 10).unwrap();
    assert!((f64::from(water) - 1000.0 * 0.00969).abs() < 1e-4);
    assert!(attenuation.data().iter().zip(density.data()).all(|(mu, rho)| {
        (*mu == 0.0) == (*rho == 0.0)
    }));
}

#[test]
fn vertices_flow_from_generator_into_sink() {
    let phantom = JaszczakPhantom::default();
    let classifier = phantom.classifier().unwrap();
    let mut generator = phantom.vertex_generator().unwrap();
    let mut sink = VecSink::new();
    let mut rng = StdRng::seed_from_u64(2024);

    generate_primaries(&mut generator, &mut sink, 500, &mut rng).unwrap();
    assert_eq!(sink.len(), 500);

    let mut rods = 0usize;
    for vertex in sink.as_slice() {
        assert_eq!(vertex.time, 0.0);
        let name = classifier.classify(vertex.position).unwrap().name;
        assert_ne!(name, "Body");
        if name.starts_with("Rod") {
            rods += 1;
        }
    }
    // Rods carry twice the activity of spheres and far more volume.
    assert!(rods > 250, "only {rods} rod vertices");
    assert_eq!(generator.counters().total_kept(), 500);
}

#[test]
fn mixture_of_phantom_and_point_sources() {
    let phantom = JaszczakPhantom::default();
    let generator = phantom.vertex_generator().unwrap();
    let points = PointSources::spatial_resolution(200.0).unwrap();
    let mut mix = SourceMix::new(vec![
        (Box::new(generator) as Box<dyn VertexSource>, 3.0),
        (Box::new(points) as Box<dyn VertexSource>, 1.0),
    ])
    .unwrap();

    let mut rng = StdRng::seed_from_u64(77);
    let mut on_axis_plane = 0usize;
    let n = 4_000;
    for _ in 0..n {
        let v = mix.generate_vertex(&mut rng).unwrap();
        if v.x == 0.0 && [10.0, 100.0, 200.0].contains(&v.y) {
            on_axis_plane += 1;
        }
    }
    let share = on_axis_plane as f64 / n as f64;
    assert!((share - 0.25).abs() < 0.04, "point source share {share}");
}
