use anyhow::Context;
use phantom_source::prelude::VoxelMap;
use phantom_source_examples::{init_tracing, render_map_slice_to_png};

// Usage: map-slice-png <map.raw> [slice] [--log]
fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let input = args.next().context("missing input map path")?;
    let rest: Vec<String> = args.collect();
    let log_scale = rest.iter().any(|a| a == "--log");

    let map = VoxelMap::load(&input).with_context(|| format!("loading {input}"))?;
    let [nx, ny, nz] = map.n_voxels();
    let [dx, dy, dz] = map.full_widths();
    tracing::info!(nx, ny, nz, dx, dy, dz, "Loaded map.");

    let slice = match rest.iter().find(|a| !a.starts_with("--")) {
        Some(s) => s.parse().with_context(|| format!("bad slice index '{s}'"))?,
        None => usize::from(nz) / 2,
    };
    let output = format!("{}.slice{slice}.png", input.trim_end_matches(".raw"));
    render_map_slice_to_png(&map, slice, log_scale, output)?;

    Ok(())
}
