#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{
    init_tracing, render_map_slice_to_png, render_vertices_to_png, Projection, ProjectionConfig,
};
