#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};

// Rasterization iterations run for tens of milliseconds; fewer, longer samples.
pub const SAMPLE_SIZE: usize = 15;
pub const WARM_UP: Duration = Duration::from_millis(500);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

/// Throughput in draws, vertices or voxels per iteration.
pub fn per_iteration(count: usize) -> Throughput {
    Throughput::Elements(count.max(1) as u64)
}

/// Throughput of one full sweep over a grid of `n_voxels`.
pub fn voxels(n_voxels: [u16; 3]) -> Throughput {
    per_iteration(n_voxels.iter().map(|n| usize::from(*n)).product())
}
