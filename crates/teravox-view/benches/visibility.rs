use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{DMat4, DVec2, UVec3};
use teravox_view::required_blocks_for_screen;

/// Full-grid enumeration cost for a screen box covering half the volume.
fn bench_required_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("required_blocks");
    for grid in [16u32, 32, 64] {
        let block_size = UVec3::splat(8);
        let grid_dims = UVec3::splat(grid);
        let extent = (grid_dims * block_size).as_dvec3();
        // Screen x covers source x in [0, extent / 2].
        let source_to_screen = DMat4::from_scale(glam::DVec3::new(
            1280.0 / extent.x * 2.0,
            720.0 / extent.y,
            1.0,
        ));

        group.bench_with_input(BenchmarkId::from_parameter(grid), &grid, |b, _| {
            b.iter(|| {
                required_blocks_for_screen(
                    &source_to_screen,
                    DVec2::new(1280.0, 720.0),
                    extent.z,
                    block_size,
                    grid_dims,
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_required_blocks);
criterion_main!(benches);
