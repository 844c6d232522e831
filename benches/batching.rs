use criterion::{criterion_group, criterion_main, Criterion, black_box};

use voxview::render::batch::{InstanceBatcher, RenderMode};
use voxview::scene::SceneGraph;
use voxview::voxel::{RegionBounds, Voxel, VoxelMap};

/// Solid cube of `size`^3 voxels with a colour gradient
fn create_test_map(size: u32) -> VoxelMap {
    let mut voxels = Vec::with_capacity((size * size * size) as usize);
    for x in 0..size {
        for y in 0..size {
            for z in 0..size {
                let color = [(x * 255 / size) as u8, (y * 255 / size) as u8, (z * 255 / size) as u8];
                voxels.push(Voxel::new(x as f32 * 0.1, y as f32 * 0.1, z as f32 * 0.1, color));
            }
        }
    }
    VoxelMap::new(voxels, 0.1).expect("valid resolution")
}

fn bench_batch_raw_32(c: &mut Criterion) {
    let map = create_test_map(32);

    c.bench_function("batch_raw_32", |b| {
        b.iter(|| InstanceBatcher::build(black_box(&map.deselect()), RenderMode::Raw));
    });
}

fn bench_batch_shaded_32(c: &mut Criterion) {
    let map = create_test_map(32);

    c.bench_function("batch_shaded_32", |b| {
        b.iter(|| InstanceBatcher::build(black_box(&map.deselect()), RenderMode::Shaded));
    });
}

fn bench_select_half_32(c: &mut Criterion) {
    let map = create_test_map(32);
    let region = RegionBounds::new(0.0, 1.6, 0.0, 1.6, 0.0, 3.2);

    c.bench_function("select_half_32", |b| {
        b.iter(|| map.select(black_box(&region)).len());
    });
}

fn bench_scene_rebuild_32(c: &mut Criterion) {
    let map = create_test_map(32);
    let mut scene = SceneGraph::new();

    c.bench_function("scene_rebuild_flatten_32", |b| {
        b.iter(|| {
            scene.apply_payload(InstanceBatcher::build(&map.deselect(), RenderMode::Shaded));
            scene.flatten().voxels.len()
        });
    });
}

criterion_group!(
    benches,
    bench_batch_raw_32,
    bench_batch_shaded_32,
    bench_select_half_32,
    bench_scene_rebuild_32,
);
criterion_main!(benches);
