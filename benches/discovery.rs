use criterion::{criterion_group, criterion_main, Criterion, black_box};

use treefell::discovery::{DiscoveryJob, DiscoveryOptions};
use treefell::felling::group_adjacent;
use treefell::host::MemoryHost;
use treefell::inspection::{InspectionCache, ReconcileJob};
use treefell::voxel::{Coord, InclusionRules, VoxelGrid};

const LOG: &str = "minecraft:oak_log";

/// 2x2 trunk with a wide crown of branches
fn big_tree() -> MemoryHost {
    let mut host = MemoryHost::new();
    for (x, z) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        host.place_column(Coord::new(x, 0, z), 30, LOG);
    }
    for arm in 0..8 {
        let (dx, dz) = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, 1), (1, -1), (-1, -1)][arm];
        for step in 1..12 {
            host.place_block(Coord::new(dx * step, 20 + arm as i32, dz * step), LOG);
        }
    }
    host
}

fn discover(host: &mut MemoryHost, rules: &InclusionRules) -> usize {
    let origin = Coord::new(0, 0, 0);
    let voxel = host.resolve(origin);
    DiscoveryJob::new(origin, &voxel, DiscoveryOptions::default())
        .run_to_completion(host, rules)
        .map_or(0, |outcome| outcome.into_result().size())
}

fn bench_discovery_big_tree(c: &mut Criterion) {
    let mut host = big_tree();
    let rules = InclusionRules::default();

    c.bench_function("discovery_big_tree", |b| {
        b.iter(|| discover(black_box(&mut host), &rules));
    });
}

fn bench_reconcile_unchanged(c: &mut Criterion) {
    let mut host = big_tree();
    let rules = InclusionRules::default();
    let origin = Coord::new(0, 0, 0);
    let voxel = host.resolve(origin);
    let result = DiscoveryJob::new(origin, &voxel, DiscoveryOptions::default())
        .run_to_completion(&mut host, &rules)
        .map(|outcome| outcome.into_result());
    let Some(result) = result else {
        return;
    };

    c.bench_function("reconcile_unchanged", |b| {
        b.iter(|| {
            let mut cache = InspectionCache::new();
            let id = cache.push(result.clone(), false, 0);
            ReconcileJob::new(&cache, id, origin)
                .map(|job| job.run_to_completion(&mut cache, &mut host, &rules, false, 1))
        });
    });
}

fn bench_group_adjacent(c: &mut Criterion) {
    let coords: Vec<Coord> = (0..16)
        .flat_map(|x| (0..16).flat_map(move |z| (0..8).map(move |y| Coord::new(x, y * 2 + (x + z) % 2, z))))
        .collect();

    c.bench_function("group_adjacent_2k", |b| {
        b.iter(|| group_adjacent(black_box(coords.iter().copied()), 1));
    });
}

criterion_group!(
    benches,
    bench_discovery_big_tree,
    bench_reconcile_unchanged,
    bench_group_adjacent,
);
criterion_main!(benches);
