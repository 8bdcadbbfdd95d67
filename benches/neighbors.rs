use cellcorr::{BruteForceQuery, CellGrid, NeighborList, NeighborQuery, PeriodicBox, QueryArgs, random_system};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const SIZES: [usize; 4] = [1_000, 10_000, 50_000, 200_000];

// Fixed number density of 1, so the box grows with N.
fn system(n: usize) -> (PeriodicBox, Vec<[f64; 3]>) {
    let simbox = PeriodicBox::cube((n as f64).cbrt()).unwrap();
    let points = random_system(&simbox, n, 42).unwrap();
    (simbox, points)
}

fn benchmark_grid_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_build");
    group.sample_size(10);

    for &size in &SIZES {
        let (simbox, points) = system(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| CellGrid::new(simbox, black_box(&points), 2.0).unwrap())
        });
    }
    group.finish();
}

fn benchmark_ball_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("ball_query");
    group.sample_size(10);
    let args = QueryArgs::ball(2.0).with_exclude_ii(true);

    for &size in &SIZES {
        let (simbox, points) = system(size);
        let grid = CellGrid::new(simbox, &points, 2.0).unwrap();

        group.bench_with_input(BenchmarkId::new("serial", size), &size, |b, _| {
            b.iter(|| grid.query_all(black_box(&points), &args).unwrap().len())
        });
        group.bench_with_input(BenchmarkId::new("neighbor_list", size), &size, |b, _| {
            b.iter(|| NeighborList::from_query(&grid, black_box(&points), &args).unwrap().len())
        });
    }
    group.finish();
}

fn benchmark_nearest_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_query");
    group.sample_size(10);

    for k in [1, 6, 12, 24] {
        let (simbox, points) = system(10_000);
        let grid = CellGrid::new(simbox, &points, 1.5).unwrap();
        let args = QueryArgs::nearest(k, f64::INFINITY).with_exclude_ii(true);
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, _| {
            b.iter(|| NeighborList::from_query(&grid, black_box(&points), &args).unwrap().len())
        });
    }
    group.finish();
}

fn benchmark_grid_vs_brute_force(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_vs_brute_force");
    group.sample_size(10);
    let args = QueryArgs::ball(1.5);

    for size in [100, 1_000, 4_000] {
        let (simbox, points) = system(size);
        let grid = CellGrid::new(simbox, &points, 1.5).unwrap();
        let brute = BruteForceQuery::new(simbox, &points).unwrap();

        group.bench_with_input(BenchmarkId::new("grid", size), &size, |b, _| {
            b.iter(|| grid.query_all(black_box(&points), &args).unwrap().len())
        });
        group.bench_with_input(BenchmarkId::new("brute_force", size), &size, |b, _| {
            b.iter(|| brute.query_all(black_box(&points), &args).unwrap().len())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_grid_build,
    benchmark_ball_query,
    benchmark_nearest_query,
    benchmark_grid_vs_brute_force
);
criterion_main!(benches);
