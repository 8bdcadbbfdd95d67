use cellcorr::{CellGrid, NeighborList, PeriodicBox, QueryArgs, Rdf, random_system};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

const N_POINTS: usize = 200_000;

fn benchmark_parallelism(c: &mut Criterion) {
    let simbox = PeriodicBox::cube((N_POINTS as f64).cbrt()).unwrap();
    let points = random_system(&simbox, N_POINTS, 7).unwrap();
    let grid = CellGrid::new(simbox, &points, 2.5).unwrap();
    let args = QueryArgs::ball(2.5).with_exclude_ii(true);

    let mut group = c.benchmark_group(format!("parallelism_{}k", N_POINTS / 1000));
    group.sample_size(10);

    let max_cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
    let mut cores_list = Vec::new();
    let mut cores = 1;
    while cores <= max_cores {
        cores_list.push(cores);
        cores *= 2;
    }
    if cores_list.last().is_some_and(|&last| last < max_cores) {
        cores_list.push(max_cores);
    }

    for &num_threads in &cores_list {
        // Create a thread pool for this specific number of threads
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("rdf", num_threads), &num_threads, |b, _| {
            let mut rdf = Rdf::new(100, 2.5, 0.0).unwrap();
            b.iter(|| {
                pool.install(|| {
                    rdf.accumulate(&grid, &points, None, &args).unwrap();
                    rdf.rdf()[0]
                })
            })
        });

        group.bench_with_input(BenchmarkId::new("neighbor_list", num_threads), &num_threads, |b, _| {
            b.iter(|| pool.install(|| NeighborList::from_query(&grid, &points, &args).unwrap().len()))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_parallelism);
criterion_main!(benches);
