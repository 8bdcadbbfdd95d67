use cellcorr::{CellGrid, CorrelationFunction, NeighborList, PeriodicBox, PmftXy2d, QueryArgs, Rdf, random_system};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use num_complex::Complex64;

const SIZES: [usize; 3] = [1_000, 10_000, 100_000];

fn benchmark_rdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("rdf");
    group.sample_size(10);

    for &size in &SIZES {
        let simbox = PeriodicBox::cube((size as f64).cbrt()).unwrap();
        let points = random_system(&simbox, size, 1).unwrap();
        let grid = CellGrid::new(simbox, &points, 2.5).unwrap();
        let args = QueryArgs::ball(2.5).with_exclude_ii(true);

        group.bench_with_input(BenchmarkId::new("search", size), &size, |b, _| {
            let mut rdf = Rdf::new(50, 2.5, 0.0).unwrap();
            b.iter(|| {
                rdf.accumulate(&grid, black_box(&points), None, &args).unwrap();
                rdf.rdf()[0]
            })
        });

        let nlist = NeighborList::from_query(&grid, &points, &args).unwrap();
        group.bench_with_input(BenchmarkId::new("neighbor_list", size), &size, |b, _| {
            let mut rdf = Rdf::new(50, 2.5, 0.0).unwrap();
            b.iter(|| {
                rdf.accumulate(&grid, black_box(&points), Some(&nlist), &args).unwrap();
                rdf.rdf()[0]
            })
        });
    }
    group.finish();
}

fn benchmark_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_function");
    group.sample_size(10);

    for &size in &SIZES {
        let simbox = PeriodicBox::cube((size as f64).cbrt()).unwrap();
        let points = random_system(&simbox, size, 2).unwrap();
        let grid = CellGrid::new(simbox, &points, 2.5).unwrap();
        let args = QueryArgs::ball(2.5).with_exclude_ii(true);

        let real: Vec<f64> = (0..size).map(|i| (i as f64).cos()).collect();
        group.bench_with_input(BenchmarkId::new("f64", size), &size, |b, _| {
            let mut cf = CorrelationFunction::<f64>::new(50, 2.5).unwrap();
            b.iter(|| {
                cf.accumulate(&grid, Some(&real), &points, Some(&real), None, &args)
                    .unwrap();
                cf.correlation()[0]
            })
        });

        let complex: Vec<Complex64> = (0..size).map(|i| Complex64::from_polar(1.0, i as f64)).collect();
        group.bench_with_input(BenchmarkId::new("complex", size), &size, |b, _| {
            let mut cf = CorrelationFunction::<Complex64>::new(50, 2.5).unwrap();
            b.iter(|| {
                cf.accumulate(&grid, Some(&complex), &points, Some(&complex), None, &args)
                    .unwrap();
                cf.correlation()[0]
            })
        });
    }
    group.finish();
}

fn benchmark_pmft(c: &mut Criterion) {
    let mut group = c.benchmark_group("pmft_xy2d");
    group.sample_size(10);

    for &size in &SIZES {
        let simbox = PeriodicBox::square((size as f64).sqrt()).unwrap();
        let points = random_system(&simbox, size, 3).unwrap();
        let orientations: Vec<f64> = (0..size).map(|i| i as f64 * 0.01).collect();
        let grid = CellGrid::new(simbox, &points, 3.0).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            let mut pmft = PmftXy2d::new(2.0, 2.0, 40, 40).unwrap();
            b.iter(|| {
                pmft.accumulate(&grid, &orientations, black_box(&points), None, None)
                    .unwrap();
                pmft.pcf()[0]
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_rdf, benchmark_correlation, benchmark_pmft);
criterion_main!(benches);
