//! Benchmarks for the FDTD time-stepping engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use fdtd_engine::arrays::Dimensions;
use fdtd_engine::fdtd::{Engine, EngineType, Operator};

fn bench_operator(nx: usize, ny: usize, nz: usize) -> Operator {
    let mut op = Operator::new(Dimensions::new(nx, ny, nz), 1e-12).unwrap();
    // Lossless cavity with a small curl gain, so the sweep touches every
    // coefficient array without the fields blowing up.
    op.set_uniform_coefficients(1.0, 0.05, 1.0, 0.05);
    op
}

fn bench_iterate(c: &mut Criterion) {
    let sizes = [(16, 16, 16), (32, 32, 32), (64, 64, 64)];

    for (nx, ny, nz) in sizes {
        let op = bench_operator(nx, ny, nz);
        let total_cells = (nx * ny * nz) as u64;

        let mut group = c.benchmark_group(format!("fdtd_{}x{}x{}", nx, ny, nz));
        group.throughput(Throughput::Elements(total_cells));
        group.sample_size(20);

        group.bench_function("basic", |b| {
            let mut engine =
                Engine::new_in(&op, EngineType::Basic, std::env::temp_dir()).unwrap();
            engine.set_volt(2, nx / 2, ny / 2, nz / 2, 1.0);
            b.iter(|| {
                engine.iterate(1);
                black_box(&engine);
            });
        });

        group.bench_function("parallel", |b| {
            let mut engine =
                Engine::new_in(&op, EngineType::Parallel, std::env::temp_dir()).unwrap();
            engine.set_volt(2, nx / 2, ny / 2, nz / 2, 1.0);
            b.iter(|| {
                engine.iterate(1);
                black_box(&engine);
            });
        });

        group.finish();
    }
}

criterion_group!(benches, bench_iterate);
criterion_main!(benches);
