use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ndarray::Array3;
use xsvs::{Xsvs, XsvsBuilder};
use xsvs_test::{banded_label_map, random_series};

fn push_series(plan: &Xsvs, frames: &Array3<f64>) -> Vec<u64> {
    let mut cascade = plan.cascade().unwrap();
    for (i, frame) in frames.outer_iter().enumerate() {
        cascade.push_frame(i, frame).unwrap();
    }
    cascade.finish().frames_per_level().to_vec()
}

fn criterion_benchmark(c: &mut Criterion) {
    let n_frames = 128_usize;
    let mut group = c.benchmark_group("cascade");
    for side in [16_usize, 32, 64, 128].into_iter() {
        let label_map = banded_label_map([side, side], 4);
        let frames = random_series([n_frames, side, side], 6, 2525365464_u64);
        let plan = XsvsBuilder::new()
            .frames_per_series(n_frames as u64)
            .max_count(6)
            .build(label_map.view())
            .unwrap();

        group.throughput(Throughput::Elements((n_frames * side * side) as u64));
        group.bench_with_input(BenchmarkId::new("base2", side), &frames, |b, frames| {
            b.iter(|| push_series(&plan, frames))
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
