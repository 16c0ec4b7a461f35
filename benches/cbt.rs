use cbt::{ReductionConfig, Tree};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
#[cfg(feature = "parallel")]
use rayon::ThreadPoolBuilder;
use std::hint::black_box;

fn bench_reduce(c: &mut Criterion, max_depth: i32) {
    let mut group = c.benchmark_group(format!("reduce/max_depth_{max_depth}"));
    group.throughput(Throughput::Elements(1u64 << max_depth));

    let mut tree = Tree::create_at_depth(max_depth, max_depth).unwrap();
    tree.set_reduction_config(ReductionConfig { parallel_threshold: usize::MAX });
    group.bench_function("sequential", |b| {
        b.iter(|| {
            black_box(&tree).reduce();
        });
    });

    #[cfg(feature = "parallel")]
    {
        // Repeated initialization is not supported, ignore errors here because of it.
        let _ = ThreadPoolBuilder::new().build_global();

        tree.set_reduction_config(ReductionConfig { parallel_threshold: 0 });
        group.bench_function("parallel", |b| {
            b.iter(|| {
                black_box(&tree).reduce();
            });
        });
    }

    group.finish();
}

fn bench_decode_encode(c: &mut Criterion, max_depth: i32) {
    let mut group = c.benchmark_group(format!("decode_encode/max_depth_{max_depth}"));
    let tree = Tree::create_at_depth(max_depth, max_depth).unwrap();
    let node_count = tree.node_count();

    group.throughput(Throughput::Elements(1));
    group.bench_function("decode", |b| {
        b.iter(|| {
            black_box(tree.decode(black_box(node_count / 3)));
        });
    });

    let node = tree.decode(node_count / 3);
    group.bench_function("encode", |b| {
        b.iter(|| {
            black_box(tree.encode(black_box(node)));
        });
    });

    group.finish();
}

fn bench_split_merge(c: &mut Criterion, max_depth: i32) {
    let mut group = c.benchmark_group(format!("split_merge/max_depth_{max_depth}"));
    let tree = Tree::create_at_depth(max_depth, (max_depth - 1).max(0)).unwrap();
    let leaf = tree.decode(0);

    group.throughput(Throughput::Elements(1));
    group.bench_function("split_fast", |b| {
        b.iter(|| {
            black_box(&tree).split_fast(black_box(leaf));
            black_box(&tree).merge_fast(black_box(leaf));
        });
    });

    group.finish();
}

fn criterion_benchmark(c: &mut Criterion) {
    for max_depth in [12, 18, 24] {
        bench_reduce(c, max_depth);
        bench_decode_encode(c, max_depth);
        bench_split_merge(c, max_depth);
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
