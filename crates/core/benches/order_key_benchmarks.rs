use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use lineup_core::{SortKey, key_between};

/// Naive positional ordering: integer indices that must be rewritten on insert.
#[derive(Debug, Clone)]
struct IndexedList {
    positions: Vec<u64>,
}

impl IndexedList {
    fn with_len(n: usize) -> Self {
        Self {
            positions: (0..n as u64).collect(),
        }
    }

    /// Insert at `at`, renumbering every later row (what the order key avoids).
    fn insert(&mut self, at: usize) -> usize {
        let mut rewrites = 0;
        for p in self.positions.iter_mut().skip(at) {
            *p += 1;
            rewrites += 1;
        }
        self.positions.insert(at, at as u64);
        rewrites + 1
    }
}

fn append_keys(n: usize) -> Vec<SortKey> {
    let mut keys = Vec::with_capacity(n);
    let mut last: Option<SortKey> = None;
    for _ in 0..n {
        let k = key_between(last.as_ref(), None).expect("append key");
        keys.push(k.clone());
        last = Some(k);
    }
    keys
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_key_append");
    for n in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(append_keys(n)));
        });
    }
    group.finish();
}

fn bench_bisect_front(c: &mut Criterion) {
    // Worst case for key growth: every insert lands just after the first key.
    let mut group = c.benchmark_group("order_key_bisect_front");
    for depth in [10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let lower = key_between(None, None).expect("first key");
                let mut upper = key_between(Some(&lower), None).expect("second key");
                for _ in 0..depth {
                    upper = key_between(Some(&lower), Some(&upper)).expect("bisect");
                }
                black_box(upper)
            });
        });
    }
    group.finish();
}

fn bench_move_vs_renumber(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_to_front");
    for n in [100usize, 1_000, 10_000] {
        let keys = append_keys(n);
        group.bench_with_input(BenchmarkId::new("order_key", n), &keys, |b, keys| {
            b.iter(|| black_box(key_between(None, keys.first()).expect("front key")));
        });
        group.bench_with_input(BenchmarkId::new("renumber", n), &n, |b, &n| {
            b.iter_batched(
                || IndexedList::with_len(n),
                |mut list| black_box(list.insert(0)),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_append, bench_bisect_front, bench_move_vs_renumber);
criterion_main!(benches);
