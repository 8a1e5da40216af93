use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wordbloom_core::{BloomFilter, FilterConfig, Preset};

fn words(n: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| (0..rng.random_range(6..14)).map(|_| rng.random_range(b'a'..=b'z')).collect())
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let corpus = words(20_000);
    let queries = words(5_000);
    let cfg: FilterConfig = Preset::OnePercent.config(corpus.len() as u64).unwrap();
    let built = BloomFilter::build(cfg.clone(), &corpus).unwrap();

    c.bench_function("build", |b| b.iter(|| black_box(BloomFilter::build(cfg.clone(), &corpus).unwrap())));
    c.bench_function("build_parallel", |b| {
        b.iter(|| black_box(BloomFilter::build_parallel(cfg.clone(), &corpus).unwrap()))
    });
    c.bench_function("may_contain", |b| {
        b.iter(|| queries.iter().filter(|w| built.may_contain(black_box(w))).count())
    });
}

criterion_group!(benches, bench_filter);
criterion_main!(benches);
