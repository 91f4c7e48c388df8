use criterion::{Criterion, black_box, criterion_group, criterion_main};

use keytrain::engine::PerformanceStats;
use keytrain::generator::registry::{SourceContext, StrategyRegistry};

const CHARS: &str = "chars=abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ.,;?!";

fn ctx() -> SourceContext {
    SourceContext {
        seed: Some(1),
        ..SourceContext::default()
    }
}

/// Stats with an uneven error spread over most of the pool.
fn make_stats() -> PerformanceStats {
    let mut stats = PerformanceStats::new();
    for (i, ch) in ('a'..='z').chain('A'..='Z').enumerate() {
        for _ in 0..50 {
            stats.add_hit(ch);
        }
        for _ in 0..(i % 9) {
            stats.add_error(ch);
        }
    }
    stats
}

fn bench_random_lines(c: &mut Criterion) {
    let registry = StrategyRegistry::new();
    let stats = PerformanceStats::new();
    let mut src = registry.create("generic_rand_lang", CHARS, &ctx()).unwrap();

    c.bench_function("generic_rand_lang line (60 chars)", |b| {
        b.iter(|| src.create(black_box(60), &stats))
    });
}

fn bench_adaptive_lines(c: &mut Criterion) {
    let registry = StrategyRegistry::new();
    let stats = make_stats();
    let mut src = registry.create("adapt_rand_lang", CHARS, &ctx()).unwrap();

    c.bench_function("adapt_rand_lang line (60 chars, 52 rated keys)", |b| {
        b.iter(|| src.create(black_box(60), &stats))
    });
}

fn bench_word_list_lines(c: &mut Criterion) {
    let registry = StrategyRegistry::new();
    let stats = PerformanceStats::new();
    let mut src = registry
        .create("word_list", "is_local=true;file_name=common_words.txt", &ctx())
        .unwrap();

    c.bench_function("word_list line (60 chars)", |b| {
        b.iter(|| src.create(black_box(60), &stats))
    });
}

criterion_group!(
    benches,
    bench_random_lines,
    bench_adaptive_lines,
    bench_word_list_lines
);
criterion_main!(benches);
