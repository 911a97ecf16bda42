use criterion::{black_box, criterion_group, criterion_main, Criterion};
use territory_core::{normalize, settle, Base, Owner, Scores, Team};

fn held_base() -> Base {
    Base {
        id: "base_1".into(),
        owner: Owner::Neutral,
        held_by: Some(Team::Red),
        last_interaction: 0,
        scores: Scores {
            red: 25.0,
            green: 5.0,
            blue: 5.0,
            yellow: 65.0,
        },
    }
}

fn bench_settle(c: &mut Criterion) {
    let base = held_base();
    c.bench_function("settle saturating", |b| {
        b.iter(|| settle(black_box(&base), black_box(4_000)))
    });
    let scores = settle(&base, 4_000);
    c.bench_function("normalize", |b| b.iter(|| normalize(black_box(&scores))));
}

criterion_group!(benches, bench_settle);
criterion_main!(benches);
