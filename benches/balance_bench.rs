//! Balancing cost for eleven-a-side pools, plus one full three-run variant generation.
//!
//! Run with: `cargo bench --bench balance`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use calciotto::balance::{balance_greedy_local, balance_random_seeded, DEFAULT_MAX_SWAP_ROUNDS};
use calciotto::data::format::MatchFormat;
use calciotto::data::player::{RatedPlayer, SkillRatings};
use calciotto::notify::NoopPublisher;
use calciotto::variants::{GenerationConfig, InMemoryStore, VariantService};

fn pool(count: usize) -> Vec<RatedPlayer> {
    (0..count)
        .filter_map(|i| {
            let r = |offset: usize| ((i * 7 + offset * 3) % 5 + 1) as u8;
            RatedPlayer::new(
                format!("p{i:02}"),
                SkillRatings {
                    defense: r(0),
                    attack: r(1),
                    speed: r(2),
                    power: r(3),
                    technique: r(4),
                    shot: r(5),
                },
            )
            .ok()
        })
        .collect()
}

fn bench_algorithms(c: &mut Criterion) {
    let players = pool(22);

    let mut group = c.benchmark_group("balance_11v11");
    group.bench_function("random_seeded", |b| {
        b.iter(|| black_box(balance_random_seeded(&players, 11, black_box(42))))
    });
    group.bench_function("greedy_local", |b| {
        b.iter(|| {
            black_box(balance_greedy_local(
                &players,
                11,
                black_box(42),
                DEFAULT_MAX_SWAP_ROUNDS,
            ))
        })
    });
    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let service = VariantService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(NoopPublisher),
        GenerationConfig {
            base_seed: Some(42),
            ..GenerationConfig::default()
        },
    );
    let record = service
        .create_match(MatchFormat::ElevenASide, None)
        .expect("match should be created");
    for player in pool(22) {
        service
            .sign_up(record.id, &player.id, Some(player.ratings))
            .expect("signup should succeed");
    }

    c.bench_function("generate_variants_11v11", |b| {
        b.iter(|| black_box(service.generate(record.id).expect("generation should succeed")))
    });
}

criterion_group!(benches, bench_algorithms, bench_generation);
criterion_main!(benches);
