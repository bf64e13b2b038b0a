use criterion::{criterion_group, criterion_main, Criterion};
use sim_core::{Catalog, ChampionEntry, ChampionId, RoundInput, RoundState, SkinChoice};

fn bench_resolve_round(c: &mut Criterion) {
    let entries = (0..160)
        .map(|i| ChampionEntry {
            id: ChampionId(format!("Champion{i}")),
            pick_rate: 0.05 + (i as f64 % 20.0) / 25.0,
            saturation: (i as f64 % 7.0) * 0.3,
        })
        .collect();
    let catalog = Catalog::new(entries).unwrap();
    let state = RoundState::bootstrap(&catalog);
    let input = RoundInput {
        budget: 500_000.0,
        marketing_investment: 20_000.0,
        theme_value: 4,
        skin_choices: (0..8)
            .map(|i| SkinChoice {
                champion: ChampionId(format!("Champion{}", i * 17)),
                tier: (i % 8) as u8 + 1,
            })
            .collect(),
    };
    c.bench_function("resolve_round", |b| {
        b.iter(|| {
            let _ = sim_econ::resolve_round(&catalog, &state, &input);
        })
    });
}

criterion_group!(benches, bench_resolve_round);
criterion_main!(benches);
