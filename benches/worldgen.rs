use criterion::{criterion_group, criterion_main, Criterion};

use duskfell::{generate_campaign, ObjectDb, WorldConfig};

fn bench_campaign(c: &mut Criterion) {
    let mut cfg = WorldConfig::default();
    cfg.wilderness_size = 129;
    cfg.dungeon_depth = 3;

    c.bench_function("generate_campaign_129", |b| {
        b.iter(|| {
            let mut objects = ObjectDb::new();
            generate_campaign(42, &cfg, &mut objects).unwrap()
        })
    });
}

criterion_group!(benches, bench_campaign);
criterion_main!(benches);
