use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::{Duration, Instant};
use touchcursor_core::{Configuration, Engine, KeyCode, KeyEdge};

fn make_engine(rollover_ms: u32) -> Engine {
    let mut config = Configuration::default();
    config.rollover_threshold_ms = rollover_ms;
    Engine::new(config)
}

fn press(engine: &mut Engine, key: KeyCode, edge: KeyEdge, t: Instant) {
    engine.track_modifiers(key, edge);
    black_box(engine.process_key(key, edge, t));
}

fn bench_unmapped_passthrough(c: &mut Criterion) {
    let mut engine = make_engine(50);
    let t0 = Instant::now();
    c.bench_function("engine/unmapped_key_passthrough", |b| {
        b.iter(|| {
            press(&mut engine, KeyCode::A, KeyEdge::Down, t0);
            press(&mut engine, KeyCode::A, KeyEdge::Up, t0);
        });
    });
}

fn bench_activation_tap(c: &mut Criterion) {
    let mut engine = make_engine(50);
    let t0 = Instant::now();
    c.bench_function("engine/activation_key_tap", |b| {
        b.iter(|| {
            press(&mut engine, KeyCode::SPACE, KeyEdge::Down, t0);
            press(&mut engine, KeyCode::SPACE, KeyEdge::Up, t0 + Duration::from_millis(80));
        });
    });
}

fn bench_mapped_arrow(c: &mut Criterion) {
    let mut engine = make_engine(50);
    let t0 = Instant::now();
    c.bench_function("engine/space_plus_j_to_left", |b| {
        b.iter(|| {
            press(&mut engine, KeyCode::SPACE, KeyEdge::Down, t0);
            press(&mut engine, KeyCode::J, KeyEdge::Down, t0 + Duration::from_millis(60));
            press(&mut engine, KeyCode::J, KeyEdge::Up, t0 + Duration::from_millis(90));
            press(&mut engine, KeyCode::SPACE, KeyEdge::Up, t0 + Duration::from_millis(120));
        });
    });
}

fn bench_rollover_fallback(c: &mut Criterion) {
    let mut engine = make_engine(50);
    let t0 = Instant::now();
    c.bench_function("engine/rollover_fallback", |b| {
        b.iter(|| {
            press(&mut engine, KeyCode::SPACE, KeyEdge::Down, t0);
            press(&mut engine, KeyCode::J, KeyEdge::Down, t0 + Duration::from_millis(20));
            press(&mut engine, KeyCode::J, KeyEdge::Up, t0 + Duration::from_millis(40));
            press(&mut engine, KeyCode::SPACE, KeyEdge::Up, t0 + Duration::from_millis(60));
        });
    });
}

criterion_group!(
    benches,
    bench_unmapped_passthrough,
    bench_activation_tap,
    bench_mapped_arrow,
    bench_rollover_fallback
);
criterion_main!(benches);
