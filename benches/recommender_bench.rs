//! Benchmark suite for danci-recommender
//!
//! Run with: cargo bench

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use danci_recommender::{FeatureExtractor, RecommenderConfig, StudySessionRecord, TrainingOrchestrator};

fn synthetic_history(cards: i64, records_per_card: i64, seed: u64) -> Vec<StudySessionRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let mut records = Vec::with_capacity((cards * records_per_card) as usize);
    for card in 0..cards {
        let skill: f64 = rng.gen_range(0.2..0.95);
        for _ in 0..records_per_card {
            records.push(StudySessionRecord::new(
                card,
                rng.gen_bool(skill),
                rng.gen_range(0.5..6.0),
                now - Duration::minutes(rng.gen_range(0..60 * 24 * 60)),
            ));
        }
    }
    records
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_extract");
    let extractor = FeatureExtractor::new();
    for cards in [50i64, 200, 1000] {
        let history = synthetic_history(cards, 10, 1);
        group.bench_with_input(BenchmarkId::from_parameter(cards), &history, |b, history| {
            b.iter(|| black_box(extractor.extract(history)))
        });
    }
    group.finish();
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("train");
    group.sample_size(10);
    for cards in [50i64, 200] {
        let history = synthetic_history(cards, 10, 2);
        group.bench_with_input(BenchmarkId::from_parameter(cards), &history, |b, history| {
            b.iter(|| {
                let mut engine = TrainingOrchestrator::new(RecommenderConfig::default());
                black_box(engine.retrain(history))
            })
        });
    }
    group.finish();
}

fn bench_recommend(c: &mut Criterion) {
    let history = synthetic_history(200, 10, 3);
    let mut engine = TrainingOrchestrator::new(RecommenderConfig::default());
    engine.retrain(&history);

    c.bench_function("recommend_200_cards", |b| {
        b.iter(|| black_box(engine.get_recommendations(&history, 10)))
    });
}

criterion_group!(benches, bench_extract, bench_train, bench_recommend);
criterion_main!(benches);
