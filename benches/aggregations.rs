//! Aggregation and scoring benchmarks
//!
//! - Pivoting coherence records into the `k × configuration` matrix
//! - Decoding artifact paths during discovery
//! - NPMI coherence over a synthetic reference corpus
//!
//! Run with: cargo bench --bench aggregations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use topic_grid::corpus::Vocabulary;
use topic_grid::experiment::{
    ArtifactPathCodec, CoherenceRecord, HyperparameterCombination, HyperparameterGrid, PriorMode,
};
use topic_grid::model::{CoherenceScorer, NpmiCoherence, TopicTermModel};
use topic_grid::report::CoherenceMatrix;

const SMALL_GRID: u32 = 20; // reference sweep: 2..=20
const LARGE_GRID: u32 = 200;

#[allow(clippy::cast_precision_loss)]
fn records(max_k: u32) -> Vec<CoherenceRecord> {
    HyperparameterGrid::new(
        2..=max_k,
        [PriorMode::Auto, PriorMode::Symmetric],
        [42, 99],
        [5, 10, 15, 20],
        [200],
    )
    .unwrap()
    .combinations()
    .iter()
    .enumerate()
    .map(|(i, c)| CoherenceRecord::new(c, 0.5 + (i % 30) as f64 / 1000.0))
    .collect()
}

/// Benchmark pivoting records into the coherence matrix
fn bench_pivot(c: &mut Criterion) {
    let mut group = c.benchmark_group("coherence_matrix_pivot");

    for max_k in [SMALL_GRID, LARGE_GRID] {
        let data = records(max_k);
        group.bench_with_input(BenchmarkId::new("from_records", data.len()), &data, |b, data| {
            b.iter(|| CoherenceMatrix::from_records(black_box(data), Some(2..=max_k)));
        });

        let matrix = CoherenceMatrix::from_records(&data, None);
        group.bench_with_input(BenchmarkId::new("best", data.len()), &matrix, |b, matrix| {
            b.iter(|| black_box(matrix).best());
        });
    }

    group.finish();
}

/// Benchmark artifact path decoding
fn bench_decode(c: &mut Criterion) {
    let codec = ArtifactPathCodec::new("models");
    let paths: Vec<_> = records(SMALL_GRID)
        .iter()
        .map(|r| codec.encode(&r.combination().unwrap()))
        .collect();

    c.bench_function("codec_decode_reference_grid", |b| {
        b.iter(|| {
            for path in black_box(&paths) {
                black_box(codec.decode(path).unwrap());
            }
        });
    });
}

/// Benchmark NPMI coherence on 500 documents
fn bench_npmi(c: &mut Criterion) {
    let texts: Vec<Vec<String>> = (0..500)
        .map(|i| (0..80).filter(|j| (i + j) % 7 != 0).map(|j| format!("w{j}")).collect())
        .collect();
    let vocabulary = Vocabulary::from_documents(&texts);
    let combination = HyperparameterCombination::new(8, PriorMode::Auto, 42, 5, 200).unwrap();
    let topics = (0..8)
        .map(|t| (0..10).map(|w| (format!("w{}", t * 10 + w), 0.1)).collect())
        .collect();
    let model = TopicTermModel::new(combination, topics);
    let scorer = NpmiCoherence::default();

    c.bench_function("npmi_8_topics_500_docs", |b| {
        b.iter(|| scorer.score(black_box(&model), &texts, &vocabulary).unwrap());
    });
}

criterion_group!(benches, bench_pivot, bench_decode, bench_npmi);
criterion_main!(benches);
