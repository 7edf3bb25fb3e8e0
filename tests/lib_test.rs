//! Tests for top-level Pipeline API

use topic_grid::config::HeatmapRange;
use topic_grid::document::MemoryDocumentStore;
use topic_grid::{Error, Pipeline, PipelineConfig};

#[test]
fn test_pipeline_builder_defaults() {
    let pipeline = Pipeline::builder(MemoryDocumentStore::new()).build();
    assert!(pipeline.is_ok(), "Pipeline build with defaults should succeed");

    let pipeline = pipeline.unwrap();
    assert_eq!(pipeline.config(), &PipelineConfig::default());
    assert_eq!(pipeline.codec().root().to_str(), Some("models"));
    assert_eq!(pipeline.npmi_scorer().top_n(), 10);
}

#[test]
fn test_pipeline_builder_chain() {
    let pipeline = Pipeline::builder(MemoryDocumentStore::new())
        .models_dir("/data/models")
        .corpus_dir("/data/files")
        .output_dir("/data/output")
        .build()
        .unwrap();

    assert_eq!(pipeline.codec().root().to_str(), Some("/data/models"));
    assert_eq!(pipeline.config().corpus_dir.to_str(), Some("/data/files"));
    assert_eq!(pipeline.config().output_dir.to_str(), Some("/data/output"));
}

#[test]
fn test_pipeline_builder_with_config() {
    let config = PipelineConfig {
        top_n_words: 20,
        heatmap_k_range: HeatmapRange { min_k: 5, max_k: 10 },
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::builder(MemoryDocumentStore::new())
        .config(config)
        .build()
        .unwrap();

    assert_eq!(pipeline.npmi_scorer().top_n(), 20);
    assert_eq!(pipeline.config().heatmap_k_range.range(), 5..=10);
}

#[test]
fn test_pipeline_builder_rejects_invalid_config() {
    let mut config = PipelineConfig::default();
    config.pruning.no_above = 0.0;
    let result = Pipeline::builder(MemoryDocumentStore::new()).config(config).build();
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[tokio::test]
async fn test_empty_store_reports_empty_matrix() {
    let pipeline = Pipeline::builder(MemoryDocumentStore::new()).build().unwrap();
    let matrix = pipeline.coherence_matrix().await.unwrap();
    assert!(matrix.is_empty());
    assert_eq!(matrix.topic_counts().len(), 19);
    assert!(matrix.best().is_none());
}

#[tokio::test]
async fn test_evaluate_without_corpus_is_fatal() {
    use topic_grid::model::{JsonModelPersistence, TopicTermModel};

    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::builder(MemoryDocumentStore::new())
        .corpus_dir(dir.path().join("files"))
        .models_dir(dir.path().join("models"))
        .build()
        .unwrap();

    let err = pipeline
        .evaluate(&JsonModelPersistence::<TopicTermModel>::new(), &pipeline.npmi_scorer())
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}
