//! # topic-grid: Resumable LDA Grid Search and Coherence Scoring
//!
//! **Version**: 0.1.0
//!
//! topic-grid sweeps a Cartesian grid of LDA hyperparameters, persists one
//! model per grid cell under a path that encodes the cell, scores every
//! persisted model for topic coherence exactly once, and pivots the scores
//! into a `topic count × configuration` table. For the chosen model it infers
//! per-publication topic distributions and summarizes them by dominant topic,
//! by year and by topic co-occurrence.
//!
//! ## Design Principles
//!
//! - **Path is the cache key**: an artifact at the encoded path means the
//!   cell is done; re-running skips it
//! - **Insert-only scoring**: coherence records are never updated
//! - **Cell isolation**: one failing fit or score never aborts a phase
//! - **Pluggable seams**: fitting, persistence and scoring are traits
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use topic_grid::document::MemoryDocumentStore;
//! use topic_grid::model::{JsonModelPersistence, TopicTermModel};
//! use topic_grid::Pipeline;
//!
//! # async fn run() -> topic_grid::Result<()> {
//! let pipeline = Pipeline::builder(MemoryDocumentStore::new())
//!     .models_dir("models")
//!     .build()?;
//!
//! pipeline.transform().await?;
//! let persistence = JsonModelPersistence::<TopicTermModel>::new();
//! let report = pipeline.evaluate(&persistence, &pipeline.npmi_scorer()).await?;
//! println!("scored {} models", report.scored().len());
//!
//! let matrix = pipeline.coherence_matrix().await?;
//! if let Some(best) = matrix.best() {
//!     println!("best: k={} {} ({:.3})", best.topic_count, best.configuration, best.score);
//!     let combination = best.combination()?;
//!     pipeline.infer_document_topics(&persistence, &combination).await?;
//!     pipeline.write_corpus_views(best.topic_count as usize).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod experiment;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineBuilder};
