//! Grid-search experiment cache
//!
//! This module owns the hyperparameter grid, the path codec that turns each
//! grid cell into a storage location, the resumable fit driver and the
//! additive-only coherence pass.
//!
//! ## Layout
//!
//! ```text
//! <root>/<k>/<prior>/<seed>/<passes>/<iterations>/model
//!
//! HyperparameterGrid ──< HyperparameterCombination (N)
//!                              │
//!                              ├── ArtifactRecord   [on disk, path = cache key]
//!                              └── CoherenceRecord  [document store, once per cell]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use topic_grid::experiment::{ArtifactPathCodec, HyperparameterCombination, PriorMode};
//!
//! let codec = ArtifactPathCodec::new("models");
//! let cell = HyperparameterCombination::new(3, PriorMode::Auto, 42, 5, 200).unwrap();
//!
//! let path = codec.encode(&cell);
//! assert!(path.ends_with("3/auto/42/5/200/model"));
//! assert_eq!(codec.decode(&path).unwrap(), cell);
//! ```

mod artifact_record;
mod codec;
mod coherence_record;
mod combination;
mod grid;
mod scoring;
mod search;

pub use artifact_record::{discover_artifacts, ArtifactRecord};
pub use codec::{ArtifactPathCodec, ARTIFACT_FILE_NAME};
pub use coherence_record::{CoherenceRecord, CoherenceRecordBuilder};
pub use combination::{HyperparameterCombination, PriorMode};
pub use grid::HyperparameterGrid;
pub use scoring::{read_coherence_records, CoherenceEvaluation, ScoringReport};
pub use search::{CellOutcome, GridSearch, GridSearchReport};
