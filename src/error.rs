//! Error types for topic-grid
//!
//! Only `ConfigurationMissing` is meant to abort a phase. Every other variant
//! is raised at the granularity of one grid cell or one artifact, and the
//! phase drivers log it and move on.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// topic-grid error types
#[derive(Error, Debug)]
pub enum Error {
    /// Required upstream input (vocabulary, encoded corpus, reference documents) is absent
    #[error("Required input missing: {0}\nRun the transformation phase before this one")]
    ConfigurationMissing(String),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A hyperparameter value is out of range
    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    /// A storage path does not match the artifact layout
    #[error("Cannot decode artifact path {}: {reason}\nThe storage layout does not match this version of the writer", path.display())]
    PathDecode {
        /// Offending path
        path: PathBuf,
        /// What did not match
        reason: String,
    },

    /// The external model fitter raised for one combination
    #[error("Model fit failed for {key}: {reason}")]
    FitFailed {
        /// Combination key (`k-prior-seed-passes-iterations`)
        key: String,
        /// Fitter diagnostic
        reason: String,
    },

    /// The external coherence scorer raised for one model
    #[error("Coherence scoring failed for {key}: {reason}")]
    ScoreFailed {
        /// Combination key (`k-prior-seed-passes-iterations`)
        key: String,
        /// Scorer diagnostic
        reason: String,
    },

    /// No model artifact at the expected path
    #[error("Model artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// `update_by_id` referenced an unknown document
    #[error("Document {id} not found in collection '{collection}'")]
    DocumentNotFound {
        /// Collection name
        collection: String,
        /// Requested document id
        id: u64,
    },

    /// Document store backend error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error must abort the whole phase.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigurationMissing(_))
    }
}
