//! Pipeline configuration
//!
//! Every field has a default matching the reference run, so an empty JSON
//! object is a valid configuration:
//!
//! ```rust
//! use topic_grid::config::PipelineConfig;
//!
//! let config: PipelineConfig = serde_json::from_str("{}").unwrap();
//! assert_eq!(config.models_dir.to_str(), Some("models"));
//! assert_eq!(config.grid.len(), 152);
//! ```

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::PruningBounds;
use crate::experiment::HyperparameterGrid;
use crate::report::TopicLabels;
use crate::{Error, Result};

/// Topic counts shown in the coherence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapRange {
    /// Lowest topic count (inclusive).
    pub min_k: u32,
    /// Highest topic count (inclusive).
    pub max_k: u32,
}

impl Default for HeatmapRange {
    fn default() -> Self {
        Self { min_k: 2, max_k: 20 }
    }
}

impl HeatmapRange {
    /// As an inclusive range.
    #[must_use]
    pub const fn range(&self) -> RangeInclusive<u32> {
        self.min_k..=self.max_k
    }
}

/// Locations, collection names and search parameters of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where `dictionary.json` and `corpus.json` live.
    pub corpus_dir: PathBuf,
    /// Storage root of model artifacts.
    pub models_dir: PathBuf,
    /// Where CSV reports are written.
    pub output_dir: PathBuf,
    /// Collection of raw publications.
    pub raw_collection: String,
    /// Collection of coherence records.
    pub coherence_collection: String,
    /// Collection of inferred per-publication topic distributions.
    pub publications_collection: String,
    /// Vocabulary pruning bounds.
    pub pruning: PruningBounds,
    /// Hyperparameter grid to search.
    pub grid: HyperparameterGrid,
    /// Words per topic for scoring and topic tables.
    pub top_n_words: usize,
    /// Topic counts in the coherence table.
    pub heatmap_k_range: HeatmapRange,
    /// Labels for topic tables.
    pub topic_labels: TopicLabels,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("files"),
            models_dir: PathBuf::from("models"),
            output_dir: PathBuf::from("output"),
            raw_collection: "publications_raw".to_string(),
            coherence_collection: "coherence".to_string(),
            publications_collection: "publications".to_string(),
            pruning: PruningBounds::default(),
            grid: HyperparameterGrid::default(),
            top_n_words: 10,
            heatmap_k_range: HeatmapRange::default(),
            topic_labels: TopicLabels::default(),
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `Json` if it is malformed,
    /// or `InvalidConfig` if a value is out of range.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), cells = config.grid.len(), "loaded configuration");
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        self.pruning.validate()?;
        self.grid
            .validate()
            .map_err(|e| Error::InvalidConfig(format!("grid: {e}")))?;
        if self.top_n_words < 2 {
            return Err(Error::InvalidConfig(format!(
                "top_n_words must be at least 2 to form word pairs, got {}",
                self.top_n_words
            )));
        }
        if self.heatmap_k_range.min_k == 0 || self.heatmap_k_range.min_k > self.heatmap_k_range.max_k {
            return Err(Error::InvalidConfig(format!(
                "heatmap_k_range {}..={} is empty or starts at zero",
                self.heatmap_k_range.min_k, self.heatmap_k_range.max_k
            )));
        }
        for name in [
            &self.raw_collection,
            &self.coherence_collection,
            &self.publications_collection,
        ] {
            if name.is_empty() {
                return Err(Error::InvalidConfig("collection names must not be empty".to_string()));
            }
        }
        Ok(())
    }
}
