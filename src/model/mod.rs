//! Model seams: fitting, persistence and coherence scoring
//!
//! Topic inference itself lives outside this crate. A backend plugs in by
//! implementing [`ModelFitter`] (and usually exporting its result into a
//! [`TopicTermModel`] so the stock persistence and scorer apply).
//!
//! ```text
//! ModelFitter ──fit──> Model ──save──> ModelPersistence ──load──> CoherenceScorer
//! ```

mod coherence;
mod persistence;

pub use coherence::NpmiCoherence;
pub use persistence::JsonModelPersistence;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::{EncodedCorpus, Vocabulary};
use crate::experiment::HyperparameterCombination;
use crate::Result;

/// Fits one topic model for one grid cell.
///
/// Calls are synchronous and may run for minutes. An `Err` marks only this
/// combination as failed; the grid search carries on.
pub trait ModelFitter {
    /// Fitted model type.
    type Model;

    /// Fit a model on the shared corpus with this cell's hyperparameters.
    ///
    /// # Errors
    ///
    /// Any error is reported as a fit failure for `combination`.
    fn fit(
        &self,
        corpus: &EncodedCorpus,
        vocabulary: &Vocabulary,
        combination: &HyperparameterCombination,
    ) -> Result<Self::Model>;
}

/// Writes models to, and reads them from, artifact paths.
pub trait ModelPersistence<M> {
    /// Persist `model` at `path`. The parent directory already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be written.
    fn save(&self, model: &M, path: &Path) -> Result<()>;

    /// Load the model stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable.
    fn load(&self, path: &Path) -> Result<M>;
}

/// Scores a model against reference text.
pub trait CoherenceScorer<M> {
    /// Compute a coherence score; higher is better.
    ///
    /// # Errors
    ///
    /// Any error is reported as a score failure and no record is written.
    fn score(&self, model: &M, texts: &[Vec<String>], vocabulary: &Vocabulary) -> Result<f64>;
}

/// What reporting and the reference scorer need from a fitted model.
pub trait TopicModel {
    /// Number of topics.
    fn num_topics(&self) -> usize;

    /// Up to `n` highest-weighted `(word, probability)` pairs of a topic,
    /// descending. An out-of-range topic yields an empty list.
    fn top_words(&self, topic: usize, n: usize) -> Vec<(String, f64)>;

    /// Topic proportions of a bag-of-words document (`doc2bow` output) as
    /// `(topic, proportion)` pairs in topic order. Proportions sum to 1;
    /// topics with no mass are left out, and a document with no evidence for
    /// any topic yields an empty list.
    fn document_topics(&self, bow: &[(u32, u32)], vocabulary: &Vocabulary) -> Vec<(usize, f64)>;
}

/// A serializable topic-word table.
///
/// Backends export their fitted state into this form so that models from
/// any inference engine share one artifact format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTermModel {
    combination: HyperparameterCombination,
    topics: Vec<Vec<(String, f64)>>,
}

impl TopicTermModel {
    /// Create a model from per-topic `(word, weight)` lists.
    ///
    /// Each list is sorted by descending weight.
    #[must_use]
    pub fn new(combination: HyperparameterCombination, mut topics: Vec<Vec<(String, f64)>>) -> Self {
        for words in &mut topics {
            words.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        }
        Self { combination, topics }
    }

    /// Combination the model was fitted with.
    #[must_use]
    pub const fn combination(&self) -> &HyperparameterCombination {
        &self.combination
    }

    /// All topics with their full word lists.
    #[must_use]
    pub fn topics(&self) -> &[Vec<(String, f64)>] {
        &self.topics
    }
}

impl TopicModel for TopicTermModel {
    fn num_topics(&self) -> usize {
        self.topics.len()
    }

    fn top_words(&self, topic: usize, n: usize) -> Vec<(String, f64)> {
        self.topics
            .get(topic)
            .map(|words| words.iter().take(n).cloned().collect())
            .unwrap_or_default()
    }

    /// A single fold-in step: a topic's mass is the count-weighted sum of its
    /// term weights over the document's tokens.
    fn document_topics(&self, bow: &[(u32, u32)], vocabulary: &Vocabulary) -> Vec<(usize, f64)> {
        let mass: Vec<f64> = self
            .topics
            .iter()
            .map(|words| {
                words
                    .iter()
                    .filter_map(|(word, weight)| {
                        let id = vocabulary.id(word)?;
                        let slot = bow.binary_search_by_key(&id, |&(id, _)| id).ok()?;
                        Some(f64::from(bow[slot].1) * weight)
                    })
                    .sum()
            })
            .collect();

        let total: f64 = mass.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Vec::new();
        }
        mass.into_iter()
            .enumerate()
            .filter(|&(_, m)| m > 0.0)
            .map(|(topic, m)| (topic, m / total))
            .collect()
    }
}
