//! Coherence Record - one score per scored grid cell

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HyperparameterCombination, PriorMode};
use crate::Result;

/// Coherence Record represents the evaluation of one model artifact.
///
/// Records are insert-only: the coherence pass writes one record per
/// combination and never updates it. The five hyperparameter fields are the
/// record's identity; `coherence_score` and `recorded_at` are payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoherenceRecord {
    topic_count: u32,
    prior: PriorMode,
    random_seed: u64,
    passes: u32,
    iterations: u32,
    coherence_score: f64,
    recorded_at: DateTime<Utc>,
}

impl CoherenceRecord {
    /// Create a new coherence record stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `combination` - Grid cell that was scored
    /// * `coherence_score` - Score returned by the coherence scorer
    #[must_use]
    pub fn new(combination: &HyperparameterCombination, coherence_score: f64) -> Self {
        Self::builder(combination, coherence_score).build()
    }

    /// Create a builder for constructing a record with optional fields.
    #[must_use]
    pub fn builder(
        combination: &HyperparameterCombination,
        coherence_score: f64,
    ) -> CoherenceRecordBuilder {
        CoherenceRecordBuilder::new(combination, coherence_score)
    }

    /// Get the number of topics.
    #[must_use]
    pub const fn topic_count(&self) -> u32 {
        self.topic_count
    }

    /// Get the Dirichlet prior mode.
    #[must_use]
    pub const fn prior(&self) -> PriorMode {
        self.prior
    }

    /// Get the random seed.
    #[must_use]
    pub const fn random_seed(&self) -> u64 {
        self.random_seed
    }

    /// Get the pass count.
    #[must_use]
    pub const fn passes(&self) -> u32 {
        self.passes
    }

    /// Get the iteration cap.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Get the coherence score.
    #[must_use]
    pub const fn coherence_score(&self) -> f64 {
        self.coherence_score
    }

    /// Get the timestamp when the score was recorded.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Rebuild the combination this record scores.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if a stored record carries a zero
    /// topic count, pass count or iteration cap.
    pub fn combination(&self) -> Result<HyperparameterCombination> {
        HyperparameterCombination::new(
            self.topic_count,
            self.prior,
            self.random_seed,
            self.passes,
            self.iterations,
        )
    }
}

/// Builder for `CoherenceRecord`.
#[derive(Debug)]
pub struct CoherenceRecordBuilder {
    combination: HyperparameterCombination,
    coherence_score: f64,
    recorded_at: DateTime<Utc>,
}

impl CoherenceRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(combination: &HyperparameterCombination, coherence_score: f64) -> Self {
        Self {
            combination: *combination,
            coherence_score,
            recorded_at: Utc::now(),
        }
    }

    /// Set a custom timestamp (useful for imports and tests).
    #[must_use]
    pub const fn recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    /// Build the `CoherenceRecord`.
    #[must_use]
    pub fn build(self) -> CoherenceRecord {
        CoherenceRecord {
            topic_count: self.combination.topic_count(),
            prior: self.combination.prior(),
            random_seed: self.combination.random_seed(),
            passes: self.combination.passes(),
            iterations: self.combination.iterations(),
            coherence_score: self.coherence_score,
            recorded_at: self.recorded_at,
        }
    }
}
