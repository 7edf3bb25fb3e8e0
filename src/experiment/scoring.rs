//! Coherence Evaluation - score every persisted model exactly once
//!
//! Artifacts are discovered on disk, their combinations decoded from their
//! paths, and joined against the coherence collection. Only unscored
//! artifacts are loaded and scored; records are inserted, never updated.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::artifact_record::{discover_artifacts, ArtifactRecord};
use super::{ArtifactPathCodec, CoherenceRecord, HyperparameterCombination};
use crate::corpus::CorpusArtifacts;
use crate::document::DocumentStore;
use crate::model::{CoherenceScorer, ModelPersistence};
use crate::{Error, Result};

/// Summary of one coherence pass.
#[derive(Debug, Default)]
pub struct ScoringReport {
    scored: Vec<(HyperparameterCombination, f64)>,
    already_scored: Vec<HyperparameterCombination>,
    failed: Vec<(PathBuf, String)>,
}

impl ScoringReport {
    /// Cells scored during this pass, with their score.
    #[must_use]
    pub fn scored(&self) -> &[(HyperparameterCombination, f64)] {
        &self.scored
    }

    /// Cells that already had a record.
    #[must_use]
    pub fn already_scored(&self) -> &[HyperparameterCombination] {
        &self.already_scored
    }

    /// Artifacts that could not be decoded, loaded, scored or recorded.
    ///
    /// None of these has a record, so the next pass retries them.
    #[must_use]
    pub fn failed(&self) -> &[(PathBuf, String)] {
        &self.failed
    }
}

/// Reads every coherence record of a collection.
///
/// Bodies that are not coherence records are skipped with a warning.
///
/// # Errors
///
/// Returns the store's error if the collection cannot be read.
pub async fn read_coherence_records<S: DocumentStore>(
    store: &S,
    collection: &str,
) -> Result<Vec<CoherenceRecord>> {
    let documents = store.read_all(collection).await?;
    Ok(documents
        .iter()
        .filter_map(|doc| match doc.decode::<CoherenceRecord>() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(id = %doc.id(), error = %e, "ignoring malformed coherence record");
                None
            }
        })
        .collect())
}

/// Additive-only coherence pass over a model root.
#[derive(Debug, Clone)]
pub struct CoherenceEvaluation {
    codec: ArtifactPathCodec,
    collection: String,
}

impl CoherenceEvaluation {
    /// Score artifacts under `codec`'s root into `collection`.
    #[must_use]
    pub fn new(codec: ArtifactPathCodec, collection: impl Into<String>) -> Self {
        Self {
            codec,
            collection: collection.into(),
        }
    }

    /// The coherence collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Combinations that already have a coherence record.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the collection cannot be read.
    pub async fn scored_combinations<S: DocumentStore>(
        &self,
        store: &S,
    ) -> Result<HashSet<HyperparameterCombination>> {
        let records = read_coherence_records(store, &self.collection).await?;
        Ok(records
            .iter()
            .filter_map(|record| record.combination().ok())
            .collect())
    }

    /// Score every unscored artifact.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if there are no reference texts, or the
    /// store's error if existing records cannot be read. Failures of single
    /// artifacts are logged and listed in the report instead.
    pub async fn calculate_coherence<S, M, P, C>(
        &self,
        store: &S,
        persistence: &P,
        scorer: &C,
        corpus: &CorpusArtifacts,
        texts: &[Vec<String>],
    ) -> Result<ScoringReport>
    where
        S: DocumentStore,
        P: ModelPersistence<M>,
        C: CoherenceScorer<M>,
    {
        if texts.is_empty() {
            return Err(Error::ConfigurationMissing(
                "reference tokenized documents for coherence scoring".to_string(),
            ));
        }

        let scored = self.scored_combinations(store).await?;
        let artifacts = discover_artifacts(self.codec.root());
        info!(
            artifacts = artifacts.len(),
            already_scored = scored.len(),
            "starting coherence pass"
        );

        let mut report = ScoringReport::default();
        for (i, path) in artifacts.iter().enumerate() {
            info!("calculating coherence score: {}/{}", i + 1, artifacts.len());

            let artifact = match ArtifactRecord::from_path(&self.codec, path.as_path()) {
                Ok(artifact) => artifact,
                Err(e) => {
                    error!(error = %e, "cannot identify artifact, skipping");
                    report.failed.push((path.clone(), e.to_string()));
                    continue;
                }
            };
            let combination = *artifact.combination();

            if scored.contains(&combination) {
                info!(key = %combination.key(), "coherence score already calculated, skipping");
                report.already_scored.push(combination);
                continue;
            }

            let score = match Self::score_one(persistence, scorer, corpus, texts, &combination, path) {
                Ok(score) => score,
                Err(e) => {
                    error!(error = %e, "scoring failed, will retry on next pass");
                    report.failed.push((path.clone(), e.to_string()));
                    continue;
                }
            };

            let record = CoherenceRecord::new(&combination, score);
            if let Err(e) = store.insert_typed(&self.collection, &record).await {
                error!(key = %combination.key(), error = %e, "cannot store coherence record");
                report.failed.push((path.clone(), e.to_string()));
                continue;
            }

            info!(key = %combination.key(), score, size_bytes = artifact.size_bytes(), "coherence score");
            report.scored.push((combination, score));
        }

        info!(
            scored = report.scored.len(),
            skipped = report.already_scored.len(),
            failed = report.failed.len(),
            "coherence pass finished"
        );
        Ok(report)
    }

    fn score_one<M, P, C>(
        persistence: &P,
        scorer: &C,
        corpus: &CorpusArtifacts,
        texts: &[Vec<String>],
        combination: &HyperparameterCombination,
        path: &Path,
    ) -> Result<f64>
    where
        P: ModelPersistence<M>,
        C: CoherenceScorer<M>,
    {
        let model = persistence.load(path)?;
        let score = scorer
            .score(&model, texts, corpus.vocabulary())
            .map_err(|e| Error::ScoreFailed {
                key: combination.key(),
                reason: e.to_string(),
            })?;
        if !score.is_finite() {
            return Err(Error::ScoreFailed {
                key: combination.key(),
                reason: format!("scorer returned non-finite value {score}"),
            });
        }
        Ok(score)
    }
}
