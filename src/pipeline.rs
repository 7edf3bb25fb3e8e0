//! Pipeline facade: the phases in order, sharing one configuration
//!
//! ```text
//! transform ──> datamine ──> evaluate ──> coherence_matrix / write_coherence_csv
//!                                              │
//!                                              ├──> write_topic_tables (best cell)
//!                                              └──> infer_document_topics ──> write_corpus_views
//! ```
//!
//! Each phase may be run on its own and re-run safely; state lives only in
//! the document store and under the configured directories.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::config::PipelineConfig;
use crate::corpus::CorpusArtifacts;
use crate::document::{
    read_document_topics, reference_texts, store_document_topics, DocumentStore, DocumentTopics,
    InferenceReport,
};
use crate::experiment::{
    read_coherence_records, ArtifactPathCodec, CoherenceEvaluation, GridSearch, GridSearchReport,
    HyperparameterCombination, ScoringReport,
};
use crate::model::{CoherenceScorer, ModelFitter, ModelPersistence, NpmiCoherence, TopicModel};
use crate::report::{
    titles_to_topics, topic_summaries, write_titles_to_topics_csv, write_topic_list_csv,
    write_topic_table_csv, CoherenceMatrix, TopicCoOccurrence, TopicsOverTime, COHERENCE_CSV_FILE,
    TITLES_TO_TOPICS_FILE, TOPICS_OVER_TIME_FILE, TOPIC_CO_OCCURRENCE_FILE, TOPIC_LIST_FILE,
    TOPIC_TABLE_FILE,
};
use crate::{Error, Result};

/// A configured pipeline over a document store.
#[derive(Debug)]
pub struct Pipeline<S> {
    config: PipelineConfig,
    store: S,
}

impl<S: DocumentStore> Pipeline<S> {
    /// Create a pipeline builder around a document store.
    #[must_use]
    pub fn builder(store: S) -> PipelineBuilder<S> {
        PipelineBuilder::new(store)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Underlying document store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Codec rooted at the configured models directory.
    #[must_use]
    pub fn codec(&self) -> ArtifactPathCodec {
        ArtifactPathCodec::new(&self.config.models_dir)
    }

    /// Reference scorer using the configured words per topic.
    #[must_use]
    pub const fn npmi_scorer(&self) -> NpmiCoherence {
        NpmiCoherence::new(self.config.top_n_words)
    }

    /// Build and save the vocabulary and encoded corpus, or reuse saved ones.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if no publication is tokenized, or an
    /// IO/JSON error if the artifacts cannot be read or written.
    pub async fn transform(&self) -> Result<CorpusArtifacts> {
        let dir = &self.config.corpus_dir;
        if CorpusArtifacts::exists(dir) {
            info!(dir = %dir.display(), "corpus artifacts exist, reusing");
            return CorpusArtifacts::load(dir);
        }

        let texts = reference_texts(&self.store, &self.config.raw_collection).await?;
        let artifacts = CorpusArtifacts::build(&texts, &self.config.pruning);
        artifacts.save(dir)?;
        info!(
            documents = artifacts.corpus().len(),
            vocabulary = artifacts.vocabulary().len(),
            dir = %dir.display(),
            "saved corpus artifacts"
        );
        Ok(artifacts)
    }

    /// Load the saved corpus artifacts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if `transform` has not run.
    pub fn corpus(&self) -> Result<CorpusArtifacts> {
        CorpusArtifacts::load(&self.config.corpus_dir)
    }

    /// Fit every grid cell that has no artifact yet, one at a time.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if corpus artifacts are missing. Cell
    /// failures are reported, not raised.
    pub fn datamine<F, P>(&self, fitter: &F, persistence: &P) -> Result<GridSearchReport>
    where
        F: ModelFitter,
        P: ModelPersistence<F::Model>,
    {
        let corpus = self.corpus()?;
        Ok(self.grid_search().run(fitter, persistence, &corpus))
    }

    /// Like [`Pipeline::datamine`], fitting cells on the rayon pool.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if corpus artifacts are missing.
    #[cfg(feature = "rayon")]
    pub fn datamine_parallel<F, P>(&self, fitter: &F, persistence: &P) -> Result<GridSearchReport>
    where
        F: ModelFitter + Sync,
        P: ModelPersistence<F::Model> + Sync,
    {
        let corpus = self.corpus()?;
        Ok(self.grid_search().run_parallel(fitter, persistence, &corpus))
    }

    fn grid_search(&self) -> GridSearch {
        GridSearch::new(self.config.grid.clone(), self.codec())
    }

    /// Score every persisted model that has no coherence record yet.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if corpus artifacts or tokenized
    /// publications are missing.
    pub async fn evaluate<M, P, C>(&self, persistence: &P, scorer: &C) -> Result<ScoringReport>
    where
        P: ModelPersistence<M>,
        C: CoherenceScorer<M>,
    {
        let corpus = self.corpus()?;
        let texts = reference_texts(&self.store, &self.config.raw_collection).await?;
        CoherenceEvaluation::new(self.codec(), self.config.coherence_collection.as_str())
            .calculate_coherence(&self.store, persistence, scorer, &corpus, &texts)
            .await
    }

    /// Pivot stored coherence records over the configured topic-count range.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the collection cannot be read.
    pub async fn coherence_matrix(&self) -> Result<CoherenceMatrix> {
        let records = read_coherence_records(&self.store, &self.config.coherence_collection).await?;
        Ok(CoherenceMatrix::from_records(
            &records,
            Some(self.config.heatmap_k_range.range()),
        ))
    }

    /// Write the coherence table to `<output_dir>/coherence-scores.csv`.
    ///
    /// # Errors
    ///
    /// Returns an IO or CSV error if the file cannot be written.
    pub async fn write_coherence_csv(&self) -> Result<PathBuf> {
        let matrix = self.coherence_matrix().await?;
        fs::create_dir_all(&self.config.output_dir)?;
        let path = self.config.output_dir.join(COHERENCE_CSV_FILE);
        matrix.write_csv(&path)?;
        Ok(path)
    }

    fn load_model<M, P>(&self, persistence: &P, combination: &HyperparameterCombination) -> Result<M>
    where
        P: ModelPersistence<M>,
    {
        let artifact = self.codec().encode(combination);
        if !artifact.is_file() {
            return Err(Error::ArtifactMissing(artifact));
        }
        persistence.load(&artifact)
    }

    /// Write the topic list and topic table of one fitted model.
    ///
    /// Returns the paths of `topic-list.csv` and `topic-table.csv`.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactMissing` if the combination was never fitted, or an
    /// IO/CSV error if the files cannot be written.
    pub fn write_topic_tables<M, P>(
        &self,
        persistence: &P,
        combination: &HyperparameterCombination,
    ) -> Result<(PathBuf, PathBuf)>
    where
        M: TopicModel,
        P: ModelPersistence<M>,
    {
        let model = self.load_model(persistence, combination)?;
        let summaries = topic_summaries(&model, &self.config.topic_labels, self.config.top_n_words);

        fs::create_dir_all(&self.config.output_dir)?;
        let list = self.config.output_dir.join(TOPIC_LIST_FILE);
        let table = self.config.output_dir.join(TOPIC_TABLE_FILE);
        write_topic_list_csv(&summaries, &list)?;
        write_topic_table_csv(&summaries, &table)?;
        info!(key = %combination.key(), topics = summaries.len(), "wrote topic tables");
        Ok((list, table))
    }

    /// Infer the topic distribution of every tokenized publication under one
    /// fitted model and store it in the publications collection.
    ///
    /// Publications that already have a distribution are skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` if corpus artifacts are missing,
    /// `ArtifactMissing` if the combination was never fitted, or the store's
    /// error.
    pub async fn infer_document_topics<M, P>(
        &self,
        persistence: &P,
        combination: &HyperparameterCombination,
    ) -> Result<InferenceReport>
    where
        M: TopicModel,
        P: ModelPersistence<M>,
    {
        let corpus = self.corpus()?;
        let model = self.load_model(persistence, combination)?;
        info!(key = %combination.key(), "inferring document topics");
        store_document_topics(
            &self.store,
            &self.config.raw_collection,
            &self.config.publications_collection,
            &model,
            corpus.vocabulary(),
        )
        .await
    }

    /// Stored per-publication topic distributions.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the collection cannot be read.
    pub async fn document_topics(&self) -> Result<Vec<DocumentTopics>> {
        read_document_topics(&self.store, &self.config.publications_collection).await
    }

    /// Write `titles-to-topics.csv`, `topics-over-time.csv` and
    /// `topic-co-occurrence.csv` for a model with `num_topics` topics.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or an IO/CSV error if a file cannot be
    /// written.
    pub async fn write_corpus_views(&self, num_topics: usize) -> Result<[PathBuf; 3]> {
        let records = self.document_topics().await?;
        let labels = &self.config.topic_labels;
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir)?;

        let titles = dir.join(TITLES_TO_TOPICS_FILE);
        write_titles_to_topics_csv(&titles_to_topics(&records), labels, &titles)?;

        let over_time = dir.join(TOPICS_OVER_TIME_FILE);
        TopicsOverTime::from_records(&records, num_topics).write_csv(labels, &over_time)?;

        let co_occurrence = dir.join(TOPIC_CO_OCCURRENCE_FILE);
        TopicCoOccurrence::from_records(&records, num_topics).write_csv(labels, &co_occurrence)?;

        info!(documents = records.len(), num_topics, "wrote corpus views");
        Ok([titles, over_time, co_occurrence])
    }
}

/// Pipeline builder
#[derive(Debug)]
pub struct PipelineBuilder<S> {
    config: PipelineConfig,
    store: S,
}

impl<S: DocumentStore> PipelineBuilder<S> {
    /// Start from the default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            config: PipelineConfig::default(),
            store,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the models root.
    #[must_use]
    pub fn models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.models_dir = dir.into();
        self
    }

    /// Set the corpus artifacts directory.
    #[must_use]
    pub fn corpus_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.corpus_dir = dir.into();
        self
    }

    /// Set the report output directory.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn build(self) -> Result<Pipeline<S>> {
        self.config.validate()?;
        Ok(Pipeline {
            config: self.config,
            store: self.store,
        })
    }
}
