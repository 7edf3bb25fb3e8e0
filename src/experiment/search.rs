//! Grid Search - fit every missing cell of a hyperparameter grid
//!
//! The artifact path is the cache key. A cell whose artifact file exists is
//! done; everything else is fitted and persisted. Re-running after a crash
//! resumes where the previous run stopped.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, error, info};

use super::{ArtifactPathCodec, HyperparameterCombination, HyperparameterGrid};
use crate::corpus::CorpusArtifacts;
use crate::model::{ModelFitter, ModelPersistence};
use crate::Error;

/// What happened to one grid cell.
#[derive(Debug)]
pub enum CellOutcome {
    /// Model fitted and persisted at this path.
    Fitted(PathBuf),
    /// Artifact already present at this path.
    Skipped(PathBuf),
    /// Fit, directory creation or persistence failed.
    Failed(Error),
}

/// Summary of one grid-search run.
#[derive(Debug, Default)]
pub struct GridSearchReport {
    fitted: Vec<HyperparameterCombination>,
    skipped: Vec<HyperparameterCombination>,
    failed: Vec<(HyperparameterCombination, String)>,
}

impl GridSearchReport {
    fn record(&mut self, combination: HyperparameterCombination, outcome: CellOutcome) {
        match outcome {
            CellOutcome::Fitted(_) => self.fitted.push(combination),
            CellOutcome::Skipped(_) => self.skipped.push(combination),
            CellOutcome::Failed(e) => self.failed.push((combination, e.to_string())),
        }
    }

    /// Cells fitted during this run.
    #[must_use]
    pub fn fitted(&self) -> &[HyperparameterCombination] {
        &self.fitted
    }

    /// Cells whose artifact already existed.
    #[must_use]
    pub fn skipped(&self) -> &[HyperparameterCombination] {
        &self.skipped
    }

    /// Cells that failed, with the reason.
    #[must_use]
    pub fn failed(&self) -> &[(HyperparameterCombination, String)] {
        &self.failed
    }

    /// Total cells visited.
    #[must_use]
    pub fn total(&self) -> usize {
        self.fitted.len() + self.skipped.len() + self.failed.len()
    }
}

/// Resumable grid search over a hyperparameter grid.
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: HyperparameterGrid,
    codec: ArtifactPathCodec,
}

impl GridSearch {
    /// Create a grid search writing artifacts through `codec`.
    #[must_use]
    pub const fn new(grid: HyperparameterGrid, codec: ArtifactPathCodec) -> Self {
        Self { grid, codec }
    }

    /// The grid being searched.
    #[must_use]
    pub const fn grid(&self) -> &HyperparameterGrid {
        &self.grid
    }

    /// The artifact path codec.
    #[must_use]
    pub const fn codec(&self) -> &ArtifactPathCodec {
        &self.codec
    }

    /// Combinations that do not yet have an artifact, in grid order.
    #[must_use]
    pub fn pending(&self) -> Vec<HyperparameterCombination> {
        self.grid
            .combinations()
            .into_iter()
            .filter(|c| !self.codec.encode(c).exists())
            .collect()
    }

    /// Visit every cell sequentially in grid order.
    ///
    /// Never fails as a whole: per-cell failures are logged and listed in
    /// the report, and the next cell is attempted.
    pub fn run<F, P>(&self, fitter: &F, persistence: &P, corpus: &CorpusArtifacts) -> GridSearchReport
    where
        F: ModelFitter,
        P: ModelPersistence<F::Model>,
    {
        info!(cells = self.grid.len(), root = %self.codec.root().display(), "starting grid search");
        let mut report = GridSearchReport::default();
        for combination in self.grid.combinations() {
            let outcome = self.run_cell(&combination, fitter, persistence, corpus);
            report.record(combination, outcome);
        }
        Self::log_summary(&report);
        report
    }

    /// Visit every cell on the rayon thread pool.
    ///
    /// Cells map to disjoint paths, so workers never contend. The report
    /// lists cells in grid order regardless of completion order.
    #[cfg(feature = "rayon")]
    pub fn run_parallel<F, P>(
        &self,
        fitter: &F,
        persistence: &P,
        corpus: &CorpusArtifacts,
    ) -> GridSearchReport
    where
        F: ModelFitter + Sync,
        P: ModelPersistence<F::Model> + Sync,
    {
        use rayon::prelude::*;

        info!(cells = self.grid.len(), root = %self.codec.root().display(), "starting parallel grid search");
        let outcomes: Vec<(HyperparameterCombination, CellOutcome)> = self
            .grid
            .combinations()
            .into_par_iter()
            .map(|combination| {
                let outcome = self.run_cell(&combination, fitter, persistence, corpus);
                (combination, outcome)
            })
            .collect();

        let mut report = GridSearchReport::default();
        for (combination, outcome) in outcomes {
            report.record(combination, outcome);
        }
        Self::log_summary(&report);
        report
    }

    /// Check, fit and persist one cell.
    pub fn run_cell<F, P>(
        &self,
        combination: &HyperparameterCombination,
        fitter: &F,
        persistence: &P,
        corpus: &CorpusArtifacts,
    ) -> CellOutcome
    where
        F: ModelFitter,
        P: ModelPersistence<F::Model>,
    {
        debug!(
            k = combination.topic_count(),
            prior = %combination.prior(),
            seed = combination.random_seed(),
            passes = combination.passes(),
            iterations = combination.iterations(),
            "grid cell"
        );

        let path = self.codec.encode(combination);
        if path.exists() {
            info!(key = %combination.key(), "model already exists, skipping");
            return CellOutcome::Skipped(path);
        }

        // create_dir_all succeeds when another worker created the directory first
        if let Err(e) = fs::create_dir_all(self.codec.directory(combination)) {
            error!(key = %combination.key(), error = %e, "cannot create model directory");
            return CellOutcome::Failed(e.into());
        }

        let model = match fitter.fit(corpus.corpus(), corpus.vocabulary(), combination) {
            Ok(model) => model,
            Err(e) => {
                let e = Error::FitFailed {
                    key: combination.key(),
                    reason: e.to_string(),
                };
                error!(error = %e, "fit failed, continuing with next cell");
                return CellOutcome::Failed(e);
            }
        };

        if let Err(e) = persistence.save(&model, &path) {
            error!(key = %combination.key(), error = %e, "cannot persist model");
            return CellOutcome::Failed(e);
        }

        info!(key = %combination.key(), path = %path.display(), "fitted model");
        CellOutcome::Fitted(path)
    }

    fn log_summary(report: &GridSearchReport) {
        info!(
            fitted = report.fitted().len(),
            skipped = report.skipped().len(),
            failed = report.failed().len(),
            "grid search finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{EncodedCorpus, PruningBounds, Vocabulary};
    use crate::experiment::PriorMode;
    use crate::model::{JsonModelPersistence, TopicTermModel};
    use crate::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFitter {
        calls: AtomicUsize,
        fail_on: Option<u32>,
    }

    impl ModelFitter for CountingFitter {
        type Model = TopicTermModel;

        fn fit(
            &self,
            _corpus: &EncodedCorpus,
            _vocabulary: &Vocabulary,
            combination: &HyperparameterCombination,
        ) -> Result<TopicTermModel> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(combination.topic_count()) {
                return Err(Error::Other("diverged".into()));
            }
            Ok(TopicTermModel::new(*combination, vec![vec![("w".into(), 1.0)]]))
        }
    }

    fn corpus() -> CorpusArtifacts {
        let texts = vec![vec!["a".to_string(), "b".to_string()]];
        CorpusArtifacts::build(&texts, &PruningBounds { no_below: 1, no_above: 1.0, keep_n: None })
    }

    #[test]
    fn test_run_cell_skip_and_fit() {
        let dir = tempfile::tempdir().unwrap();
        let grid = HyperparameterGrid::new([2], [PriorMode::Auto], [42], [5], [200]).unwrap();
        let search = GridSearch::new(grid, ArtifactPathCodec::new(dir.path()));
        let fitter = CountingFitter { calls: AtomicUsize::new(0), fail_on: None };
        let persistence = JsonModelPersistence::new();
        let c = HyperparameterCombination::new(2, PriorMode::Auto, 42, 5, 200).unwrap();

        assert!(matches!(search.run_cell(&c, &fitter, &persistence, &corpus()), CellOutcome::Fitted(_)));
        assert!(matches!(search.run_cell(&c, &fitter, &persistence, &corpus()), CellOutcome::Skipped(_)));
        assert_eq!(fitter.calls.load(Ordering::SeqCst), 1);
        assert!(search.pending().is_empty());
    }

    #[test]
    fn test_failed_cell_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let grid = HyperparameterGrid::new([2, 3], [PriorMode::Auto], [42], [5], [200]).unwrap();
        let search = GridSearch::new(grid, ArtifactPathCodec::new(dir.path()));
        let fitter = CountingFitter { calls: AtomicUsize::new(0), fail_on: Some(2) };

        let report = search.run(&fitter, &JsonModelPersistence::new(), &corpus());
        assert_eq!(report.fitted().len(), 1);
        assert_eq!(report.failed().len(), 1);
        assert!(report.failed()[0].1.contains("diverged"));

        let pending = search.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].topic_count(), 2);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_parallel_matches_sequential_layout() {
        let dir = tempfile::tempdir().unwrap();
        let grid = HyperparameterGrid::new(2..=6, [PriorMode::Auto], [42, 99], [5], [200]).unwrap();
        let search = GridSearch::new(grid, ArtifactPathCodec::new(dir.path()));
        let fitter = CountingFitter { calls: AtomicUsize::new(0), fail_on: None };
        let persistence = JsonModelPersistence::new();

        let report = search.run_parallel(&fitter, &persistence, &corpus());
        assert_eq!(report.fitted().len(), 10);
        assert_eq!(report.fitted(), search.grid().combinations().as_slice());

        let again = search.run_parallel(&fitter, &persistence, &corpus());
        assert_eq!(again.skipped().len(), 10);
        assert_eq!(fitter.calls.load(Ordering::SeqCst), 10);
    }
}
