//! Hyperparameter Grid - the Cartesian search space

use serde::{Deserialize, Serialize};

use super::{HyperparameterCombination, PriorMode};
use crate::{Error, Result};

/// Five ordered sets whose Cartesian product is the search space.
///
/// Enumeration is nested outer-to-inner in field order, each dimension
/// ascending. Duplicates are removed so every combination appears once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct HyperparameterGrid {
    topic_counts: Vec<u32>,
    priors: Vec<PriorMode>,
    random_seeds: Vec<u64>,
    passes: Vec<u32>,
    iterations: Vec<u32>,
}

impl Default for HyperparameterGrid {
    /// The reference sweep: k in 2..=20, auto prior, seeds 42/99,
    /// 5/10/15/20 passes, 200 iterations (152 cells).
    fn default() -> Self {
        Self {
            topic_counts: (2..=20).collect(),
            priors: vec![PriorMode::Auto],
            random_seeds: vec![42, 99],
            passes: vec![5, 10, 15, 20],
            iterations: vec![200],
        }
    }
}

impl HyperparameterGrid {
    /// Create a grid from its five dimensions.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if a dimension is empty or holds a
    /// zero topic count, pass count or iteration cap.
    pub fn new(
        topic_counts: impl IntoIterator<Item = u32>,
        priors: impl IntoIterator<Item = PriorMode>,
        random_seeds: impl IntoIterator<Item = u64>,
        passes: impl IntoIterator<Item = u32>,
        iterations: impl IntoIterator<Item = u32>,
    ) -> Result<Self> {
        let grid = Self {
            topic_counts: sorted_unique(topic_counts),
            priors: sorted_unique(priors),
            random_seeds: sorted_unique(random_seeds),
            passes: sorted_unique(passes),
            iterations: sorted_unique(iterations),
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Check that every dimension is non-empty and positive where required.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` describing the first offending dimension.
    pub fn validate(&self) -> Result<()> {
        let dims = [
            ("topic_counts", self.topic_counts.is_empty()),
            ("priors", self.priors.is_empty()),
            ("random_seeds", self.random_seeds.is_empty()),
            ("passes", self.passes.is_empty()),
            ("iterations", self.iterations.is_empty()),
        ];
        if let Some((name, _)) = dims.iter().find(|(_, empty)| *empty) {
            return Err(Error::InvalidHyperparameter(format!(
                "grid dimension '{name}' is empty"
            )));
        }
        for (name, values) in [
            ("topic_counts", &self.topic_counts),
            ("passes", &self.passes),
            ("iterations", &self.iterations),
        ] {
            if values.contains(&0) {
                return Err(Error::InvalidHyperparameter(format!(
                    "grid dimension '{name}' contains 0"
                )));
            }
        }
        Ok(())
    }

    /// Topic counts, ascending.
    #[must_use]
    pub fn topic_counts(&self) -> &[u32] {
        &self.topic_counts
    }

    /// Prior modes, ascending.
    #[must_use]
    pub fn priors(&self) -> &[PriorMode] {
        &self.priors
    }

    /// Random seeds, ascending.
    #[must_use]
    pub fn random_seeds(&self) -> &[u64] {
        &self.random_seeds
    }

    /// Pass counts, ascending.
    #[must_use]
    pub fn passes(&self) -> &[u32] {
        &self.passes
    }

    /// Iteration caps, ascending.
    #[must_use]
    pub fn iterations(&self) -> &[u32] {
        &self.iterations
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topic_counts.len()
            * self.priors.len()
            * self.random_seeds.len()
            * self.passes.len()
            * self.iterations.len()
    }

    /// Whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All combinations in deterministic nested order.
    ///
    /// Values are validated by [`HyperparameterGrid::validate`], so cells
    /// with a zero dimension are never produced.
    #[must_use]
    pub fn combinations(&self) -> Vec<HyperparameterCombination> {
        let mut cells = Vec::with_capacity(self.len());
        for &k in &self.topic_counts {
            for &prior in &self.priors {
                for &seed in &self.random_seeds {
                    for &passes in &self.passes {
                        for &iterations in &self.iterations {
                            if let Ok(cell) =
                                HyperparameterCombination::new(k, prior, seed, passes, iterations)
                            {
                                cells.push(cell);
                            }
                        }
                    }
                }
            }
        }
        cells
    }
}

#[derive(Deserialize)]
struct RawGrid {
    topic_counts: Vec<u32>,
    priors: Vec<PriorMode>,
    random_seeds: Vec<u64>,
    passes: Vec<u32>,
    iterations: Vec<u32>,
}

impl TryFrom<RawGrid> for HyperparameterGrid {
    type Error = Error;

    fn try_from(raw: RawGrid) -> Result<Self> {
        Self::new(
            raw.topic_counts,
            raw.priors,
            raw.random_seeds,
            raw.passes,
            raw.iterations,
        )
    }
}

fn sorted_unique<T: Ord>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut values: Vec<T> = values.into_iter().collect();
    values.sort_unstable();
    values.dedup();
    values
}
