//! Hyperparameter Combination - identity of one grid cell

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Dirichlet prior mode passed to the fitter for both document-topic and
/// topic-word priors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorMode {
    /// Prior learned from the corpus.
    Auto,
    /// Fixed symmetric prior.
    Symmetric,
    /// Fixed asymmetric prior.
    Asymmetric,
}

impl PriorMode {
    /// Path segment / record spelling of the prior.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Symmetric => "symmetric",
            Self::Asymmetric => "asymmetric",
        }
    }
}

impl fmt::Display for PriorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "symmetric" => Ok(Self::Symmetric),
            "asymmetric" => Ok(Self::Asymmetric),
            other => Err(Error::InvalidHyperparameter(format!(
                "unknown prior mode '{other}' (expected auto, symmetric or asymmetric)"
            ))),
        }
    }
}

/// One assignment of all five hyperparameters.
///
/// The field order is the grid's nesting order, so the derived `Ord` sorts
/// combinations exactly as the grid enumerates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HyperparameterCombination {
    topic_count: u32,
    prior: PriorMode,
    random_seed: u64,
    passes: u32,
    iterations: u32,
}

impl HyperparameterCombination {
    /// Create a combination.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if the topic count, pass count or
    /// iteration cap is zero.
    pub fn new(
        topic_count: u32,
        prior: PriorMode,
        random_seed: u64,
        passes: u32,
        iterations: u32,
    ) -> Result<Self> {
        for (name, value) in [
            ("topic count", topic_count),
            ("pass count", passes),
            ("iteration cap", iterations),
        ] {
            if value == 0 {
                return Err(Error::InvalidHyperparameter(format!("{name} must be positive")));
            }
        }
        Ok(Self {
            topic_count,
            prior,
            random_seed,
            passes,
            iterations,
        })
    }

    /// Number of topics.
    #[must_use]
    pub const fn topic_count(&self) -> u32 {
        self.topic_count
    }

    /// Dirichlet prior mode.
    #[must_use]
    pub const fn prior(&self) -> PriorMode {
        self.prior
    }

    /// Random initialization seed.
    #[must_use]
    pub const fn random_seed(&self) -> u64 {
        self.random_seed
    }

    /// Full passes over the corpus.
    #[must_use]
    pub const fn passes(&self) -> u32 {
        self.passes
    }

    /// Convergence iteration cap.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Full identity key, e.g. `3-auto-42-5-200`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}-{}", self.topic_count, self.configuration_key())
    }

    /// Identity without the topic count, e.g. `auto-42-5-200`.
    ///
    /// This is the heatmap column key.
    #[must_use]
    pub fn configuration_key(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.prior, self.random_seed, self.passes, self.iterations
        )
    }
}

impl fmt::Display for HyperparameterCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "k={} prior={} seed={} passes={} iterations={}",
            self.topic_count, self.prior, self.random_seed, self.passes, self.iterations
        )
    }
}
