//! Reporting: coherence aggregation, topic tables and corpus views over
//! inferred document-topic distributions
//!
//! The coherence matrix pivots stored [`CoherenceRecord`]s into
//! `topic count × configuration → score`, where a configuration is the
//! remaining four hyperparameters. Missing cells stay missing; nothing is
//! filled with zero.
//!
//! ```text
//!                     k=2     k=3     k=4
//! auto-42-5-200      0.512   0.509
//! auto-99-5-200      0.507           0.511
//! ```

mod interpretation;
mod topics;

pub use interpretation::{
    titles_to_topics, write_titles_to_topics_csv, CoOccurrenceRow, TitleTopic, TopicCoOccurrence,
    TopicsOverTime, YearTopics, TITLES_TO_TOPICS_FILE, TOPICS_OVER_TIME_FILE, TOPIC_CO_OCCURRENCE_FILE,
};
pub use topics::{
    topic_summaries, write_topic_list_csv, write_topic_table_csv, TopicLabels, TopicSummary,
    TOPIC_LIST_FILE, TOPIC_TABLE_FILE,
};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::experiment::{CoherenceRecord, HyperparameterCombination, PriorMode};
use crate::Result;

/// File name of the coherence heatmap table.
pub const COHERENCE_CSV_FILE: &str = "coherence-scores.csv";

/// The four non-`k` hyperparameters, rendered as `prior-seed-passes-iterations`.
///
/// Ordering is numeric per field, so `auto-42-5-200` sorts before
/// `auto-42-10-200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Configuration {
    prior: PriorMode,
    random_seed: u64,
    passes: u32,
    iterations: u32,
}

impl Configuration {
    /// Prior mode.
    #[must_use]
    pub const fn prior(&self) -> PriorMode {
        self.prior
    }

    /// Random seed.
    #[must_use]
    pub const fn random_seed(&self) -> u64 {
        self.random_seed
    }

    /// Pass count.
    #[must_use]
    pub const fn passes(&self) -> u32 {
        self.passes
    }

    /// Max iterations.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Rebuild the full grid cell for a topic count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if `topic_count` is zero.
    pub fn with_topic_count(&self, topic_count: u32) -> Result<HyperparameterCombination> {
        HyperparameterCombination::new(
            topic_count,
            self.prior,
            self.random_seed,
            self.passes,
            self.iterations,
        )
    }
}

impl From<&HyperparameterCombination> for Configuration {
    fn from(c: &HyperparameterCombination) -> Self {
        Self {
            prior: c.prior(),
            random_seed: c.random_seed(),
            passes: c.passes(),
            iterations: c.iterations(),
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.prior, self.random_seed, self.passes, self.iterations
        )
    }
}

/// Best-scoring cell of a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestCell {
    /// Topic count of the cell.
    pub topic_count: u32,
    /// Remaining hyperparameters of the cell.
    pub configuration: Configuration,
    /// Its coherence score.
    pub score: f64,
}

impl BestCell {
    /// The full grid cell.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` if the stored topic count is zero.
    pub fn combination(&self) -> Result<HyperparameterCombination> {
        self.configuration.with_topic_count(self.topic_count)
    }
}

/// Sparse `topic count × configuration → score` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoherenceMatrix {
    rows: BTreeMap<u32, BTreeMap<Configuration, f64>>,
}

impl CoherenceMatrix {
    /// Pivot records into a matrix.
    ///
    /// With `k_range`, exactly the topic counts in the range become rows
    /// (possibly empty) and records outside it are ignored. Without it, rows
    /// are the topic counts that have records. When the same cell was
    /// recorded twice, the later record wins.
    #[must_use]
    pub fn from_records(records: &[CoherenceRecord], k_range: Option<RangeInclusive<u32>>) -> Self {
        let mut rows: BTreeMap<u32, BTreeMap<Configuration, f64>> = BTreeMap::new();
        if let Some(range) = &k_range {
            for k in range.clone() {
                rows.insert(k, BTreeMap::new());
            }
        }

        for record in records {
            let combination = match record.combination() {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring coherence record with invalid hyperparameters");
                    continue;
                }
            };
            let k = combination.topic_count();
            if k_range.as_ref().is_some_and(|range| !range.contains(&k)) {
                continue;
            }
            let previous = rows
                .entry(k)
                .or_default()
                .insert(Configuration::from(&combination), record.coherence_score());
            if previous.is_some() {
                tracing::debug!(key = %combination.key(), "duplicate coherence record, keeping the later one");
            }
        }
        Self { rows }
    }

    /// Topic counts, ascending.
    #[must_use]
    pub fn topic_counts(&self) -> Vec<u32> {
        self.rows.keys().copied().collect()
    }

    /// Every configuration present in any row, ascending.
    #[must_use]
    pub fn columns(&self) -> Vec<Configuration> {
        self.rows
            .values()
            .flat_map(BTreeMap::keys)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Cells of one topic count, or `None` if it is not a row.
    #[must_use]
    pub fn row(&self, topic_count: u32) -> Option<&BTreeMap<Configuration, f64>> {
        self.rows.get(&topic_count)
    }

    /// Score of a cell addressed by its `prior-seed-passes-iterations` key.
    #[must_use]
    pub fn get(&self, topic_count: u32, configuration: &str) -> Option<f64> {
        self.rows.get(&topic_count).and_then(|row| {
            row.iter()
                .find(|(c, _)| c.to_string() == configuration)
                .map(|(_, score)| *score)
        })
    }

    /// Number of filled cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// True if no cell is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest-scoring cell; ties go to the smallest `(k, configuration)`.
    #[must_use]
    pub fn best(&self) -> Option<BestCell> {
        let mut best: Option<BestCell> = None;
        for (&topic_count, row) in &self.rows {
            for (&configuration, &score) in row {
                if best.map_or(true, |b| score > b.score) {
                    best = Some(BestCell {
                        topic_count,
                        configuration,
                        score,
                    });
                }
            }
        }
        best
    }

    /// Write the heatmap layout: one row per configuration, one column per
    /// topic count, blank where no score exists.
    ///
    /// # Errors
    ///
    /// Returns `Csv` if writing fails.
    pub fn to_writer<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let ks = self.topic_counts();
        let mut header = vec!["configuration".to_string()];
        header.extend(ks.iter().map(u32::to_string));
        csv.write_record(&header)?;

        for configuration in self.columns() {
            let mut row = vec![configuration.to_string()];
            for k in &ks {
                row.push(
                    self.rows
                        .get(k)
                        .and_then(|cells| cells.get(&configuration))
                        .map(f64::to_string)
                        .unwrap_or_default(),
                );
            }
            csv.write_record(&row)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write the heatmap layout to a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Csv` if the file cannot be written.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_writer(file)?;
        tracing::info!(path = %path.display(), cells = self.len(), "wrote coherence table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(k: u32, seed: u64, passes: u32, score: f64) -> CoherenceRecord {
        let c = HyperparameterCombination::new(k, PriorMode::Auto, seed, passes, 200).unwrap();
        CoherenceRecord::new(&c, score)
    }

    #[test]
    fn test_pivot_leaves_missing_cells_absent() {
        let records = vec![record(3, 42, 5, 0.51), record(3, 99, 5, 0.49)];
        let matrix = CoherenceMatrix::from_records(&records, Some(2..=20));

        assert_eq!(matrix.topic_counts().len(), 19);
        assert_eq!(matrix.get(3, "auto-42-5-200"), Some(0.51));
        assert_eq!(matrix.get(3, "auto-99-5-200"), Some(0.49));
        assert_eq!(matrix.row(3).map(BTreeMap::len), Some(2));
        assert_eq!(matrix.get(2, "auto-42-5-200"), None);
        assert!(matrix.row(2).is_some_and(BTreeMap::is_empty));
    }

    #[test]
    fn test_range_excludes_out_of_range_records() {
        let records = vec![record(25, 42, 5, 0.9), record(3, 42, 5, 0.5)];
        let matrix = CoherenceMatrix::from_records(&records, Some(2..=20));
        assert_eq!(matrix.len(), 1);
        assert!(matrix.row(25).is_none());

        let unbounded = CoherenceMatrix::from_records(&records, None);
        assert_eq!(unbounded.topic_counts(), vec![3, 25]);
    }

    #[test]
    fn test_columns_sort_numerically() {
        let records = vec![record(2, 42, 10, 0.5), record(2, 42, 5, 0.5)];
        let matrix = CoherenceMatrix::from_records(&records, None);
        let columns: Vec<String> = matrix.columns().iter().map(ToString::to_string).collect();
        assert_eq!(columns, vec!["auto-42-5-200", "auto-42-10-200"]);
    }

    #[test]
    fn test_best_cell() {
        let records = vec![record(2, 42, 5, 0.50), record(4, 99, 5, 0.53), record(3, 42, 5, 0.53)];
        let best = CoherenceMatrix::from_records(&records, None).best().unwrap();
        assert_eq!(best.topic_count, 3);
        assert_eq!(best.combination().unwrap().key(), "3-auto-42-5-200");

        assert!(CoherenceMatrix::default().best().is_none());
    }

    #[test]
    fn test_csv_heatmap_layout() {
        let records = vec![record(2, 42, 5, 0.5), record(3, 99, 5, 0.25)];
        let matrix = CoherenceMatrix::from_records(&records, Some(2..=3));
        let mut out = Vec::new();
        matrix.to_writer(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "configuration,2,3\nauto-42-5-200,0.5,\nauto-99-5-200,,0.25\n"
        );
    }
}
