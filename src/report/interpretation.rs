//! Corpus views over inferred document-topic distributions
//!
//! - `titles-to-topics.csv`: each publication's dominant topic
//! - `topics-over-time.csv`: mean topic distribution per publication year
//! - `topic-co-occurrence.csv`: for documents dominated by one topic, the mean
//!   share (in percent) of every other topic
//!
//! Topic columns and numbers are 1-based, like the topic tables.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use super::TopicLabels;
use crate::document::DocumentTopics;
use crate::Result;

/// File name of the dominant-topic table.
pub const TITLES_TO_TOPICS_FILE: &str = "titles-to-topics.csv";

/// File name of the per-year topic table.
pub const TOPICS_OVER_TIME_FILE: &str = "topics-over-time.csv";

/// File name of the topic co-occurrence table.
pub const TOPIC_CO_OCCURRENCE_FILE: &str = "topic-co-occurrence.csv";

/// A publication and its dominant topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleTopic {
    /// Publication year, if known.
    pub year: Option<i32>,
    /// Publication title.
    pub title: String,
    /// 0-based index of the dominant topic.
    pub topic: usize,
    /// Its proportion in the publication.
    pub proportion: f64,
}

/// Dominant topic of every publication with a non-empty distribution, in
/// record order.
#[must_use]
pub fn titles_to_topics(records: &[DocumentTopics]) -> Vec<TitleTopic> {
    records
        .iter()
        .filter_map(|record| {
            let (topic, proportion) = record.dominant()?;
            Some(TitleTopic {
                year: record.year(),
                title: record.title().to_string(),
                topic,
                proportion,
            })
        })
        .collect()
}

/// Write `year,title,topic,label,proportion` rows, with a header line.
///
/// # Errors
///
/// Returns `Io` or `Csv` if the file cannot be written.
pub fn write_titles_to_topics_csv(rows: &[TitleTopic], labels: &TopicLabels, path: &Path) -> Result<()> {
    let mut csv = csv::Writer::from_path(path)?;
    csv.write_record(["year", "title", "topic", "label", "proportion"])?;
    for row in rows {
        csv.write_record([
            row.year.map(|y| y.to_string()).unwrap_or_default(),
            row.title.clone(),
            (row.topic + 1).to_string(),
            labels.label(row.topic),
            row.proportion.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Mean topic distribution of one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearTopics {
    /// Publications of that year.
    pub documents: usize,
    /// Mean proportion per topic.
    pub means: Vec<f64>,
}

/// Per-year mean topic distributions.
///
/// ```text
/// year  docs  Topic 1  Topic 2
/// 2016    12    0.31     0.69
/// 2017     9    0.42     0.58
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TopicsOverTime {
    num_topics: usize,
    years: BTreeMap<i32, YearTopics>,
}

impl TopicsOverTime {
    /// Group distributions by year and average them. Records without a year
    /// or without any topic mass are left out.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[DocumentTopics], num_topics: usize) -> Self {
        let mut sums: BTreeMap<i32, (usize, Vec<f64>)> = BTreeMap::new();
        let mut undated = 0usize;
        for record in records.iter().filter(|r| !r.topics().is_empty()) {
            let Some(year) = record.year() else {
                undated += 1;
                continue;
            };
            let (count, sum) = sums.entry(year).or_insert_with(|| (0, vec![0.0; num_topics]));
            *count += 1;
            for (acc, p) in sum.iter_mut().zip(record.dense(num_topics)) {
                *acc += p;
            }
        }
        if undated > 0 {
            tracing::debug!(undated, "distributions without a year left out of topics over time");
        }

        let years = sums
            .into_iter()
            .map(|(year, (documents, sum))| {
                let means = sum.into_iter().map(|s| s / documents as f64).collect();
                (year, YearTopics { documents, means })
            })
            .collect();
        Self { num_topics, years }
    }

    /// Number of topic columns.
    #[must_use]
    pub const fn num_topics(&self) -> usize {
        self.num_topics
    }

    /// Years with at least one distribution, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    /// Aggregate of one year.
    #[must_use]
    pub fn year(&self, year: i32) -> Option<&YearTopics> {
        self.years.get(&year)
    }

    /// Mean proportion of one topic per year, ascending by year.
    #[must_use]
    pub fn topic_series(&self, topic: usize) -> Vec<(i32, f64)> {
        self.years
            .iter()
            .filter_map(|(&year, row)| row.means.get(topic).map(|&m| (year, m)))
            .collect()
    }

    /// Number of years.
    #[must_use]
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// True if no dated distribution was seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Write `year,documents,<label 1>,..` then one row per year.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Csv` if the writer fails.
    pub fn to_writer<W: io::Write>(&self, labels: &TopicLabels, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = vec!["year".to_string(), "documents".to_string()];
        header.extend((0..self.num_topics).map(|t| labels.label(t)));
        csv.write_record(&header)?;

        for (year, row) in &self.years {
            let mut record = vec![year.to_string(), row.documents.to_string()];
            record.extend(row.means.iter().map(f64::to_string));
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the table to a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Csv` if the file cannot be written.
    pub fn write_csv(&self, labels: &TopicLabels, path: &Path) -> Result<()> {
        self.to_writer(labels, File::create(path)?)
    }
}

/// Topic shares among documents dominated by one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct CoOccurrenceRow {
    /// 0-based dominant topic.
    pub dominant: usize,
    /// Documents it dominates.
    pub documents: usize,
    /// Mean share of the dominant topic itself, in percent.
    pub own_share: f64,
    /// Mean share of every topic, in percent; the dominant topic's own cell is 0.
    pub shares: Vec<f64>,
}

/// Which topics appear alongside each dominant topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCoOccurrence {
    num_topics: usize,
    rows: Vec<CoOccurrenceRow>,
}

impl TopicCoOccurrence {
    /// Group distributions by dominant topic and average them. Rows are
    /// ordered by descending `own_share`, then by topic.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[DocumentTopics], num_topics: usize) -> Self {
        let mut sums: BTreeMap<usize, (usize, Vec<f64>)> = BTreeMap::new();
        for record in records {
            let Some((dominant, _)) = record.dominant() else {
                continue;
            };
            if dominant >= num_topics {
                continue;
            }
            let (count, sum) = sums.entry(dominant).or_insert_with(|| (0, vec![0.0; num_topics]));
            *count += 1;
            for (acc, p) in sum.iter_mut().zip(record.dense(num_topics)) {
                *acc += p;
            }
        }

        let mut rows: Vec<CoOccurrenceRow> = sums
            .into_iter()
            .map(|(dominant, (documents, sum))| {
                let mut shares: Vec<f64> = sum.into_iter().map(|s| s / documents as f64 * 100.0).collect();
                let own_share = std::mem::take(&mut shares[dominant]);
                CoOccurrenceRow {
                    dominant,
                    documents,
                    own_share,
                    shares,
                }
            })
            .collect();
        rows.sort_by(|a, b| b.own_share.total_cmp(&a.own_share).then(a.dominant.cmp(&b.dominant)));
        Self { num_topics, rows }
    }

    /// Rows, strongest dominant topic first.
    #[must_use]
    pub fn rows(&self) -> &[CoOccurrenceRow] {
        &self.rows
    }

    /// Mean share (percent) of `other` in documents dominated by `dominant`.
    #[must_use]
    pub fn get(&self, dominant: usize, other: usize) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.dominant == dominant)
            .and_then(|row| row.shares.get(other).copied())
    }

    /// Write `dominant,documents,<label 1>,..`; the first column reads
    /// `<label> (<own share>%)`.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Csv` if the writer fails.
    pub fn to_writer<W: io::Write>(&self, labels: &TopicLabels, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = vec!["dominant".to_string(), "documents".to_string()];
        header.extend((0..self.num_topics).map(|t| labels.label(t)));
        csv.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                format!("{} ({:.2}%)", labels.label(row.dominant), row.own_share),
                row.documents.to_string(),
            ];
            record.extend(row.shares.iter().map(|s| format!("{s:.1}")));
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the table to a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Csv` if the file cannot be written.
    pub fn write_csv(&self, labels: &TopicLabels, path: &Path) -> Result<()> {
        self.to_writer(labels, File::create(path)?)
    }
}
