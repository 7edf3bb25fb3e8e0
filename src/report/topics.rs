//! Topic interpretation tables
//!
//! `topic-list.csv` holds one line per topic: its 1-based index and its top
//! words joined by `", "`. `topic-table.csv` holds, per topic, a header line
//! `(n) LABEL`, a `word,prob.` line, one line per word and a blank separator.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::TopicModel;
use crate::Result;

/// File name of the topic list.
pub const TOPIC_LIST_FILE: &str = "topic-list.csv";

/// File name of the topic table.
pub const TOPIC_TABLE_FILE: &str = "topic-table.csv";

/// Human labels for topic indices (0-based), supplied as configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicLabels(BTreeMap<usize, String>);

impl TopicLabels {
    /// No labels; every topic falls back to `Topic <n>`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label of a 0-based topic index.
    #[must_use]
    pub fn with(mut self, topic: usize, label: impl Into<String>) -> Self {
        self.0.insert(topic, label.into());
        self
    }

    /// Label of a topic, or `Topic <topic + 1>` if none was given.
    #[must_use]
    pub fn label(&self, topic: usize) -> String {
        self.0
            .get(&topic)
            .cloned()
            .unwrap_or_else(|| format!("Topic {}", topic + 1))
    }

    /// Number of explicit labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no label was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for TopicLabels {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// One topic's label and top words.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    /// 0-based topic index.
    pub index: usize,
    /// Resolved label.
    pub label: String,
    /// Top `(word, probability)` pairs, descending.
    pub words: Vec<(String, f64)>,
}

/// Summaries of every topic of a model.
#[must_use]
pub fn topic_summaries<M: TopicModel>(model: &M, labels: &TopicLabels, top_n: usize) -> Vec<TopicSummary> {
    (0..model.num_topics())
        .map(|index| TopicSummary {
            index,
            label: labels.label(index),
            words: model.top_words(index, top_n),
        })
        .collect()
}

/// Probability rendered to three decimals without the leading zero (`.042`).
fn format_probability(p: f64) -> String {
    let s = format!("{p:.3}");
    match s.strip_prefix('0') {
        Some(rest) => rest.to_string(),
        None => s,
    }
}

fn flexible_writer(path: &Path) -> Result<csv::Writer<File>> {
    Ok(csv::WriterBuilder::new().flexible(true).from_path(path)?)
}

/// Write `topic-list.csv` content to `path`.
///
/// # Errors
///
/// Returns `Csv` if the file cannot be written.
pub fn write_topic_list_csv(summaries: &[TopicSummary], path: &Path) -> Result<()> {
    let mut writer = flexible_writer(path)?;
    for summary in summaries {
        let words: Vec<&str> = summary.words.iter().map(|(w, _)| w.as_str()).collect();
        writer.write_record([(summary.index + 1).to_string(), words.join(", ")])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `topic-table.csv` content to `path`.
///
/// # Errors
///
/// Returns `Csv` if the file cannot be written.
pub fn write_topic_table_csv(summaries: &[TopicSummary], path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for summary in summaries {
        // csv renders an empty record as `""`; the separator is written raw.
        let mut block = csv::WriterBuilder::new().flexible(true).from_writer(&mut out);
        block.write_record([format!("({}) {}", summary.index + 1, summary.label.to_uppercase())])?;
        block.write_record(["word", "prob."])?;
        for (word, p) in &summary.words {
            block.write_record([word.to_uppercase(), format_probability(*p)])?;
        }
        block.flush()?;
        drop(block);
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
