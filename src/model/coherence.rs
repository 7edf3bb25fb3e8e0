//! Document co-occurrence NPMI coherence
//!
//! For each topic, the top-N words that are in the vocabulary form pairs.
//! Each pair is scored with normalized pointwise mutual information over
//! boolean document co-occurrence in the reference texts:
//!
//! ```text
//! npmi(a, b) = ln(p(a,b) / (p(a) p(b))) / -ln(p(a,b))
//! ```
//!
//! Pair scores are averaged per topic, topics are averaged per model, and the
//! result is mapped from `[-1, 1]` to `[0, 1]`.

use rustc_hash::FxHashSet;

use super::{CoherenceScorer, TopicModel};
use crate::corpus::Vocabulary;
use crate::{Error, Result};

/// NPMI coherence scorer over boolean documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpmiCoherence {
    top_n: usize,
}

impl Default for NpmiCoherence {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

impl NpmiCoherence {
    /// Score using each topic's `top_n` words.
    #[must_use]
    pub const fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Words considered per topic.
    #[must_use]
    pub const fn top_n(&self) -> usize {
        self.top_n
    }
}

struct DocumentIndex<'a> {
    documents: Vec<FxHashSet<&'a str>>,
}

impl<'a> DocumentIndex<'a> {
    fn new(texts: &'a [Vec<String>]) -> Self {
        Self {
            documents: texts
                .iter()
                .map(|doc| doc.iter().map(String::as_str).collect())
                .collect(),
        }
    }

    fn count(&self, words: &[&str]) -> usize {
        self.documents
            .iter()
            .filter(|doc| words.iter().all(|w| doc.contains(w)))
            .count()
    }

    #[allow(clippy::cast_precision_loss)]
    fn npmi(&self, a: &str, b: &str) -> f64 {
        let n = self.documents.len() as f64;
        let joint = self.count(&[a, b]) as f64 / n;
        if joint <= 0.0 {
            return -1.0;
        }
        if joint >= 1.0 {
            return 1.0;
        }
        let pa = self.count(&[a]) as f64 / n;
        let pb = self.count(&[b]) as f64 / n;
        ((joint / (pa * pb)).ln() / -joint.ln()).clamp(-1.0, 1.0)
    }
}

impl<M: TopicModel> CoherenceScorer<M> for NpmiCoherence {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, model: &M, texts: &[Vec<String>], vocabulary: &Vocabulary) -> Result<f64> {
        if texts.is_empty() {
            return Err(Error::ConfigurationMissing(
                "reference texts for coherence scoring".to_string(),
            ));
        }
        let index = DocumentIndex::new(texts);

        let mut topic_scores = Vec::with_capacity(model.num_topics());
        for topic in 0..model.num_topics() {
            let words: Vec<String> = model
                .top_words(topic, self.top_n)
                .into_iter()
                .map(|(word, _)| word)
                .filter(|word| vocabulary.contains(word))
                .collect();
            if words.len() < 2 {
                continue;
            }
            let mut total = 0.0;
            let mut pairs = 0usize;
            for (i, a) in words.iter().enumerate() {
                for b in &words[i + 1..] {
                    total += index.npmi(a, b);
                    pairs += 1;
                }
            }
            topic_scores.push(total / pairs as f64);
        }

        if topic_scores.is_empty() {
            return Err(Error::Other(
                "no topic has two or more in-vocabulary words to score".to_string(),
            ));
        }
        let mean = topic_scores.iter().sum::<f64>() / topic_scores.len() as f64;
        Ok((mean + 1.0) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{HyperparameterCombination, PriorMode};
    use crate::model::TopicTermModel;

    fn texts() -> Vec<Vec<String>> {
        let docs: [&[&str]; 4] = [
            &["cod", "quota", "stock"],
            &["cod", "quota", "vessel"],
            &["neural", "network", "gradient"],
            &["neural", "network", "vessel"],
        ];
        docs.iter()
            .map(|d| d.iter().map(|w| (*w).to_string()).collect())
            .collect()
    }

    fn model(topics: Vec<Vec<&str>>) -> TopicTermModel {
        let c = HyperparameterCombination::new(2, PriorMode::Auto, 42, 5, 200).unwrap();
        TopicTermModel::new(
            c,
            topics
                .into_iter()
                .map(|words| words.into_iter().map(|w| (w.to_string(), 0.5)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_coherent_topics_score_higher() {
        let texts = texts();
        let vocab = Vocabulary::from_documents(&texts);
        let scorer = NpmiCoherence::new(3);

        let good = model(vec![vec!["cod", "quota"], vec!["neural", "network"]]);
        let bad = model(vec![vec!["cod", "neural"], vec!["quota", "gradient"]]);

        let good_score = scorer.score(&good, &texts, &vocab).unwrap();
        let bad_score = scorer.score(&bad, &texts, &vocab).unwrap();

        assert!(good_score > bad_score);
        assert!((0.0..=1.0).contains(&good_score));
        assert!((0.0..=1.0).contains(&bad_score));
        // never co-occurring pairs sit at the bottom of the range
        assert!(bad_score.abs() < 1e-12);
    }

    #[test]
    fn test_out_of_vocabulary_words_ignored() {
        let texts = texts();
        let vocab = Vocabulary::from_documents(&texts);
        let m = model(vec![vec!["cod", "whale", "quota"]]);
        let score = NpmiCoherence::default().score(&m, &texts, &vocab).unwrap();
        assert!(score > 0.5);
    }

    #[test]
    fn test_unscorable_model_is_error() {
        let texts = texts();
        let vocab = Vocabulary::from_documents(&texts);
        let m = model(vec![vec!["whale"], vec![]]);
        assert!(NpmiCoherence::default().score(&m, &texts, &vocab).is_err());
    }

    #[test]
    fn test_empty_reference_is_fatal() {
        let vocab = Vocabulary::from_documents::<String>(&[]);
        let m = model(vec![vec!["cod", "quota"]]);
        let err = NpmiCoherence::default().score(&m, &[], &vocab).unwrap_err();
        assert!(err.is_fatal());
    }
}
