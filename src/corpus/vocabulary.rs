//! Vocabulary - token/id bijection with document-frequency pruning

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Frequency bounds applied by [`Vocabulary::filter_extremes`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PruningBounds {
    /// Drop tokens appearing in fewer documents than this.
    pub no_below: u32,
    /// Drop tokens appearing in more than this fraction of documents.
    pub no_above: f64,
    /// Keep at most this many tokens, most frequent first.
    pub keep_n: Option<usize>,
}

impl Default for PruningBounds {
    fn default() -> Self {
        Self {
            no_below: 5,
            no_above: 0.90,
            keep_n: Some(100_000),
        }
    }
}

impl PruningBounds {
    /// Check that `no_above` is a fraction in `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` otherwise.
    pub fn validate(&self) -> Result<()> {
        if !(self.no_above > 0.0 && self.no_above <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "pruning.no_above must be in (0, 1], got {}",
                self.no_above
            )));
        }
        Ok(())
    }
}

/// Sparse bag-of-words for one document: `(token id, count)` sorted by id.
pub type SparseDocument = Vec<(u32, u32)>;

/// Token to integer id mapping built from tokenized documents.
///
/// Ids are dense (`0..len`) and assigned in first-seen order; pruning
/// compacts them while preserving relative order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VocabularyRepr", into = "VocabularyRepr")]
pub struct Vocabulary {
    token_to_id: FxHashMap<String, u32>,
    tokens: Vec<String>,
    document_frequencies: Vec<u32>,
    num_documents: u32,
}

#[derive(Serialize, Deserialize)]
struct VocabularyRepr {
    tokens: Vec<String>,
    document_frequencies: Vec<u32>,
    num_documents: u32,
}

impl From<VocabularyRepr> for Vocabulary {
    fn from(repr: VocabularyRepr) -> Self {
        Self::from_parts(repr.tokens, repr.document_frequencies, repr.num_documents)
    }
}

impl From<Vocabulary> for VocabularyRepr {
    fn from(vocabulary: Vocabulary) -> Self {
        Self {
            tokens: vocabulary.tokens,
            document_frequencies: vocabulary.document_frequencies,
            num_documents: vocabulary.num_documents,
        }
    }
}

impl Vocabulary {
    /// Build a vocabulary from tokenized documents.
    #[must_use]
    pub fn from_documents<S: AsRef<str>>(documents: &[Vec<S>]) -> Self {
        let mut vocabulary = Self::from_parts(Vec::new(), Vec::new(), 0);
        for document in documents {
            vocabulary.add_document(document);
        }
        vocabulary
    }

    fn from_parts(tokens: Vec<String>, document_frequencies: Vec<u32>, num_documents: u32) -> Self {
        let token_to_id = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as u32))
            .collect();
        Self {
            token_to_id,
            tokens,
            document_frequencies,
            num_documents,
        }
    }

    fn add_document<S: AsRef<str>>(&mut self, document: &[S]) {
        self.num_documents += 1;
        let mut seen = FxHashSet::default();
        for token in document {
            let token = token.as_ref();
            let id = match self.token_to_id.get(token) {
                Some(&id) => id,
                None => {
                    let id = self.tokens.len() as u32;
                    self.token_to_id.insert(token.to_string(), id);
                    self.tokens.push(token.to_string());
                    self.document_frequencies.push(0);
                    id
                }
            };
            if seen.insert(id) {
                self.document_frequencies[id as usize] += 1;
            }
        }
    }

    /// Drop rare and ubiquitous tokens, then cap the vocabulary size.
    pub fn filter_extremes(&mut self, bounds: &PruningBounds) {
        let max_df = bounds.no_above * f64::from(self.num_documents);
        let mut keep: Vec<u32> = (0..self.tokens.len() as u32)
            .filter(|&id| {
                let df = self.document_frequencies[id as usize];
                df >= bounds.no_below && f64::from(df) <= max_df
            })
            .collect();

        if let Some(keep_n) = bounds.keep_n {
            if keep.len() > keep_n {
                keep.sort_by(|a, b| {
                    self.document_frequencies[*b as usize]
                        .cmp(&self.document_frequencies[*a as usize])
                        .then(a.cmp(b))
                });
                keep.truncate(keep_n);
                keep.sort_unstable();
            }
        }

        let before = self.tokens.len();
        let tokens = keep.iter().map(|&id| self.tokens[id as usize].clone()).collect();
        let dfs = keep
            .iter()
            .map(|&id| self.document_frequencies[id as usize])
            .collect();
        *self = Self::from_parts(tokens, dfs, self.num_documents);
        tracing::debug!(before, after = self.tokens.len(), "pruned vocabulary");
    }

    /// Encode a token sequence as sorted `(id, count)` pairs; unknown tokens are ignored.
    #[must_use]
    pub fn doc2bow<S: AsRef<str>>(&self, document: &[S]) -> SparseDocument {
        let mut counts: FxHashMap<u32, u32> = FxHashMap::default();
        for token in document {
            if let Some(&id) = self.token_to_id.get(token.as_ref()) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: SparseDocument = counts.into_iter().collect();
        bow.sort_unstable_by_key(|&(id, _)| id);
        bow
    }

    /// Id of a token.
    #[must_use]
    pub fn id(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Token for an id.
    #[must_use]
    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// Whether a token is in the vocabulary.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Number of documents containing the token with this id.
    #[must_use]
    pub fn document_frequency(&self, id: u32) -> Option<u32> {
        self.document_frequencies.get(id as usize).copied()
    }

    /// Number of documents the vocabulary was built from.
    #[must_use]
    pub const fn num_documents(&self) -> u32 {
        self.num_documents
    }

    /// Tokens in id order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the vocabulary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Vec<&'static str>> {
        vec![
            vec!["fish", "stock", "fish", "model"],
            vec!["fish", "stock", "catch"],
            vec!["fish", "model", "quota"],
            vec!["fish", "stock", "model"],
        ]
    }

    #[test]
    fn test_ids_first_seen_order() {
        let vocab = Vocabulary::from_documents(&docs());
        assert_eq!(vocab.tokens(), &["fish", "stock", "model", "catch", "quota"]);
        assert_eq!(vocab.id("model"), Some(2));
        assert_eq!(vocab.token(3), Some("catch"));
        assert_eq!(vocab.num_documents(), 4);
    }

    #[test]
    fn test_document_frequency_counts_once_per_document() {
        let vocab = Vocabulary::from_documents(&docs());
        assert_eq!(vocab.document_frequency(vocab.id("fish").unwrap()), Some(4));
        assert_eq!(vocab.document_frequency(vocab.id("quota").unwrap()), Some(1));
    }

    #[test]
    fn test_filter_extremes_bounds() {
        let mut vocab = Vocabulary::from_documents(&docs());
        vocab.filter_extremes(&PruningBounds {
            no_below: 2,
            no_above: 0.9,
            keep_n: None,
        });
        // fish is in 4/4 documents (> 0.9), catch and quota in 1
        assert_eq!(vocab.tokens(), &["stock", "model"]);
        assert_eq!(vocab.id("stock"), Some(0));
        assert_eq!(vocab.id("fish"), None);
    }

    #[test]
    fn test_filter_extremes_keep_n_preserves_order() {
        let mut vocab = Vocabulary::from_documents(&docs());
        vocab.filter_extremes(&PruningBounds {
            no_below: 1,
            no_above: 1.0,
            keep_n: Some(2),
        });
        assert_eq!(vocab.tokens(), &["fish", "stock"]);
    }

    #[test]
    fn test_doc2bow_sorted_and_ignores_unknown() {
        let vocab = Vocabulary::from_documents(&docs());
        let bow = vocab.doc2bow(&["model", "fish", "fish", "unknown"]);
        assert_eq!(bow, vec![(0, 2), (2, 1)]);
    }

    #[test]
    fn test_serde_rebuilds_lookup() {
        let vocab = Vocabulary::from_documents(&docs());
        let json = serde_json::to_string(&vocab).unwrap();
        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id("quota"), vocab.id("quota"));
        assert_eq!(restored, vocab);
    }

    #[test]
    fn test_pruning_bounds_validate() {
        assert!(PruningBounds::default().validate().is_ok());
        let bad = PruningBounds {
            no_above: 1.5,
            ..PruningBounds::default()
        };
        assert!(bad.validate().is_err());
    }
}
