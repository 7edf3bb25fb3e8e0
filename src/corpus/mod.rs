//! Corpus artifacts: vocabulary and bag-of-words encoding
//!
//! Built once per pipeline run from tokenized publications and shared,
//! read-only, by every grid cell and by the coherence pass.
//!
//! ## On-disk layout
//!
//! ```text
//! <corpus_dir>/dictionary.json   Vocabulary
//! <corpus_dir>/corpus.json       EncodedCorpus
//! ```

mod vocabulary;

pub use vocabulary::{PruningBounds, SparseDocument, Vocabulary};

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File name of the persisted vocabulary.
pub const DICTIONARY_FILE: &str = "dictionary.json";

/// File name of the persisted encoded corpus.
pub const CORPUS_FILE: &str = "corpus.json";

/// Sparse term-frequency vectors, one per document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedCorpus {
    documents: Vec<SparseDocument>,
}

impl EncodedCorpus {
    /// Encode tokenized documents against a vocabulary.
    #[must_use]
    pub fn encode<S: AsRef<str>>(vocabulary: &Vocabulary, documents: &[Vec<S>]) -> Self {
        Self {
            documents: documents.iter().map(|doc| vocabulary.doc2bow(doc)).collect(),
        }
    }

    /// Encoded documents.
    #[must_use]
    pub fn documents(&self) -> &[SparseDocument] {
        &self.documents
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus has no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total token occurrences across all documents.
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.documents
            .iter()
            .flat_map(|doc| doc.iter().map(|&(_, count)| u64::from(count)))
            .sum()
    }
}

/// The vocabulary and encoded corpus every model fit consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusArtifacts {
    vocabulary: Vocabulary,
    corpus: EncodedCorpus,
}

impl CorpusArtifacts {
    /// Build the vocabulary, prune it, and encode the documents.
    #[must_use]
    pub fn build<S: AsRef<str>>(documents: &[Vec<S>], bounds: &PruningBounds) -> Self {
        let mut vocabulary = Vocabulary::from_documents(documents);
        vocabulary.filter_extremes(bounds);
        let corpus = EncodedCorpus::encode(&vocabulary, documents);
        tracing::info!(
            documents = corpus.len(),
            vocabulary = vocabulary.len(),
            "built corpus artifacts"
        );
        Self { vocabulary, corpus }
    }

    /// Pair an existing vocabulary and corpus.
    #[must_use]
    pub const fn new(vocabulary: Vocabulary, corpus: EncodedCorpus) -> Self {
        Self { vocabulary, corpus }
    }

    /// Vocabulary.
    #[must_use]
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Encoded corpus.
    #[must_use]
    pub const fn corpus(&self) -> &EncodedCorpus {
        &self.corpus
    }

    /// Whether both artifacts are present in `dir`.
    #[must_use]
    pub fn exists(dir: &Path) -> bool {
        dir.join(DICTIONARY_FILE).is_file() && dir.join(CORPUS_FILE).is_file()
    }

    /// Write both artifacts to `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Json` if writing fails.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        write_json(&dir.join(DICTIONARY_FILE), &self.vocabulary)?;
        write_json(&dir.join(CORPUS_FILE), &self.corpus)?;
        tracing::debug!(dir = %dir.display(), "saved corpus artifacts");
        Ok(())
    }

    /// Read both artifacts from `dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` naming the first absent file, or
    /// `Io`/`Json` if a present file cannot be read.
    pub fn load(dir: &Path) -> Result<Self> {
        let dictionary_path = dir.join(DICTIONARY_FILE);
        if !dictionary_path.is_file() {
            return Err(Error::ConfigurationMissing(format!(
                "vocabulary not found at {}",
                dictionary_path.display()
            )));
        }
        let corpus_path = dir.join(CORPUS_FILE);
        if !corpus_path.is_file() {
            return Err(Error::ConfigurationMissing(format!(
                "encoded corpus not found at {}",
                corpus_path.display()
            )));
        }
        let vocabulary: Vocabulary = read_json(&dictionary_path)?;
        let corpus: EncodedCorpus = read_json(&corpus_path)?;
        Ok(Self { vocabulary, corpus })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> Vec<Vec<String>> {
        (0..6)
            .map(|i| {
                vec!["alpha".to_string(), format!("beta{}", i % 2), "gamma".to_string()]
            })
            .collect()
    }

    #[test]
    fn test_build_and_encode() {
        let bounds = PruningBounds {
            no_below: 1,
            no_above: 1.0,
            keep_n: None,
        };
        let artifacts = CorpusArtifacts::build(&texts(), &bounds);
        assert_eq!(artifacts.vocabulary().len(), 4);
        assert_eq!(artifacts.corpus().len(), 6);
        assert_eq!(artifacts.corpus().total_tokens(), 18);
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = CorpusArtifacts::build(&texts(), &PruningBounds::default());
        artifacts.save(dir.path()).unwrap();
        assert!(CorpusArtifacts::exists(dir.path()));
        assert_eq!(CorpusArtifacts::load(dir.path()).unwrap(), artifacts);
    }

    #[test]
    fn test_load_missing_is_configuration_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = CorpusArtifacts::load(dir.path()).unwrap_err();
        assert!(err.is_fatal());
        assert!(format!("{err}").contains("vocabulary"));

        fs::write(dir.path().join(DICTIONARY_FILE), b"{\"tokens\":[],\"document_frequencies\":[],\"num_documents\":0}").unwrap();
        let err = CorpusArtifacts::load(dir.path()).unwrap_err();
        assert!(format!("{err}").contains("encoded corpus"));
    }
}
