//! Publication - a raw document and its tokenization state, plus the
//! per-publication topic distribution inferred from a fitted model

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Document, DocumentId, DocumentStore};
use crate::corpus::Vocabulary;
use crate::model::TopicModel;
use crate::{Error, Result};

/// Whether a publication has been through preprocessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "tokens", rename_all = "snake_case")]
pub enum TokenState {
    /// Not yet tokenized.
    Pending,
    /// Lemmatized tokens produced by preprocessing.
    Tokenized(Vec<String>),
}

/// A publication stored in the raw collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    tokens: TokenState,
}

impl Publication {
    /// A publication awaiting tokenization.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: None,
            text: None,
            tokens: TokenState::Pending,
        }
    }

    /// Set the publication year.
    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the extracted plain text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Mark as tokenized.
    #[must_use]
    pub fn with_tokens(mut self, tokens: Vec<String>) -> Self {
        self.tokens = TokenState::Tokenized(tokens);
        self
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Publication year, if known.
    #[must_use]
    pub const fn year(&self) -> Option<i32> {
        self.year
    }

    /// Extracted plain text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Tokenization state.
    #[must_use]
    pub const fn token_state(&self) -> &TokenState {
        &self.tokens
    }

    /// Tokens, if tokenized.
    #[must_use]
    pub fn tokens(&self) -> Option<&[String]> {
        match &self.tokens {
            TokenState::Pending => None,
            TokenState::Tokenized(tokens) => Some(tokens),
        }
    }
}

/// Attach tokens to a stored publication, replacing it in place.
///
/// # Errors
///
/// Returns `Json` if the stored body is not a publication, or the store's
/// error if the update fails.
pub async fn store_tokens<S: DocumentStore>(
    store: &S,
    collection: &str,
    document: &Document,
    tokens: Vec<String>,
) -> Result<()> {
    let publication: Publication = document.decode()?;
    let updated = document.with_body(&publication.with_tokens(tokens))?;
    store.update_by_id(collection, &updated).await
}

/// Token lists of every tokenized publication in a collection, in store order.
///
/// Pending publications and bodies that are not publications are skipped
/// with a warning.
///
/// # Errors
///
/// Returns `ConfigurationMissing` if no publication is tokenized, or the
/// store's error if the collection cannot be read.
pub async fn reference_texts<S: DocumentStore>(
    store: &S,
    collection: &str,
) -> Result<Vec<Vec<String>>> {
    let documents = store.read_all(collection).await?;
    let mut texts = Vec::with_capacity(documents.len());
    let mut pending = 0usize;
    for document in &documents {
        match document.decode::<Publication>() {
            Ok(publication) => match publication.tokens {
                TokenState::Tokenized(tokens) => texts.push(tokens),
                TokenState::Pending => pending += 1,
            },
            Err(e) => {
                tracing::warn!(id = %document.id(), error = %e, "skipping malformed publication");
            }
        }
    }
    if pending > 0 {
        tracing::warn!(pending, collection, "publications not yet tokenized are excluded");
    }
    if texts.is_empty() {
        return Err(Error::ConfigurationMissing(format!(
            "no tokenized publications in collection '{collection}'"
        )));
    }
    Ok(texts)
}

/// Inferred topic distribution of one publication.
///
/// Stored as `{"source": 7, "title": .., "year": 2017, "topics": {"0": 0.61, "3": 0.39}}`;
/// `source` is the id of the publication in the raw collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTopics {
    source: DocumentId,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    topics: BTreeMap<usize, f64>,
}

impl DocumentTopics {
    /// Distribution of the publication stored under `source`.
    #[must_use]
    pub fn new(
        source: DocumentId,
        publication: &Publication,
        topics: impl IntoIterator<Item = (usize, f64)>,
    ) -> Self {
        Self {
            source,
            title: publication.title.clone(),
            year: publication.year,
            topics: topics.into_iter().collect(),
        }
    }

    /// Id of the publication in the raw collection.
    #[must_use]
    pub const fn source(&self) -> DocumentId {
        self.source
    }

    /// Publication title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Publication year, if known.
    #[must_use]
    pub const fn year(&self) -> Option<i32> {
        self.year
    }

    /// Non-zero topic proportions keyed by 0-based topic index.
    #[must_use]
    pub const fn topics(&self) -> &BTreeMap<usize, f64> {
        &self.topics
    }

    /// The topic with the largest proportion; ties go to the lower index.
    #[must_use]
    pub fn dominant(&self) -> Option<(usize, f64)> {
        self.topics.iter().fold(None, |best, (&topic, &p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((topic, p)),
        })
    }

    /// Proportions of topics `0..num_topics`, zero where absent.
    #[must_use]
    pub fn dense(&self, num_topics: usize) -> Vec<f64> {
        let mut out = vec![0.0; num_topics];
        for (&topic, &p) in self.topics.range(..num_topics) {
            out[topic] = p;
        }
        out
    }
}

/// Counts from one topic inference pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceReport {
    inserted: usize,
    already_inferred: usize,
    untokenized: usize,
    no_evidence: usize,
}

impl InferenceReport {
    /// Distributions written in this pass.
    #[must_use]
    pub const fn inserted(&self) -> usize {
        self.inserted
    }

    /// Publications that already had a distribution.
    #[must_use]
    pub const fn already_inferred(&self) -> usize {
        self.already_inferred
    }

    /// Publications skipped because they are not tokenized.
    #[must_use]
    pub const fn untokenized(&self) -> usize {
        self.untokenized
    }

    /// Publications none of whose tokens carry weight in any topic.
    #[must_use]
    pub const fn no_evidence(&self) -> usize {
        self.no_evidence
    }
}

/// Every decodable [`DocumentTopics`] in a collection, in store order.
///
/// # Errors
///
/// Returns the store's error if the collection cannot be read.
pub async fn read_document_topics<S: DocumentStore>(
    store: &S,
    collection: &str,
) -> Result<Vec<DocumentTopics>> {
    let documents = store.read_all(collection).await?;
    Ok(documents
        .iter()
        .filter_map(|document| match document.decode::<DocumentTopics>() {
            Ok(topics) => Some(topics),
            Err(e) => {
                warn!(id = %document.id(), collection, error = %e, "skipping malformed topic distribution");
                None
            }
        })
        .collect())
}

/// Infer and store the topic distribution of every tokenized publication in
/// `raw_collection` that has none in `collection` yet.
///
/// Insert-only: publications already inferred are left alone, so the pass can
/// be re-run after an interruption.
///
/// # Errors
///
/// Returns the store's error if a collection cannot be read or a record
/// cannot be inserted.
pub async fn store_document_topics<S, M>(
    store: &S,
    raw_collection: &str,
    collection: &str,
    model: &M,
    vocabulary: &Vocabulary,
) -> Result<InferenceReport>
where
    S: DocumentStore,
    M: TopicModel,
{
    let done: HashSet<DocumentId> = read_document_topics(store, collection)
        .await?
        .iter()
        .map(DocumentTopics::source)
        .collect();
    let documents = store.read_all(raw_collection).await?;

    let mut report = InferenceReport::default();
    for (i, document) in documents.iter().enumerate() {
        if done.contains(&document.id()) {
            report.already_inferred += 1;
            continue;
        }
        let publication: Publication = match document.decode() {
            Ok(publication) => publication,
            Err(e) => {
                warn!(id = %document.id(), error = %e, "skipping malformed publication");
                continue;
            }
        };
        let Some(tokens) = publication.tokens() else {
            report.untokenized += 1;
            continue;
        };
        debug!("inferring topics: {}/{} {}", i + 1, documents.len(), publication.title());

        let topics = model.document_topics(&vocabulary.doc2bow(tokens), vocabulary);
        if topics.is_empty() {
            report.no_evidence += 1;
            continue;
        }
        let record = DocumentTopics::new(document.id(), &publication, topics);
        store.insert_typed(collection, &record).await?;
        report.inserted += 1;
    }

    info!(
        inserted = report.inserted,
        already_inferred = report.already_inferred,
        untokenized = report.untokenized,
        no_evidence = report.no_evidence,
        "document topic inference finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocumentStore;
    use crate::experiment::{HyperparameterCombination, PriorMode};
    use crate::model::TopicTermModel;

    #[test]
    fn test_token_state_json_shape() {
        let p = Publication::new("Narrow lenses").with_tokens(vec!["fishery".into()]);
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["tokens"]["state"], "tokenized");
        assert_eq!(value["tokens"]["tokens"][0], "fishery");

        let pending = serde_json::to_value(Publication::new("Draft")).unwrap();
        assert_eq!(pending["tokens"]["state"], "pending");
    }

    #[tokio::test]
    async fn test_store_tokens_then_reference_texts() {
        let store = MemoryDocumentStore::new();
        store
            .insert_typed("publications_raw", &Publication::new("A").with_year(2017))
            .await
            .unwrap();
        store
            .insert_typed("publications_raw", &Publication::new("B"))
            .await
            .unwrap();

        let err = reference_texts(&store, "publications_raw").await.unwrap_err();
        assert!(err.is_fatal());

        let docs = store.read_all("publications_raw").await.unwrap();
        store_tokens(&store, "publications_raw", &docs[0], vec!["topic".into(), "model".into()])
            .await
            .unwrap();

        let texts = reference_texts(&store, "publications_raw").await.unwrap();
        assert_eq!(texts, vec![vec!["topic".to_string(), "model".to_string()]]);

        let stored: Publication = store.read_all("publications_raw").await.unwrap()[0]
            .decode()
            .unwrap();
        assert_eq!(stored.year(), Some(2017));
        assert_eq!(stored.tokens().map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_document_topics_json_shape_and_dominant() {
        let p = Publication::new("Narrow lenses").with_year(2018);
        let record = DocumentTopics::new(DocumentId::new(3), &p, [(0, 0.3), (2, 0.7)]);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["source"], 3);
        assert_eq!(value["year"], 2018);
        assert_eq!(value["topics"]["2"], 0.7);

        let back: DocumentTopics = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
        assert_eq!(record.dominant(), Some((2, 0.7)));
        assert_eq!(record.dense(4), vec![0.3, 0.0, 0.7, 0.0]);
        assert_eq!(record.dense(2), vec![0.3, 0.0]);
    }

    #[test]
    fn test_dominant_tie_goes_to_lower_topic() {
        let record = DocumentTopics::new(DocumentId::new(1), &Publication::new("T"), [(4, 0.5), (1, 0.5)]);
        assert_eq!(record.dominant(), Some((1, 0.5)));
        let empty = DocumentTopics::new(DocumentId::new(2), &Publication::new("E"), []);
        assert_eq!(empty.dominant(), None);
    }

    #[tokio::test]
    async fn test_store_document_topics_is_insert_only() {
        let store = MemoryDocumentStore::new();
        let tokenized = [("A", 2017, vec!["fish", "stock"]), ("B", 2018, vec!["net"]), ("C", 2018, vec!["zzz"])];
        for (title, year, tokens) in &tokenized {
            let tokens = tokens.iter().map(ToString::to_string).collect();
            store
                .insert_typed("publications_raw", &Publication::new(*title).with_year(*year).with_tokens(tokens))
                .await
                .unwrap();
        }
        store
            .insert_typed("publications_raw", &Publication::new("Draft"))
            .await
            .unwrap();

        let texts: Vec<Vec<&str>> = tokenized.iter().map(|(_, _, t)| t.clone()).collect();
        let vocabulary = Vocabulary::from_documents(&texts);
        let c = HyperparameterCombination::new(2, PriorMode::Auto, 42, 5, 200).unwrap();
        let model = TopicTermModel::new(
            c,
            vec![vec![("fish".into(), 0.6), ("stock".into(), 0.4)], vec![("net".into(), 1.0)]],
        );

        let first = store_document_topics(&store, "publications_raw", "publications", &model, &vocabulary)
            .await
            .unwrap();
        assert_eq!(first.inserted(), 2);
        assert_eq!(first.untokenized(), 1);
        assert_eq!(first.no_evidence(), 1);

        let records = read_document_topics(&store, "publications").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title(), "A");
        assert_eq!(records[0].dominant(), Some((0, 1.0)));
        assert_eq!(records[1].year(), Some(2018));
        assert_eq!(records[1].dominant(), Some((1, 1.0)));

        let second = store_document_topics(&store, "publications_raw", "publications", &model, &vocabulary)
            .await
            .unwrap();
        assert_eq!(second.inserted(), 0);
        assert_eq!(second.already_inferred(), 2);
        assert_eq!(store.len("publications"), 2);
    }
}
