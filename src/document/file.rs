//! JSON-lines document store: one `<collection>.jsonl` file per collection.
//!
//! Each line is a serialized [`Document`] (`{"id": n, "body": {...}}`).
//! Inserts append a line; updates rewrite the file through a temporary
//! sibling and a rename. Writers inside one process are serialized by a
//! mutex; separate processes should write to separate collections.
//!
//! A final line without a trailing newline that fails to parse is a torn
//! append from a killed writer. Reads skip it with a warning and the next
//! insert truncates it away. Any other unparseable line is an error.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{Document, DocumentId, DocumentStore};
use crate::{Error, Result};

/// Durable document store backed by JSON-lines files.
#[derive(Debug)]
pub struct JsonlDocumentStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlDocumentStore {
    /// Open a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Directory holding the collection files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::StorageError(format!(
                "invalid collection name '{collection}' (use letters, digits, '_' or '-')"
            )));
        }
        Ok(self.dir.join(format!("{collection}.jsonl")))
    }

    async fn load(&self, path: &Path) -> Result<Vec<Document>> {
        Ok(load_with_tail(path).await?.0)
    }
}

/// Parse a collection file. The second value is the byte length of the intact
/// prefix when a torn final line was skipped.
async fn load_with_tail(path: &Path) -> Result<(Vec<Document>, Option<u64>)> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), None)),
        Err(e) => return Err(e.into()),
    };
    parse_lines(path, &contents)
}

fn parse_lines(path: &Path, contents: &str) -> Result<(Vec<Document>, Option<u64>)> {
    let unterminated = !contents.is_empty() && !contents.ends_with('\n');
    let last = contents.split_inclusive('\n').count().saturating_sub(1);

    let mut docs = Vec::new();
    let mut offset = 0usize;
    for (n, raw) in contents.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(doc) => docs.push(doc),
            Err(e) if unterminated && n == last => {
                tracing::warn!(
                    path = %path.display(),
                    line = n + 1,
                    error = %e,
                    "skipping torn final line"
                );
                return Ok((docs, Some(start as u64)));
            }
            Err(e) => {
                return Err(Error::StorageError(format!(
                    "{} line {}: {e}",
                    path.display(),
                    n + 1
                )));
            }
        }
    }
    Ok((docs, None))
}

impl DocumentStore for JsonlDocumentStore {
    async fn read_all(&self, collection: &str) -> Result<Vec<Document>> {
        let path = self.collection_path(collection)?;
        self.load(&path).await
    }

    async fn insert_one(&self, collection: &str, body: serde_json::Value) -> Result<DocumentId> {
        let path = self.collection_path(collection)?;
        let _guard = self.write_lock.lock().await;

        let (existing, torn_at) = load_with_tail(&path).await?;
        let id = DocumentId::new(existing.iter().map(|d| d.id().get()).max().unwrap_or(0) + 1);

        let mut line = serde_json::to_string(&Document::new(id, body))?;
        line.push('\n');

        fs::create_dir_all(&self.dir).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        if let Some(len) = torn_at {
            file.set_len(len).await?;
        }
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(id)
    }

    async fn update_by_id(&self, collection: &str, document: &Document) -> Result<()> {
        let path = self.collection_path(collection)?;
        let _guard = self.write_lock.lock().await;

        let mut docs = self.load(&path).await?;
        let slot = docs
            .iter_mut()
            .find(|doc| doc.id() == document.id())
            .ok_or_else(|| Error::DocumentNotFound {
                collection: collection.to_string(),
                id: document.id().get(),
            })?;
        *slot = document.clone();

        let mut contents = String::new();
        for doc in &docs {
            contents.push_str(&serde_json::to_string(doc)?);
            contents.push('\n');
        }
        let tmp = path.with_extension("jsonl.tmp");
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
