//! JSON model persistence with atomic publication
//!
//! A model is written to a uniquely named sibling temp file and renamed onto
//! `<path>`. The grid search treats "a file exists at the artifact path" as
//! "done", so a process killed mid-write must never leave a partial file at
//! that path. Concurrent writers of the same cell each own their temp file;
//! the last rename wins.

use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use super::ModelPersistence;
use crate::{Error, Result};

/// Persists any serde model as JSON.
#[derive(Debug)]
pub struct JsonModelPersistence<M> {
    _model: PhantomData<fn() -> M>,
}

impl<M> JsonModelPersistence<M> {
    /// Create a persistence handle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<M> Default for JsonModelPersistence<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for JsonModelPersistence<M> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<M: Serialize + DeserializeOwned> ModelPersistence<M> for JsonModelPersistence<M> {
    fn save(&self, model: &M, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, model)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<M> {
        if !path.is_file() {
            return Err(Error::ArtifactMissing(path.to_path_buf()));
        }
        let reader = BufReader::new(fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
