use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{ser::PrettyFormatter, Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::PatientRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read patient document {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write patient document {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Patient document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Patient document must be a JSON object keyed by patient ID")]
    NotAnObject,

    #[error("Stored record {id} is malformed: {source}")]
    MalformedRecord {
        id: String,
        source: serde_json::Error,
    },
}

/// The whole patient collection as one JSON object, in insertion order.
///
/// Values stay as raw JSON until read; a value that does not decode into a
/// [`PatientRecord`] is reported as [`StoreError::MalformedRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientDocument {
    entries: Map<String, Value>,
}

impl PatientDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            _ => Err(StoreError::NotAnObject),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<Option<PatientRecord>, StoreError> {
        self.entries
            .get(id)
            .map(|value| decode_record(id, value))
            .transpose()
    }

    /// Insert or replace. A replaced entry keeps its position.
    pub fn insert(&mut self, id: &str, record: &PatientRecord) -> Result<(), StoreError> {
        let value = serde_json::to_value(record)?;
        self.entries.insert(id.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.entries.shift_remove(id).is_some()
    }

    pub fn records(&self) -> Result<Vec<(String, PatientRecord)>, StoreError> {
        self.entries
            .iter()
            .map(|(id, value)| Ok((id.clone(), decode_record(id, value)?)))
            .collect()
    }

    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.entries.serialize(&mut ser)?;
        Ok(buf)
    }
}

fn decode_record(id: &str, value: &Value) -> Result<PatientRecord, StoreError> {
    PatientRecord::deserialize(value).map_err(|source| StoreError::MalformedRecord {
        id: id.to_string(),
        source,
    })
}

/// Whole-document persistence. There is no partial write primitive: callers
/// load everything, mutate, and save everything.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self) -> Result<PatientDocument, StoreError>;
    async fn save(&self, document: &PatientDocument) -> Result<(), StoreError>;
}

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty document if nothing exists at the path yet.
    /// Returns whether a file was created. An existing file is left alone,
    /// even when it is malformed.
    pub async fn ensure_exists(&self) -> Result<bool, StoreError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| self.read_error(source))?;
        if exists {
            return Ok(false);
        }

        warn!("Patient document {} not found, creating an empty one", self.path.display());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.write_error(source))?;
        }
        self.save(&PatientDocument::new()).await?;
        Ok(true)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_error(&self, source: io::Error) -> StoreError {
        StoreError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self) -> Result<PatientDocument, StoreError> {
        debug!("Loading patient document from {}", self.path.display());

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| self.read_error(source))?;
        let value: Value = serde_json::from_slice(&bytes)?;
        PatientDocument::from_value(value)
    }

    async fn save(&self, document: &PatientDocument) -> Result<(), StoreError> {
        debug!("Saving {} patient(s) to {}", document.len(), self.path.display());

        let bytes = document.to_pretty_bytes()?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|source| self.write_error(source))?;
        // Rename is atomic on the same filesystem, so readers see the old or new document.
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|source| self.write_error(source))?;
        Ok(())
    }
}

/// Document held in memory; used by tests and for running without a file.
#[derive(Default)]
pub struct MemoryStore {
    document: RwLock<PatientDocument>,
}

impl MemoryStore {
    pub fn new(document: PatientDocument) -> Self {
        Self {
            document: RwLock::new(document),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, StoreError> {
        Ok(Self::new(PatientDocument::from_value(value)?))
    }

    pub async fn snapshot(&self) -> PatientDocument {
        self.document.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self) -> Result<PatientDocument, StoreError> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, document: &PatientDocument) -> Result<(), StoreError> {
        *self.document.write().await = document.clone();
        Ok(())
    }
}
