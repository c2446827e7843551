//! Extraction cache collaborator.
//!
//! Parsing a bill is deterministic, so a record cached under its document id
//! is as good as re-extraction and the pipeline skips the parse entirely on a
//! hit. The on-disk format is one serialized id-to-record mapping; the core
//! depends on nothing beyond get/set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::schema::BillRecord;

pub trait RecordCache {
    fn get(&self, document_id: &str) -> Option<BillRecord>;
    fn set(&mut self, document_id: &str, record: &BillRecord);
}

/// In-process cache with no persistence. Also doubles as a way to run the
/// pipeline cache-less.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: BTreeMap<String, BillRecord>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RecordCache for MemoryCache {
    fn get(&self, document_id: &str) -> Option<BillRecord> {
        self.entries.get(document_id).cloned()
    }

    fn set(&mut self, document_id: &str, record: &BillRecord) {
        self.entries.insert(document_id.to_string(), record.clone());
    }
}

/// File-backed cache: a single JSON mapping, loaded eagerly and written back
/// on `save`.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    entries: BTreeMap<String, BillRecord>,
}

impl JsonFileCache {
    /// Opens the cache at `path`, starting empty when the file does not exist
    /// yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };

        debug!("Loaded {} cached records from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RecordCache for JsonFileCache {
    fn get(&self, document_id: &str) -> Option<BillRecord> {
        self.entries.get(document_id).cloned()
    }

    fn set(&mut self, document_id: &str, record: &BillRecord) {
        self.entries.insert(document_id.to_string(), record.clone());
    }
}
