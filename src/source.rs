//! Document-source collaborator: where bills come from.
//!
//! The core only needs a listing of typed document handles and their bytes;
//! remote drives, mail exports and test fixtures all fit behind the same
//! trait. `FolderSource` is the local-filesystem implementation: one
//! subdirectory per source type, the subdirectory name naming the type.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::schema::SourceType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    /// Stable identifier, also the extraction-cache key.
    pub id: String,
    pub name: String,
    pub source_type: SourceType,
}

pub trait DocumentSource {
    fn list(&self) -> Result<Vec<DocumentHandle>>;
    fn fetch(&self, handle: &DocumentHandle) -> Result<Vec<u8>>;
}

/// Reads bills from `<root>/<source-type>/<file>`. Subdirectories that do not
/// name a known source type are skipped rather than failing the listing, so a
/// stray folder cannot take down a run.
#[derive(Debug)]
pub struct FolderSource {
    root: PathBuf,
}

impl FolderSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl DocumentSource for FolderSource {
    fn list(&self) -> Result<Vec<DocumentHandle>> {
        let mut handles = Vec::new();

        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }

            let dir_name = dir_entry.file_name().to_string_lossy().into_owned();
            let source_type = match dir_name.parse::<SourceType>() {
                Ok(source_type) => source_type,
                Err(_) => continue,
            };

            for file_entry in fs::read_dir(dir_entry.path())? {
                let file_entry = file_entry?;
                if !file_entry.file_type()?.is_file() {
                    continue;
                }
                let name = file_entry.file_name().to_string_lossy().into_owned();
                handles.push(DocumentHandle {
                    id: format!("{}/{}", dir_name, name),
                    name,
                    source_type,
                });
            }
        }

        // Stable ordering keeps the last-write-wins bucket fields
        // deterministic across runs.
        handles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(handles)
    }

    fn fetch(&self, handle: &DocumentHandle) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(&handle.id))?)
    }
}
