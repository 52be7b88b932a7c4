//! Durable save/restore of the vector index.
//!
//! The index serializes to a single versioned JSON document, `index.json`,
//! inside a configured directory. Saves are atomic: write to a temp file in
//! the same directory, then rename over the target. A missing file loads as
//! `Ok(None)` ("no index yet"); a corrupt or incompatible file is a typed
//! error the caller treats the same way, after logging.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::index::vector_index::{IndexEntry, VectorIndex};

const FORMAT_VERSION: u32 = 1;
const INDEX_FILE: &str = "index.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt index file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Unsupported index format version {found} (supported: {FORMAT_VERSION})")]
    Version { found: u32 },

    #[error("Index file entry rejected: {0}")]
    Entry(#[from] crate::index::vector_index::IndexError),
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

/// Writes the index to `dir/index.json`, creating `dir` if needed.
pub fn save(index: &VectorIndex, dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir)?;

    let file = IndexFile {
        version: FORMAT_VERSION,
        dimensions: index.dimensions(),
        entries: index.entries().cloned().collect(),
    };
    let bytes = serde_json::to_vec(&file)?;

    let target = dir.join(INDEX_FILE);
    let temp = dir.join(format!("{INDEX_FILE}.tmp"));
    fs::write(&temp, bytes)?;
    if let Err(e) = fs::rename(&temp, &target) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

/// Loads the index from `dir/index.json`. `Ok(None)` when no file exists.
pub fn load(dir: &Path) -> Result<Option<VectorIndex>, StorageError> {
    let target = dir.join(INDEX_FILE);
    let bytes = match fs::read(&target) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let file: IndexFile = serde_json::from_slice(&bytes)?;
    if file.version != FORMAT_VERSION {
        return Err(StorageError::Version { found: file.version });
    }

    let mut index = VectorIndex::new(file.dimensions);
    for entry in file.entries {
        index.upsert(entry.chunk, entry.embedding)?;
    }
    Ok(Some(index))
}
