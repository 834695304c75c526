//! Key-value persistence for note records.
//!
//! Directory layout:
//!   {notes_dir}/{sanitized_key}.json

use super::record::NoteRecord;
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

/// Storage seam keyed by sanitized tag. Callers sanitize; stores don't.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Fetch the record stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<NoteRecord>>;

    /// Replace whatever is stored under `key`.
    async fn save(&self, key: &str, record: &NoteRecord) -> Result<()>;

    /// Every stored key.
    async fn list(&self) -> Result<Vec<String>>;

    /// Remove every record, returning how many were removed.
    async fn clear_all(&self) -> Result<usize>;
}

/// One pretty-printed JSON file per key under a fixed directory.
#[derive(Debug, Clone)]
pub struct FileNoteStore {
    notes_dir: PathBuf,
}

impl FileNoteStore {
    /// Open the store, creating its directory if needed.
    ///
    /// A directory that cannot be created is logged, not fatal: later writes
    /// will fail individually and report `false`.
    pub async fn new(notes_dir: impl Into<PathBuf>) -> Self {
        let notes_dir = notes_dir.into();
        match fs::create_dir_all(&notes_dir).await {
            Ok(()) => info!("Notes directory ready: {}", notes_dir.display()),
            Err(e) => error!("Failed to create notes directory {}: {}", notes_dir.display(), e),
        }
        Self { notes_dir }
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    fn note_path(&self, key: &str) -> PathBuf {
        self.notes_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl NoteStore for FileNoteStore {
    async fn load(&self, key: &str) -> Result<Option<NoteRecord>> {
        let path = self.note_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let record = serde_json::from_str::<NoteRecord>(&content)?;
        debug!("Loaded note for key {}", key);
        Ok(Some(record))
    }

    async fn save(&self, key: &str, record: &NoteRecord) -> Result<()> {
        let content = serde_json::to_string_pretty(record)?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.note_path(key))
            .await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!("Saved note for key {}", key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        if !self.notes_dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.notes_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(key) = name.strip_suffix(".json") {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear_all(&self) -> Result<usize> {
        let keys = self.list().await?;
        for key in &keys {
            fs::remove_file(self.note_path(key)).await?;
        }
        info!("Removed {} note files", keys.len());
        Ok(keys.len())
    }
}
