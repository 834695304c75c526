//! Tag-level note operations over a [`NoteStore`].
//!
//! Everything here speaks raw tags and sanitizes on the way in. Store errors
//! are logged and turned into the safe default for each operation.

use super::record::NoteRecord;
use super::sanitize::sanitize_tag;
use super::store::NoteStore;
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Shared handle to the note collection.
#[derive(Clone)]
pub struct Notebook {
    store: Arc<dyn NoteStore>,
    /// Serializes read-increment-write per key within this process
    write_locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl Notebook {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            store,
            write_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Load the record for `tag`. Missing, unreadable and corrupt records all
    /// come back as `None`.
    pub async fn load(&self, tag: &str) -> Option<NoteRecord> {
        let key = sanitize_tag(tag);
        match self.store.load(&key).await {
            Ok(Some(record)) => {
                info!("Loaded note for tag: {}", tag);
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                error!("Failed to load note for {}: {}", tag, e);
                None
            }
        }
    }

    /// Just the note text for `tag`.
    pub async fn contextual_note(&self, tag: &str) -> Option<String> {
        self.load(tag).await.map(|record| record.note)
    }

    /// Replace the note for `tag`, bumping its update counter.
    ///
    /// An existing record that cannot be read counts as absent, so the
    /// replacement starts again at 1.
    pub async fn try_save(&self, tag: &str, note: &str) -> Result<NoteRecord> {
        let key = sanitize_tag(tag);
        let lock = self.write_lock(&key);
        let _guard = lock.lock().await;

        let previous = self.load(tag).await;
        let record = NoteRecord::next(tag, note, previous.as_ref());
        self.store.save(&key, &record).await?;

        info!("Saved note for tag: {} (update {})", tag, record.update_count);
        Ok(record)
    }

    /// [`Notebook::try_save`], reporting only whether the write happened.
    pub async fn save(&self, tag: &str, note: &str) -> bool {
        match self.try_save(tag, note).await {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to save note for {}: {}", tag, e);
                false
            }
        }
    }

    /// Labels for every stored note: the sanitized key with `_` read back as a
    /// space. Original case and punctuation are not recoverable.
    pub async fn list_available_tags(&self) -> Vec<String> {
        match self.store.list().await {
            Ok(keys) => {
                let mut tags: Vec<String> = keys.iter().map(|key| key.replace('_', " ")).collect();
                tags.dedup();
                tags
            }
            Err(e) => {
                error!("Failed to list available tags: {}", e);
                Vec::new()
            }
        }
    }

    /// Remove every note.
    pub async fn clear_all(&self) -> Result<usize> {
        self.store.clear_all().await
    }

    fn write_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        match self.write_locks.lock() {
            Ok(mut locks) => locks.entry(key.to_string()).or_default().clone(),
            Err(poisoned) => {
                warn!("Write lock table poisoned, recovering");
                poisoned
                    .into_inner()
                    .entry(key.to_string())
                    .or_default()
                    .clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::store::FileNoteStore;
    use crate::TagNotesError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn notebook(dir: &TempDir) -> Notebook {
        Notebook::new(Arc::new(FileNoteStore::new(dir.path()).await))
    }

    #[tokio::test]
    async fn test_versioning_across_equivalent_tags() {
        let temp_dir = TempDir::new().unwrap();
        let book = notebook(&temp_dir).await;

        assert!(book.save("Amore", "x y z").await);
        let first = book.load("amore").await.unwrap();
        assert_eq!(first.tag, "Amore");
        assert_eq!(first.note, "x y z");
        assert_eq!(first.update_count, 1);

        assert!(book.save("amore", "a b").await);
        let second = book.load("AMORE").await.unwrap();
        assert_eq!(second.note, "a b");
        assert_eq!(second.update_count, 2);
    }

    #[tokio::test]
    async fn test_n_saves_count_n() {
        let temp_dir = TempDir::new().unwrap();
        let book = notebook(&temp_dir).await;

        for (i, tag) in ["Viaggi", "viaggi", " VIAGGI ", "viaggi!"].iter().enumerate() {
            let record = book.try_save(tag, &format!("note {}", i)).await.unwrap();
            assert_eq!(record.update_count, i as u64 + 1);
        }
        assert_eq!(book.list_available_tags().await, vec!["viaggi"]);
    }

    #[tokio::test]
    async fn test_concurrent_saves_do_not_lose_counts() {
        let temp_dir = TempDir::new().unwrap();
        let book = notebook(&temp_dir).await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let book = book.clone();
            handles.push(tokio::spawn(async move {
                book.save("tecnologia", &format!("note {}", i)).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(book.load("tecnologia").await.unwrap().update_count, 8);
    }

    #[tokio::test]
    async fn test_list_reverses_underscores() {
        let temp_dir = TempDir::new().unwrap();
        let book = notebook(&temp_dir).await;

        book.save("Viaggi In Italia", "Roma").await;
        book.save("cucina", "pasta").await;

        assert_eq!(
            book.list_available_tags().await,
            vec!["cucina", "viaggi in italia"]
        );
        assert_eq!(
            book.contextual_note("viaggi in italia").await.as_deref(),
            Some("Roma")
        );
    }

    #[tokio::test]
    async fn test_corrupt_record_loads_as_none_and_restarts_count() {
        let temp_dir = TempDir::new().unwrap();
        let book = notebook(&temp_dir).await;
        std::fs::write(temp_dir.path().join("cucina.json"), "[]").unwrap();

        assert!(book.load("cucina").await.is_none());
        assert_eq!(book.try_save("cucina", "pasta").await.unwrap().update_count, 1);
    }

    #[tokio::test]
    async fn test_clear_all_empties_listing() {
        let temp_dir = TempDir::new().unwrap();
        let book = notebook(&temp_dir).await;

        book.save("a", "1").await;
        book.save("b", "2").await;

        assert_eq!(book.clear_all().await.unwrap(), 2);
        assert!(book.list_available_tags().await.is_empty());
        assert!(book.load("a").await.is_none());
    }

    #[tokio::test]
    async fn test_saves_after_clear_restart_and_stay_serialized() {
        let temp_dir = TempDir::new().unwrap();
        let book = notebook(&temp_dir).await;
        book.save("viaggi", "Roma").await;
        book.save("viaggi", "Firenze").await;

        book.clear_all().await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let book = book.clone();
                tokio::spawn(async move { book.save("viaggi", &format!("note {}", i)).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(book.load("viaggi").await.unwrap().update_count, 8);
    }

    struct BrokenStore;

    #[async_trait]
    impl NoteStore for BrokenStore {
        async fn load(&self, _key: &str) -> Result<Option<NoteRecord>> {
            Err(TagNotesError::Io(std::io::Error::other("disk gone")))
        }
        async fn save(&self, _key: &str, _record: &NoteRecord) -> Result<()> {
            Err(TagNotesError::Io(std::io::Error::other("disk gone")))
        }
        async fn list(&self) -> Result<Vec<String>> {
            Err(TagNotesError::Io(std::io::Error::other("disk gone")))
        }
        async fn clear_all(&self) -> Result<usize> {
            Err(TagNotesError::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn test_store_failures_become_defaults() {
        let book = Notebook::new(Arc::new(BrokenStore));

        assert!(book.load("x").await.is_none());
        assert!(!book.save("x", "note").await);
        assert!(book.list_available_tags().await.is_empty());
        assert!(book.clear_all().await.is_err());
    }
}
