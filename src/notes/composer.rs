//! Merges the latest conversation window into a tag's note.

use super::book::Notebook;
use super::window::{cap_words, trailing_window, word_count};
use crate::llm::Generator;
use crate::{Result, TagNotesError};
use std::sync::Arc;
use tracing::{debug, error};

/// Stands in for the previous note on a tag's first update
pub const NO_PREVIOUS_NOTE: &str = "No previous note.";

pub struct NoteComposer {
    generator: Arc<dyn Generator>,
    notebook: Notebook,
    max_note_length: usize,
    max_history_chars: usize,
}

impl NoteComposer {
    pub fn new(
        generator: Arc<dyn Generator>,
        notebook: Notebook,
        max_note_length: usize,
        max_history_chars: usize,
    ) -> Self {
        Self {
            generator,
            notebook,
            max_note_length,
            max_history_chars,
        }
    }

    /// Update and persist the note for `tag`.
    ///
    /// Returns the saved note, or `None` when nothing was persisted.
    pub async fn update(&self, tag: &str, history: &str) -> Option<String> {
        match self.try_update(tag, history).await {
            Ok(note) => Some(note),
            Err(e) => {
                error!("Note update failed for {}: {}", tag, e);
                None
            }
        }
    }

    pub async fn try_update(&self, tag: &str, history: &str) -> Result<String> {
        let previous = self.notebook.contextual_note(tag).await;
        let prompt = self.build_prompt(tag, previous.as_deref(), history);

        let response = self.generator.generate(&prompt).await?;
        if response.trim().is_empty() {
            return Err(TagNotesError::Validation("empty note".to_string()));
        }
        let words = word_count(&response);
        let note = cap_words(&response, self.max_note_length);
        if words > self.max_note_length {
            debug!(
                "Note for {} truncated from {} to {} words",
                tag, words, self.max_note_length
            );
        }

        self.notebook.try_save(tag, &note).await?;
        Ok(note)
    }

    fn build_prompt(&self, tag: &str, previous: Option<&str>, history: &str) -> String {
        let previous = previous.unwrap_or(NO_PREVIOUS_NOTE);
        let window = trailing_window(history, self.max_history_chars);

        format!(
            "Based on the current conversation and this previous note: '{previous}', \
             write an updated note of at most {max} words that summarizes \
             the most important information about the topic '{tag}'. \
             Include insights, key facts and context useful for future conversations.\n\n\
             Current conversation:\n{window}",
            max = self.max_note_length,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::store::FileNoteStore;
    use crate::notes::testing::ScriptedGenerator;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn setup(
        dir: &TempDir,
        generator: &Arc<ScriptedGenerator>,
        cap: usize,
    ) -> (NoteComposer, Notebook) {
        let notebook = Notebook::new(Arc::new(FileNoteStore::new(dir.path()).await));
        let composer = NoteComposer::new(generator.clone(), notebook.clone(), cap, 2000);
        (composer, notebook)
    }

    #[tokio::test]
    async fn test_first_update_uses_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply("Likes carbonara."));
        let (composer, notebook) = setup(&temp_dir, &generator, 200).await;

        let note = composer.update("cucina", "User: carbonara please").await;
        assert_eq!(note.as_deref(), Some("Likes carbonara."));

        let prompt = generator.prompt(0);
        assert!(prompt.contains(NO_PREVIOUS_NOTE));
        assert!(prompt.contains("at most 200 words"));
        assert!(prompt.contains("'cucina'"));
        assert!(prompt.contains("User: carbonara please"));

        assert_eq!(notebook.load("cucina").await.unwrap().update_count, 1);
    }

    #[tokio::test]
    async fn test_second_update_merges_previous() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply("first note").reply("second note"));
        let (composer, notebook) = setup(&temp_dir, &generator, 200).await;

        composer.update("viaggi", "Roma").await;
        composer.update("Viaggi", "Firenze").await;

        assert!(generator.prompt(1).contains("'first note'"));
        let record = notebook.load("viaggi").await.unwrap();
        assert_eq!(record.note, "second note");
        assert_eq!(record.update_count, 2);
    }

    #[tokio::test]
    async fn test_caps_word_count() {
        let temp_dir = TempDir::new().unwrap();
        let long_reply = (0..80).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let generator = Arc::new(ScriptedGenerator::new().reply(&long_reply));
        let (composer, notebook) = setup(&temp_dir, &generator, 50).await;

        let note = composer.update("tecnologia", "chat").await.unwrap();
        assert_eq!(word_count(&note), 50);
        assert!(note.ends_with("w49"));
        assert_eq!(notebook.contextual_note("tecnologia").await, Some(note));
    }

    #[tokio::test]
    async fn test_generation_failure_persists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().fail("boom"));
        let (composer, notebook) = setup(&temp_dir, &generator, 200).await;

        assert!(composer.update("cucina", "chat").await.is_none());
        assert!(notebook.list_available_tags().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_failure_reports_no_update() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply("a note"));
        let (composer, _) = setup(&temp_dir, &generator, 200).await;
        std::fs::remove_dir_all(temp_dir.path()).unwrap();

        assert!(composer.update("cucina", "chat").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_reply_keeps_previous_note() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply("").reply(" \n\t"));
        let (composer, notebook) = setup(&temp_dir, &generator, 200).await;
        notebook.save("viaggi", "Visited Rome in 2023.").await;

        assert!(composer.update("viaggi", "Human: hmm").await.is_none());
        assert!(matches!(
            composer.try_update("viaggi", "Human: hmm").await,
            Err(TagNotesError::Validation(_))
        ));

        let record = notebook.load("viaggi").await.unwrap();
        assert_eq!(record.note, "Visited Rome in 2023.");
        assert_eq!(record.update_count, 1);
    }
}
