//! Host integration points
//!
//! `TagNotes` is built once at startup and handed to the host's turn loop.
//! The host calls:
//! - [`TagNotes::before_read`] on every incoming user message
//! - [`TagNotes::prompt_prefix`] while assembling the agent prompt
//! - [`TagNotes::before_send`] before an outgoing reply leaves

use crate::commands::{help_line, parse_command};
use crate::config::NotesConfig;
use crate::llm::Generator;
use crate::notes::{
    FileNoteStore, NoteComposer, NoteStore, Notebook, RelevanceSelector, TagExtractor,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What the host should do with an incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intercept {
    /// A note command was answered; skip normal handling
    Consumed,
    /// Not ours; process normally
    Forward,
}

/// Tag-and-note manager service
pub struct TagNotes {
    config: NotesConfig,
    notebook: Notebook,
    extractor: TagExtractor,
    composer: NoteComposer,
    selector: RelevanceSelector,
}

impl TagNotes {
    /// Service backed by JSON files under `config.notes_dir`.
    pub async fn new(config: NotesConfig, generator: Arc<dyn Generator>) -> Self {
        let store = FileNoteStore::new(&config.notes_dir).await;
        Self::with_store(config, Arc::new(store), generator)
    }

    pub fn with_store(
        config: NotesConfig,
        store: Arc<dyn NoteStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let notebook = Notebook::new(store);
        let extractor = TagExtractor::new(generator.clone(), config.max_history_chars);
        let composer = NoteComposer::new(
            generator.clone(),
            notebook.clone(),
            config.max_note_length,
            config.max_history_chars,
        );
        let selector =
            RelevanceSelector::new(generator, notebook.clone(), config.max_history_chars);

        info!("Tag notes loaded (enabled: {})", config.enabled);
        info!("Notes directory: {}", config.notes_dir.display());
        info!("Available commands: {}", help_line());

        Self {
            config,
            notebook,
            extractor,
            composer,
            selector,
        }
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    /// Tag the conversation and fold it into that tag's note.
    ///
    /// Returns the updated note, or `None` if nothing was saved.
    pub async fn before_send(&self, history: &str) -> Option<String> {
        if !self.config.enabled || history.is_empty() {
            return None;
        }

        let tag = self.extractor.extract(history).await;
        let note = self.composer.update(&tag, history).await?;

        let preview: String = note.chars().take(100).collect();
        info!("Note updated for tag '{}': {}...", tag, preview);
        Some(note)
    }

    /// Append the most relevant stored note to `prefix`.
    pub async fn prompt_prefix(&self, prefix: &str, history: &str) -> String {
        if !self.config.enabled || history.is_empty() {
            return prefix.to_string();
        }

        let Some(tag) = self.selector.select(history).await else {
            return prefix.to_string();
        };
        let Some(note) = self
            .notebook
            .contextual_note(&tag)
            .await
            .filter(|note| !note.trim().is_empty())
        else {
            debug!("Selected tag {} has no usable note", tag);
            return prefix.to_string();
        };

        info!("Added context for tag: {}", tag);
        format!("{}\n\nRelevant context about '{}':\n{}\n", prefix, tag, note)
    }

    /// Answer note commands directly. Returns the reply for a recognised
    /// command, `None` otherwise.
    pub async fn handle_command(&self, message: &str) -> Option<String> {
        let parsed = parse_command(message)?;
        debug!("Handling command {}", parsed.command);
        Some(parsed.command.execute(&parsed.args, &self.notebook).await)
    }

    /// [`TagNotes::handle_command`], delivering the reply over `replies`.
    pub async fn before_read(&self, message: &str, replies: &mpsc::Sender<String>) -> Intercept {
        match self.handle_command(message).await {
            Some(response) => {
                if let Err(e) = replies.send(response).await {
                    warn!("Failed to deliver command reply: {}", e);
                }
                Intercept::Consumed
            }
            None => Intercept::Forward,
        }
    }
}
