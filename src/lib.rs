//! Tagnotes - topic-indexed memory for conversational agents
//!
//! Wraps a host agent's turn loop to:
//! - Derive a short topic tag from the ongoing conversation
//! - Keep one bounded, versioned note per tag on disk
//! - Pick the most relevant note and inject it before the next prompt
//! - Answer `/show_tags`, `/show_note` and `/clear_notes` directly

pub mod commands;
pub mod config;
pub mod hooks;
pub mod llm;
pub mod notes;

pub use commands::{NoteCommand, ParsedCommand};
pub use config::{LlmConfig, NotesConfig};
pub use hooks::{Intercept, TagNotes};
pub use llm::{ChatGenerator, Generator};
pub use notes::{
    sanitize_tag, FileNoteStore, NoteComposer, NoteRecord, NoteStore, Notebook,
    RelevanceSelector, TagExtractor, FALLBACK_TAG,
};

/// Result type for Tagnotes operations
pub type Result<T> = std::result::Result<T, TagNotesError>;

/// Errors that can occur in Tagnotes
#[derive(Debug, thiserror::Error)]
pub enum TagNotesError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
