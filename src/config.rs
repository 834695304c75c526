//! Settings for the tag-and-note manager, read from `config.toml`.

use crate::{Result, TagNotesError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_NOTES_DIR: &str = "contextual_notes";
pub const DEFAULT_MAX_NOTE_LENGTH: usize = 200;
pub const DEFAULT_MAX_HISTORY_CHARS: usize = 2000;
pub const MIN_NOTE_LENGTH: usize = 50;
pub const MAX_NOTE_LENGTH: usize = 500;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for Tagnotes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Whether the conversation hooks do anything at all
    pub enabled: bool,

    /// Directory holding one JSON file per sanitized tag
    pub notes_dir: PathBuf,

    /// Word cap for a single note
    pub max_note_length: usize,

    /// Size of the trailing conversation window, in characters
    pub max_history_chars: usize,

    /// Model endpoint used by the binary
    pub llm: LlmConfig,
}

/// OpenAI-compatible endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// No timeout is applied unless this is set
    pub request_timeout_secs: Option<u64>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            notes_dir: PathBuf::from(DEFAULT_NOTES_DIR),
            max_note_length: DEFAULT_MAX_NOTE_LENGTH,
            max_history_chars: DEFAULT_MAX_HISTORY_CHARS,
            llm: LlmConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: std::env::var("TAGNOTES_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl NotesConfig {
    /// Load settings from a TOML file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()
    }

    /// Default config location: `<config dir>/tagnotes/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tagnotes").join("config.toml"))
    }

    /// Clamp the note length into its allowed range and reject an empty window.
    pub fn validate(mut self) -> Result<Self> {
        if self.max_history_chars == 0 {
            return Err(TagNotesError::Config(
                "max_history_chars must be greater than zero".to_string(),
            ));
        }

        let clamped = self.max_note_length.clamp(MIN_NOTE_LENGTH, MAX_NOTE_LENGTH);
        if clamped != self.max_note_length {
            warn!(
                "max_note_length {} outside {}..={}, using {}",
                self.max_note_length, MIN_NOTE_LENGTH, MAX_NOTE_LENGTH, clamped
            );
            self.max_note_length = clamped;
        }

        Ok(self)
    }

    pub fn with_notes_dir(mut self, dir: PathBuf) -> Self {
        self.notes_dir = dir;
        self
    }

    pub fn with_max_note_length(mut self, words: usize) -> Self {
        self.max_note_length = words;
        self
    }

    pub fn with_max_history_chars(mut self, chars: usize) -> Self {
        self.max_history_chars = chars;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
