//! Topic tag extraction from the tail of a conversation.

use super::sanitize::FALLBACK_TAG;
use super::window::trailing_window;
use crate::llm::Generator;
use crate::{Result, TagNotesError};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Replies longer than this are not tags
pub const MAX_TAG_CHARS: usize = 50;

const TAG_PROMPT: &str = "Analyze this conversation and identify its main topic. \
Return a single keyword or tag (at most 2 words) that represents the central subject. \
Examples: 'love', 'technology', 'cooking', 'travel'. \
Reply with the tag only.";

pub struct TagExtractor {
    generator: Arc<dyn Generator>,
    max_history_chars: usize,
}

impl TagExtractor {
    pub fn new(generator: Arc<dyn Generator>, max_history_chars: usize) -> Self {
        Self {
            generator,
            max_history_chars,
        }
    }

    /// Derive a tag for the conversation. Never fails: any problem yields
    /// [`FALLBACK_TAG`].
    pub async fn extract(&self, history: &str) -> String {
        match self.try_extract(history).await {
            Ok(tag) => {
                info!("Extracted tag: {}", tag);
                tag
            }
            Err(e) => {
                error!("Tag extraction failed: {}", e);
                FALLBACK_TAG.to_string()
            }
        }
    }

    /// One generation call over the trailing window, trimmed and lower-cased.
    /// Empty conversations skip the call.
    pub async fn try_extract(&self, history: &str) -> Result<String> {
        let window = trailing_window(history, self.max_history_chars);
        if window.trim().is_empty() {
            debug!("Empty conversation, using fallback tag");
            return Ok(FALLBACK_TAG.to_string());
        }

        let prompt = format!("{}\n\nConversation:\n{}", TAG_PROMPT, window);
        let response = self.generator.generate(&prompt).await?;
        let tag = response.trim().to_lowercase();

        if tag.is_empty() {
            return Err(TagNotesError::Validation("empty tag".to_string()));
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(TagNotesError::Validation(format!(
                "tag longer than {} characters",
                MAX_TAG_CHARS
            )));
        }

        Ok(tag)
    }
}
