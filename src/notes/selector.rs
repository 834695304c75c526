//! Picks which stored tag, if any, fits the current conversation.

use super::book::Notebook;
use super::window::trailing_window;
use crate::llm::Generator;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reply meaning "no stored tag is relevant"
pub const NONE_SENTINEL: &str = "none";

pub struct RelevanceSelector {
    generator: Arc<dyn Generator>,
    notebook: Notebook,
    max_history_chars: usize,
}

impl RelevanceSelector {
    pub fn new(
        generator: Arc<dyn Generator>,
        notebook: Notebook,
        max_history_chars: usize,
    ) -> Self {
        Self {
            generator,
            notebook,
            max_history_chars,
        }
    }

    /// The best stored tag for `history`, or `None`.
    pub async fn select(&self, history: &str) -> Option<String> {
        match self.try_select(history).await {
            Ok(selected) => selected,
            Err(e) => {
                error!("Relevant tag selection failed: {}", e);
                None
            }
        }
    }

    /// With an empty store no generation call is made.
    ///
    /// The reply must match one listed tag exactly (ignoring case and
    /// surrounding whitespace) and must not be [`NONE_SENTINEL`].
    pub async fn try_select(&self, history: &str) -> Result<Option<String>> {
        let available = self.notebook.list_available_tags().await;
        if available.is_empty() {
            debug!("No stored tags, skipping relevance selection");
            return Ok(None);
        }

        let window = trailing_window(history, self.max_history_chars);
        let prompt = format!(
            "Analyze this conversation and the user's latest message. \
             Which of these topics/tags would be most useful for giving a contextual answer: {}. \
             If none is relevant, reply '{}'. Reply with the tag only.\n\n\
             Conversation:\n{}",
            available.join(", "),
            NONE_SENTINEL,
            window
        );

        let response = self.generator.generate(&prompt).await?;
        let candidate = response.trim().to_lowercase();

        if candidate == NONE_SENTINEL {
            debug!("Model found no relevant tag");
            return Ok(None);
        }

        match available.into_iter().find(|tag| tag.to_lowercase() == candidate) {
            Some(tag) => {
                info!("Relevant tag identified: {}", tag);
                Ok(Some(tag))
            }
            None => {
                debug!("Reply {:?} is not a stored tag", candidate);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::store::FileNoteStore;
    use crate::notes::testing::ScriptedGenerator;
    use tempfile::TempDir;

    async fn setup(
        dir: &TempDir,
        generator: &Arc<ScriptedGenerator>,
        tags: &[&str],
    ) -> RelevanceSelector {
        let notebook = Notebook::new(Arc::new(FileNoteStore::new(dir.path()).await));
        for tag in tags {
            notebook.save(tag, "some note").await;
        }
        RelevanceSelector::new(generator.clone(), notebook, 2000)
    }

    #[tokio::test]
    async fn test_empty_store_skips_generation() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply("cucina"));
        let selector = setup(&temp_dir, &generator, &[]).await;

        assert!(selector.select("talking about food").await.is_none());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_none_sentinel() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply("None"));
        let selector = setup(&temp_dir, &generator, &["cucina", "viaggi"]).await;

        assert!(selector.select("weather today?").await.is_none());
        let prompt = generator.prompt(0);
        assert!(prompt.contains("cucina, viaggi"));
    }

    #[tokio::test]
    async fn test_case_insensitive_exact_match() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply(" Tecnologia\n"));
        let selector = setup(&temp_dir, &generator, &["tecnologia"]).await;

        assert_eq!(
            selector.select("new phones").await.as_deref(),
            Some("tecnologia")
        );
    }

    #[tokio::test]
    async fn test_multi_word_label_matches() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().reply("Viaggi In Italia"));
        let selector = setup(&temp_dir, &generator, &["Viaggi In Italia"]).await;

        assert_eq!(
            selector.select("Rome trip").await.as_deref(),
            Some("viaggi in italia")
        );
    }

    #[tokio::test]
    async fn test_no_partial_matches() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(
            ScriptedGenerator::new()
                .reply("cucin")
                .reply("cucina italiana")
                .reply("'cucina'")
                .reply("nessuno"),
        );
        let selector = setup(&temp_dir, &generator, &["cucina"]).await;

        for _ in 0..4 {
            assert!(selector.select("pasta").await.is_none());
        }
        assert_eq!(generator.calls(), 4);
    }

    #[tokio::test]
    async fn test_generation_failure_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(ScriptedGenerator::new().fail("offline"));
        let selector = setup(&temp_dir, &generator, &["cucina"]).await;

        assert!(selector.select("pasta").await.is_none());
    }
}
