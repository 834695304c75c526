//! Generation capability
//!
//! The note manager only ever needs "prompt in, text out". `Generator` is that
//! seam; `ChatGenerator` backs it with an OpenAI-compatible Chat Completions
//! endpoint. Exactly one attempt is made per call.

use crate::config::LlmConfig;
use crate::{Result, TagNotesError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

/// Maps a prompt string to model-generated text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ─── Chat Completions API types ─────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Error payloads seen in the wild: `{"error":{"message":..}}` or `{"message":..}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

const MAX_ERROR_CHARS: usize = 300;

// ─── ChatGenerator ──────────────────────────────────────────────────

/// Generator backed by `{base_url}/chat/completions`.
pub struct ChatGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatGenerator {
    /// Build a generator from config. The API key is read from the configured
    /// environment variable; local endpoints may run without one.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("tagnotes/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| TagNotesError::Config(format!("http client: {e}")))?;

        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());

        info!(
            "Chat generator: model={}, base_url={}, api_key={}",
            config.model,
            config.base_url,
            if api_key.is_some() { "set" } else { "unset" }
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Drop `<think>...</think>` blocks some reasoning models prepend.
    pub fn strip_think_tags(content: &str) -> String {
        static THINK: OnceLock<Regex> = OnceLock::new();
        let re = THINK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));

        if re.is_match(content) {
            re.replace_all(content, "").trim().to_string()
        } else if content.trim_start().starts_with("<think>") {
            // Unterminated reasoning block: nothing usable follows it
            String::new()
        } else {
            content.trim().to_string()
        }
    }

    /// Turn a non-success reply into a generation error, keeping the
    /// provider's own message when the body carries one.
    fn api_error(status: StatusCode, body: &str) -> TagNotesError {
        let body = body.trim();
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.error.and_then(|e| e.message).or(parsed.message))
            .unwrap_or_else(|| body.to_string());

        if message.is_empty() {
            return TagNotesError::Generation(format!("{status} from chat endpoint"));
        }
        let mut shown: String = message.chars().take(MAX_ERROR_CHARS).collect();
        if shown.len() < message.len() {
            shown.push('…');
        }
        TagNotesError::Generation(format!("{status} from chat endpoint: {shown}"))
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Calling LLM with prompt length: {}", prompt.len());

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.2,
            stream: false,
        };

        let mut req_builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            req_builder = req_builder.bearer_auth(key);
        }

        let response = req_builder
            .json(&request)
            .send()
            .await
            .map_err(|e| TagNotesError::Generation(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::api_error(status, &body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| TagNotesError::Generation(format!("malformed response: {e}")))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TagNotesError::Generation("response had no choices".to_string()))?;

        let text = Self::strip_think_tags(&content);
        debug!("LLM response: {}", text);
        Ok(text)
    }
}
