use std::future::Future;

use log::debug;
use serde::Serialize;

use crate::SummaryError;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Transcripts are cut to this many characters before prompting
pub const DEFAULT_MAX_CHARS: usize = 5000;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes video transcripts.";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Body of an OpenAI-compatible chat completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Backend that turns a chat request into generated text
pub trait CompletionBackend {
    fn complete(&self, request: &ChatRequest) -> impl Future<Output = Result<String, SummaryError>> + Send;
}

/// Groq's OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl CompletionBackend for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, SummaryError> {
        debug!("Requesting completion from {} with model {}", self.base_url, request.model);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SummaryError::Api { status, message });
        }

        let json: serde_json::Value = resp.json().await?;
        extract_completion_text(&json)
    }
}

/// Builds the summary prompt and hands it to a completion backend
#[derive(Debug)]
pub struct Summarizer<B> {
    backend: B,
    model: String,
    max_chars: usize,
}

impl<B: CompletionBackend> Summarizer<B> {
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Summarize transcript text, keeping only its first `max_chars` characters
    pub async fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        let request = self.build_request(text);
        self.backend.complete(&request).await
    }

    pub fn build_request(&self, text: &str) -> ChatRequest {
        let excerpt = truncate_chars(text, self.max_chars);
        debug!(
            "Prompting with {} of {} characters",
            excerpt.chars().count(),
            text.chars().count()
        );

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Summarize this video transcript:\n\n{excerpt}"),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn extract_completion_text(json: &serde_json::Value) -> Result<String, SummaryError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .ok_or(SummaryError::EmptyResponse)
}
