use serde::{Deserialize, Serialize};

use super::provider::{ChatBackend, LlmError, LlmResult, status_error};
use crate::http::HttpClient;
use crate::prompt::{ChatMessage, Prompt, PromptMode};
use crate::registry;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Local model server backend. The server is assumed to be running, so a
/// failed call is handed back to the caller as an error with no retry.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    http: HttpClient,
    base_url: String,
}

impl LocalBackend {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

impl ChatBackend for LocalBackend {
    fn prompt_mode(&self) -> PromptMode {
        PromptMode::Structured
    }

    async fn generate(&self, prompt: Prompt, model_key: &str, temperature: f32) -> LlmResult<String> {
        let model = registry::local_model(model_key)?.backend_identifier;
        let payload = OllamaChatRequest {
            model,
            messages: prompt.into_messages(),
            stream: false,
            options: OllamaOptions { temperature },
        };

        let response = self
            .http
            .post_json(&self.endpoint(), None, &payload)
            .await
            .map_err(|err| {
                LlmError::Transport(format!("{err} (is the local model server running?)"))
            })?;

        if !response.is_success() {
            return Err(status_error(response.status, &response.body));
        }

        let parsed = serde_json::from_str::<OllamaChatResponse>(&response.body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let text = parsed.message.content.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}
