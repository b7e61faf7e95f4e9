use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use super::provider::{LlmError, LlmResult, status_error};
use crate::http::HttpClient;

pub const DEFAULT_HF_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const MAX_NEW_TOKENS: u32 = 512;

pub const MISSING_TOKEN_WARNING: &str =
    "HF_TOKEN not found in environment. Some models may have limited access.";

#[derive(Debug, Clone, PartialEq)]
pub struct TextGenerationRequest {
    pub model_id: String,
    pub prompt: String,
    pub temperature: f32,
}

/// A hosted text-generation call: prompt in, generated continuation out.
pub trait TextGeneration {
    fn text_generation(
        &self,
        request: &TextGenerationRequest,
    ) -> impl std::future::Future<Output = LlmResult<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct HfInferenceClient {
    http: HttpClient,
    token: Option<String>,
    base_url: String,
}

impl HfInferenceClient {
    pub fn new(http: HttpClient, token: Option<String>, base_url: &str) -> Self {
        Self {
            http,
            token: token.filter(|value| !value.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/models/{model_id}", self.base_url)
    }

    fn build_request(request: &TextGenerationRequest) -> HfGenerateRequest<'_> {
        HfGenerateRequest {
            inputs: &request.prompt,
            parameters: HfParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: request.temperature,
                do_sample: true,
                return_full_text: false,
            },
        }
    }

    fn extract_text(body: &str) -> LlmResult<String> {
        let parsed = serde_json::from_str::<HfGenerateResponse>(body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;

        let text = match parsed {
            HfGenerateResponse::Batch(items) => items
                .into_iter()
                .map(|item| item.generated_text)
                .find(|text| !text.trim().is_empty())
                .unwrap_or_default(),
            HfGenerateResponse::Single(item) => item.generated_text,
            HfGenerateResponse::Failure { error } => return Err(LlmError::Provider(error)),
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

impl TextGeneration for HfInferenceClient {
    async fn text_generation(&self, request: &TextGenerationRequest) -> LlmResult<String> {
        let payload = Self::build_request(request);
        let response = self
            .http
            .post_json(
                &self.endpoint(&request.model_id),
                self.token.as_deref(),
                &payload,
            )
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        if !response.is_success() {
            return Err(status_error(response.status, &response.body));
        }

        Self::extract_text(&response.body)
    }
}

/// Holds the hosted client for the lifetime of the process and remembers
/// whether the missing-token warning has been shown.
#[derive(Debug)]
pub struct ClientCache {
    client: OnceLock<HfInferenceClient>,
    token_warning_issued: AtomicBool,
}

impl Default for ClientCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientCache {
    pub const fn new() -> Self {
        Self {
            client: OnceLock::new(),
            token_warning_issued: AtomicBool::new(false),
        }
    }

    /// Returns the cached client, building it with `init` on first use. The
    /// warning is `Some` only for the first caller that finds no token.
    pub fn get_or_init(
        &self,
        init: impl FnOnce() -> HfInferenceClient,
    ) -> (HfInferenceClient, Option<&'static str>) {
        let client = self.client.get_or_init(init).clone();
        let warning = if client.has_token() {
            None
        } else {
            self.take_token_warning()
        };
        (client, warning)
    }

    pub fn token_warning_issued(&self) -> bool {
        self.token_warning_issued.load(Ordering::Relaxed)
    }

    fn take_token_warning(&self) -> Option<&'static str> {
        if self.token_warning_issued.swap(true, Ordering::Relaxed) {
            None
        } else {
            Some(MISSING_TOKEN_WARNING)
        }
    }
}

/// Process-wide cache used by the application entry point.
pub static SHARED_CLIENT: ClientCache = ClientCache::new();

#[derive(Debug, Serialize)]
struct HfGenerateRequest<'a> {
    inputs: &'a str,
    parameters: HfParameters,
}

#[derive(Debug, Serialize)]
struct HfParameters {
    max_new_tokens: u32,
    temperature: f32,
    do_sample: bool,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HfGenerateResponse {
    Batch(Vec<HfGeneratedText>),
    Single(HfGeneratedText),
    Failure { error: String },
}

#[derive(Debug, Deserialize)]
struct HfGeneratedText {
    generated_text: String,
}
