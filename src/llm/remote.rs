use super::huggingface::{HfInferenceClient, TextGeneration, TextGenerationRequest};
use super::provider::{ChatBackend, LlmError, LlmResult};
use crate::prompt::{Prompt, PromptMode};
use crate::registry;
use crate::trace::{SessionTrace, TraceKind};

pub const FALLBACK_MODEL_ID: &str = "gpt2";
pub const FALLBACK_NOTICE: &str = "\n\n(Note: This response was generated using a fallback model)";

/// Hosted-inference backend. It never fails: a broken primary model is
/// retried once on the fallback model, and a broken fallback turns into an
/// explanatory assistant message.
#[derive(Debug, Clone)]
pub struct RemoteBackend<G = HfInferenceClient> {
    api: G,
    trace: Option<SessionTrace>,
}

impl<G: TextGeneration + Sync> RemoteBackend<G> {
    pub fn new(api: G) -> Self {
        Self { api, trace: None }
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    async fn generate_with_fallback(&self, prompt: String, model_key: &str, temperature: f32) -> String {
        let model_id = match registry::hosted_model(model_key) {
            Ok(entry) => entry.backend_identifier,
            Err(err) => return failure_message(&LlmError::from(err)),
        };

        let mut request = TextGenerationRequest {
            model_id: model_id.to_string(),
            prompt,
            temperature,
        };

        let primary_err = match self.api.text_generation(&request).await {
            Ok(text) => return text,
            Err(err) => err,
        };
        self.note(
            TraceKind::Warning,
            &format!("Error with primary model {model_id}: {primary_err}. Trying fallback model..."),
        );

        request.model_id = FALLBACK_MODEL_ID.to_string();
        match self.api.text_generation(&request).await {
            Ok(text) => format!("{text}{FALLBACK_NOTICE}"),
            Err(err) => {
                self.note(TraceKind::Error, &format!("Fallback model failed: {err}"));
                failure_message(&err)
            }
        }
    }

    fn note(&self, kind: TraceKind, text: &str) {
        if let Some(trace) = &self.trace {
            trace.log(kind, text);
        }
    }
}

impl<G: TextGeneration + Sync> ChatBackend for RemoteBackend<G> {
    fn prompt_mode(&self) -> PromptMode {
        PromptMode::Flattened
    }

    async fn generate(&self, prompt: Prompt, model_key: &str, temperature: f32) -> LlmResult<String> {
        Ok(self
            .generate_with_fallback(prompt.into_text(), model_key, temperature)
            .await)
    }
}

/// Assistant-visible explanation used when no model could answer.
pub fn failure_message(err: &LlmError) -> String {
    format!(
        "I'm sorry, I encountered an error generating a response: {err}\n\
         \n\
         This could be due to:\n\
         1. The model being unavailable on Hugging Face\n\
         2. Missing or invalid HF_TOKEN\n\
         3. Network connectivity issues\n\
         4. Rate limiting on the Hugging Face API\n\
         \n\
         Please try:\n\
         - Selecting a different model (/model)\n\
         - Checking your HF_TOKEN in the .env file\n\
         - Reducing the complexity of your query\n\
         - Waiting a few minutes and trying again"
    )
}
