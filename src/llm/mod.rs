pub mod huggingface;
pub mod ollama;
pub mod provider;
pub mod remote;

use crate::prompt::{Prompt, PromptMode};
use huggingface::HfInferenceClient;
use ollama::LocalBackend;
use provider::{ChatBackend, LlmResult};
use remote::RemoteBackend;

/// Backend chosen at startup.
#[derive(Debug, Clone)]
pub enum Backend {
    Remote(RemoteBackend<HfInferenceClient>),
    Local(LocalBackend),
}

impl ChatBackend for Backend {
    fn prompt_mode(&self) -> PromptMode {
        match self {
            Self::Remote(backend) => backend.prompt_mode(),
            Self::Local(backend) => backend.prompt_mode(),
        }
    }

    async fn generate(&self, prompt: Prompt, model_key: &str, temperature: f32) -> LlmResult<String> {
        match self {
            Self::Remote(backend) => backend.generate(prompt, model_key, temperature).await,
            Self::Local(backend) => backend.generate(prompt, model_key, temperature).await,
        }
    }
}
