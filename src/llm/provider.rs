use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::prompt::{Prompt, PromptMode};
use crate::registry::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    UnknownModel(String),
    HttpStatus { status: u16, body: String },
    /// The provider answered but reported a failure in the body.
    Provider(String),
    Transport(String),
    Parse(String),
    EmptyResponse,
}

impl Display for LlmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownModel(key) => write!(f, "unknown model '{key}'"),
            Self::HttpStatus { status, body } => {
                write!(f, "provider request failed with status {status}: {body}")
            }
            Self::Provider(msg) => write!(f, "provider reported an error: {msg}"),
            Self::Transport(msg) => write!(f, "provider transport error: {msg}"),
            Self::Parse(msg) => write!(f, "provider parse error: {msg}"),
            Self::EmptyResponse => write!(f, "provider returned empty response text"),
        }
    }
}

impl Error for LlmError {}

impl From<RegistryError> for LlmError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownKey { value, .. } => Self::UnknownModel(value),
        }
    }
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// A model-serving target that turns an assembled prompt into assistant text.
pub trait ChatBackend {
    /// Prompt shape this backend expects.
    fn prompt_mode(&self) -> PromptMode;

    fn generate(
        &self,
        prompt: Prompt,
        model_key: &str,
        temperature: f32,
    ) -> impl std::future::Future<Output = LlmResult<String>> + Send;
}

/// Maps a non-success HTTP response onto `LlmError::HttpStatus`, keeping the
/// body short enough to show in the conversation.
pub(crate) fn status_error(status: u16, body: &str) -> LlmError {
    LlmError::HttpStatus {
        status,
        body: body.chars().take(400).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{LlmError, status_error};
    use crate::registry::RegistryError;

    #[test]
    fn status_error_truncates_body() {
        let body = "x".repeat(1_000);
        let LlmError::HttpStatus { status, body } = status_error(503, &body) else {
            panic!("expected HttpStatus");
        };
        assert_eq!(status, 503);
        assert_eq!(body.len(), 400);
    }

    #[test]
    fn registry_error_becomes_unknown_model() {
        let err = LlmError::from(RegistryError::UnknownKey {
            kind: "model",
            value: "nope".to_string(),
        });
        assert_eq!(err, LlmError::UnknownModel("nope".to_string()));
        assert_eq!(err.to_string(), "unknown model 'nope'");
    }

    #[test]
    fn provider_error_is_not_labelled_as_parse_failure() {
        let err = LlmError::Provider("model is loading".to_string());
        assert_eq!(err.to_string(), "provider reported an error: model is loading");
    }
}
