mod settings;
mod store;

pub use settings::{DEFAULT_TEMPERATURE, Settings, SettingsError};
pub use store::{ConversationStore, Role, SEED_GREETING, Turn, clock_label};
pub(crate) use store::local_now;

use crate::format::format_code_blocks;
use crate::llm::provider::{ChatBackend, LlmResult};
use crate::prompt::{Prompt, assemble};

/// Assistant answer for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub formatted: String,
}

/// Everything one conversation owns. Each session builds its own context;
/// nothing here is shared between sessions.
#[derive(Debug, Clone)]
pub struct SessionContext {
    store: ConversationStore,
    settings: Settings,
}

impl SessionContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            store: ConversationStore::new(),
            settings,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn build_prompt<B: ChatBackend>(&self, backend: &B, query: &str) -> Prompt {
        assemble(
            backend.prompt_mode(),
            &self.store,
            query,
            self.settings.output_language(),
        )
    }

    /// Runs one request/response cycle. Both turns are recorded only once the
    /// backend has answered, so a failing backend leaves the log untouched.
    pub async fn submit<B: ChatBackend>(&mut self, backend: &B, query: &str) -> LlmResult<Reply> {
        self.submit_turn(backend, Turn::user(query)).await
    }

    /// Like [`submit`](Self::submit), for a user turn the caller has already
    /// shown, so the stored turn keeps the displayed timestamp.
    pub async fn submit_turn<B: ChatBackend>(
        &mut self,
        backend: &B,
        user_turn: Turn,
    ) -> LlmResult<Reply> {
        let prompt = self.build_prompt(backend, &user_turn.content);
        let text = backend
            .generate(
                prompt,
                self.settings.model_key(),
                self.settings.temperature(),
            )
            .await?;

        self.store.append(user_turn);
        self.store.append(Turn::assistant(text.clone()));

        Ok(Reply {
            formatted: format_code_blocks(&text),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, SessionContext, Settings, Turn};
    use crate::llm::provider::{ChatBackend, LlmError, LlmResult};
    use crate::prompt::{Prompt, PromptMode};
    use crate::registry::{BackendKind, OutputLanguage};
    use std::sync::Mutex;

    struct EchoBackend {
        mode: PromptMode,
        fail: bool,
        prompts: Mutex<Vec<Prompt>>,
    }

    impl EchoBackend {
        fn new(mode: PromptMode) -> Self {
            Self {
                mode,
                fail: false,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(PromptMode::Structured)
            }
        }
    }

    impl ChatBackend for EchoBackend {
        fn prompt_mode(&self) -> PromptMode {
            self.mode
        }

        async fn generate(&self, prompt: Prompt, model_key: &str, _temperature: f32) -> LlmResult<String> {
            self.prompts.lock().expect("prompts lock").push(prompt);
            if self.fail {
                return Err(LlmError::Transport("connection refused".to_string()));
            }
            Ok(format!("[{model_key}] ```python\nprint(1)\n```"))
        }
    }

    #[tokio::test]
    async fn each_submission_adds_one_user_and_one_assistant_turn() {
        let backend = EchoBackend::new(PromptMode::Flattened);
        let mut ctx = SessionContext::new(Settings::new(BackendKind::Remote));

        for n in 1..=4 {
            ctx.submit(&backend, &format!("question {n}"))
                .await
                .expect("reply");
            assert_eq!(ctx.store().len(), 1 + 2 * n);
        }

        let roles = ctx.store().turns().iter().map(|t| t.role).collect::<Vec<_>>();
        assert_eq!(roles[0], Role::Assistant);
        for pair in roles[1..].chunks(2) {
            assert_eq!(pair, [Role::User, Role::Assistant]);
        }
    }

    #[tokio::test]
    async fn reply_is_formatted_and_raw_text_is_stored() {
        let backend = EchoBackend::new(PromptMode::Flattened);
        let mut ctx = SessionContext::new(Settings::new(BackendKind::Remote));

        let reply = ctx.submit(&backend, "show code").await.expect("reply");
        assert!(reply.formatted.contains("<div class=\"code-block\">"));
        assert_eq!(ctx.store().last().map(|t| t.content.as_str()), Some(reply.text.as_str()));
        assert!(reply.text.starts_with("[gpt2]"));
    }

    #[tokio::test]
    async fn prompt_uses_prior_turns_and_current_settings() {
        let backend = EchoBackend::new(PromptMode::Flattened);
        let mut ctx = SessionContext::new(Settings::new(BackendKind::Remote));
        ctx.settings_mut().set_output_language(OutputLanguage::Kotlin);

        ctx.submit(&backend, "first").await.expect("reply");
        ctx.submit(&backend, "second").await.expect("reply");

        let prompts = backend.prompts.lock().expect("prompts lock");
        let Prompt::Flattened(text) = &prompts[1] else {
            panic!("expected flattened prompt");
        };
        assert!(text.contains("specialized in Kotlin"));
        assert!(text.contains("User: first\n\n"));
        assert_eq!(text.matches("second").count(), 1);
        assert!(text.ends_with("User: second\n\nAssistant:"));
    }

    #[tokio::test]
    async fn failed_submission_leaves_store_unchanged() {
        let backend = EchoBackend::failing();
        let mut ctx = SessionContext::new(Settings::new(BackendKind::Local));

        let err = ctx.submit(&backend, "hello").await.expect_err("backend fails");
        assert_eq!(err, LlmError::Transport("connection refused".to_string()));
        assert_eq!(ctx.store().len(), 1);
    }

    #[tokio::test]
    async fn submitted_turn_keeps_its_timestamp() {
        let backend = EchoBackend::new(PromptMode::Structured);
        let mut ctx = SessionContext::new(Settings::new(BackendKind::Local));
        let mut turn = Turn::user("pinned");
        turn.timestamp = time::OffsetDateTime::UNIX_EPOCH + time::Duration::hours(3);

        ctx.submit_turn(&backend, turn.clone()).await.expect("reply");
        assert_eq!(ctx.store().turns()[1], turn);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let backend = EchoBackend::new(PromptMode::Structured);
        let mut first = SessionContext::new(Settings::new(BackendKind::Local));
        let second = SessionContext::new(Settings::new(BackendKind::Local));

        first.submit(&backend, "only here").await.expect("reply");
        assert_eq!(first.store().len(), 3);
        assert_eq!(second.store().len(), 1);
    }
}
