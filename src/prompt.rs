use serde::{Deserialize, Serialize};

use crate::registry::OutputLanguage;
use crate::session::{ConversationStore, Role, Turn};

/// Prior turns kept when the whole conversation is flattened into one string.
pub const FLATTENED_HISTORY_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Flattened,
    Structured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        let role = match turn.role {
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        };
        Self::new(role, turn.content.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Flattened(String),
    Structured(Vec<ChatMessage>),
}

impl Prompt {
    pub fn mode(&self) -> PromptMode {
        match self {
            Self::Flattened(_) => PromptMode::Flattened,
            Self::Structured(_) => PromptMode::Structured,
        }
    }

    /// Renders the prompt as a single transcript string.
    pub fn into_text(self) -> String {
        match self {
            Self::Flattened(text) => text,
            Self::Structured(messages) => {
                let mut out = String::new();
                let mut query = None;
                let last_user = messages
                    .iter()
                    .rposition(|message| message.role == MessageRole::User);
                for (idx, message) in messages.iter().enumerate() {
                    if Some(idx) == last_user {
                        query = Some(message.content.as_str());
                        continue;
                    }
                    match message.role {
                        MessageRole::System => {
                            out.push_str(&message.content);
                            out.push_str("\n\n");
                        }
                        MessageRole::User => push_transcript_line(&mut out, "User", &message.content),
                        MessageRole::Assistant => {
                            push_transcript_line(&mut out, "Assistant", &message.content)
                        }
                    }
                }
                push_query_cue(&mut out, query.unwrap_or_default());
                out
            }
        }
    }

    /// Renders the prompt as chat messages. A flattened prompt becomes one user
    /// message carrying the whole transcript.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        match self {
            Self::Flattened(text) => vec![ChatMessage::new(MessageRole::User, text)],
            Self::Structured(messages) => messages,
        }
    }
}

pub fn system_instruction(language: OutputLanguage) -> String {
    format!("You are Code Companion, an expert AI coding assistant specialized in {language}.")
}

fn detailed_system_instruction(language: OutputLanguage) -> String {
    format!(
        "{}\n\
         Provide concise, correct solutions with strategic print statements for debugging.\n\
         When generating code solutions, prioritize writing in {language} unless specifically asked otherwise.\n\
         Break down complex problems step-by-step with clear explanations.\n\
         Always respond in English and follow best practices for {language} development.",
        system_instruction(language)
    )
}

/// Builds the prompt for `query` from the turns already in `store`. The
/// flattened form only sees the store's recent window.
pub fn assemble(
    mode: PromptMode,
    store: &ConversationStore,
    query: &str,
    language: OutputLanguage,
) -> Prompt {
    match mode {
        PromptMode::Flattened => Prompt::Flattened(flattened(
            store.recent_window(FLATTENED_HISTORY_WINDOW),
            query,
            language,
        )),
        PromptMode::Structured => Prompt::Structured(structured(store.turns(), query, language)),
    }
}

fn flattened(history: &[Turn], query: &str, language: OutputLanguage) -> String {
    let mut out = system_instruction(language);
    out.push_str("\n\n");

    for turn in history {
        push_transcript_line(&mut out, turn.role.label(), &turn.content);
    }

    push_query_cue(&mut out, query);
    out
}

fn structured(history: &[Turn], query: &str, language: OutputLanguage) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::new(
        MessageRole::System,
        detailed_system_instruction(language),
    ));
    messages.extend(history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::new(MessageRole::User, query));
    messages
}

fn push_transcript_line(out: &mut String, label: &str, content: &str) {
    out.push_str(label);
    out.push_str(": ");
    out.push_str(content);
    out.push_str("\n\n");
}

fn push_query_cue(out: &mut String, query: &str) {
    out.push_str("User: ");
    out.push_str(query);
    out.push_str("\n\nAssistant:");
}
