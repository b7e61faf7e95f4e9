use time::OffsetDateTime;

pub const SEED_GREETING: &str = "Hi! I'm your Code Companion. How can I help you code today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: OffsetDateTime,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: local_now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Append-only log of the turns in one conversation.
///
/// A fresh store always starts with the assistant greeting, so readers can
/// rely on it never being empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_seed(Turn::assistant(SEED_GREETING))
    }

    pub fn with_seed(seed: Turn) -> Self {
        Self { turns: vec![seed] }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn recent_window(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

pub(crate) fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `HH:MM:SS` label shown next to turns and thinking steps.
pub fn clock_label(at: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", at.hour(), at.minute(), at.second())
}

#[cfg(test)]
mod tests {
    use super::{ConversationStore, Role, SEED_GREETING, Turn};

    fn store_with_turns(count: usize) -> ConversationStore {
        let mut store = ConversationStore::new();
        while store.len() < count {
            let idx = store.len();
            let turn = if idx % 2 == 1 {
                Turn::user(format!("q{idx}"))
            } else {
                Turn::assistant(format!("a{idx}"))
            };
            store.append(turn);
        }
        store
    }

    #[test]
    fn clock_label_is_zero_padded() {
        let at = time::OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(3 * 3600 + 4 * 60 + 5);
        assert_eq!(super::clock_label(at), "03:04:05");
    }

    #[test]
    fn new_store_holds_seed_greeting() {
        let store = ConversationStore::new();
        assert_eq!(store.len(), 1);
        let seed = store.last().expect("seed turn");
        assert_eq!(seed.role, Role::Assistant);
        assert_eq!(seed.content, SEED_GREETING);
    }

    #[test]
    fn recent_window_returns_last_turns_in_order() {
        let store = store_with_turns(12);
        let window = store.recent_window(5);
        let contents = window
            .iter()
            .map(|turn| turn.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(contents, vec!["q7", "a8", "q9", "a10", "q11"]);
    }

    #[test]
    fn recent_window_larger_than_store_returns_everything() {
        let store = store_with_turns(3);
        assert_eq!(store.recent_window(5).len(), 3);
        assert!(store.recent_window(0).is_empty());
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("first"));
        store.append(Turn::assistant("second"));
        let roles = store.turns().iter().map(|t| t.role).collect::<Vec<_>>();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(store.turns()[1].content, "first");
    }
}
