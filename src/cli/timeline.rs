use crate::cli::theme::Theme;
use crate::config::ThemeToken;
use crate::format::{FENCE, Segment, format_code_blocks, parse_segments};
use crate::session::{Role, Turn, clock_label};
use ratatui::text::{Line, Span};
use time::OffsetDateTime;

pub(crate) const USER_PROMPT: &str = "you> ";
pub(crate) const ASSISTANT_PROMPT: &str = "companion> ";
const CODE_INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub(crate) enum TimelineEntry {
    UserTurn {
        text: String,
        at: OffsetDateTime,
    },
    /// Reply text after the code-block formatter has run.
    AssistantTurn {
        formatted: String,
        at: OffsetDateTime,
    },
    Notice {
        kind: NoticeKind,
        text: String,
    },
}

impl TimelineEntry {
    /// Assistant text goes through the code-block formatter here.
    pub(crate) fn from_turn(turn: &Turn) -> Self {
        match turn.role {
            Role::User => Self::UserTurn {
                text: turn.content.clone(),
                at: turn.timestamp,
            },
            Role::Assistant => Self::AssistantTurn {
                formatted: format_code_blocks(&turn.content),
                at: turn.timestamp,
            },
        }
    }
}

/// Everything shown on screen since the last `/clear`, kept so the whole
/// view can be redrawn when the theme changes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub(crate) fn push_turn(&mut self, turn: &Turn) -> &TimelineEntry {
        self.push(TimelineEntry::from_turn(turn))
    }

    pub(crate) fn push_reply(&mut self, formatted: String, at: OffsetDateTime) -> &TimelineEntry {
        self.push(TimelineEntry::AssistantTurn { formatted, at })
    }

    pub(crate) fn push_notice(&mut self, kind: NoticeKind, text: &str) -> &TimelineEntry {
        self.push(TimelineEntry::Notice {
            kind,
            text: text.to_string(),
        })
    }

    fn push(&mut self, entry: TimelineEntry) -> &TimelineEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub(crate) fn render_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            render_entry(entry, theme, &mut lines);
        }
        lines
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

pub(crate) fn render_entry(entry: &TimelineEntry, theme: &Theme, lines: &mut Vec<Line<'static>>) {
    match entry {
        TimelineEntry::UserTurn { text, at } => {
            let mut body = split_output_lines(text).into_iter();
            let first = body.next().unwrap_or_default();
            lines.push(Line::from(vec![
                timestamp_span(theme, *at),
                Span::styled(USER_PROMPT, theme.style(ThemeToken::UserPrompt)),
                Span::styled(first.to_string(), theme.style(ThemeToken::UserText)),
            ]));
            for line in body {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    theme.style(ThemeToken::UserText),
                )));
            }
        }
        TimelineEntry::AssistantTurn { formatted, at } => {
            lines.push(Line::from(vec![
                timestamp_span(theme, *at),
                Span::styled(
                    ASSISTANT_PROMPT.trim_end().to_string(),
                    theme.style(ThemeToken::AssistantPrompt),
                ),
            ]));
            render_reply_body(formatted, theme, lines);
        }
        TimelineEntry::Notice { kind, text } => {
            let style = theme.style(notice_token(*kind));
            for line in split_output_lines(text) {
                lines.push(Line::from(Span::styled(line.to_string(), style)));
            }
        }
    }
}

fn render_reply_body(formatted: &str, theme: &Theme, lines: &mut Vec<Line<'static>>) {
    let text_style = theme.style(ThemeToken::AssistantText);
    let code_style = theme.style(ThemeToken::CodeBlock);

    for segment in parse_segments(formatted) {
        match segment {
            Segment::Text(text) => {
                for line in text.trim_matches('\n').lines() {
                    lines.push(Line::from(Span::styled(line.to_string(), text_style)));
                }
            }
            Segment::Code { language, body } => {
                let opening = format!("{CODE_INDENT}{FENCE}{}", language.unwrap_or_default());
                lines.push(Line::from(Span::styled(opening, code_style)));
                for line in body.trim_end_matches('\n').lines() {
                    lines.push(Line::from(Span::styled(
                        format!("{CODE_INDENT}{line}"),
                        code_style,
                    )));
                }
                lines.push(Line::from(Span::styled(
                    format!("{CODE_INDENT}{FENCE}"),
                    code_style,
                )));
            }
        }
    }
}

/// One step of the thinking animation, drawn on a single transient line.
pub(crate) fn thinking_line(theme: &Theme, text: &str, at: OffsetDateTime) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  ... {text}"), theme.style(ThemeToken::Thinking)),
        Span::styled(format!("  {}", clock_label(at)), theme.style(ThemeToken::Timestamp)),
    ])
}

fn timestamp_span(theme: &Theme, at: OffsetDateTime) -> Span<'static> {
    Span::styled(
        format!("[{}] ", clock_label(at)),
        theme.style(ThemeToken::Timestamp),
    )
}

fn notice_token(kind: NoticeKind) -> ThemeToken {
    match kind {
        NoticeKind::Info => ThemeToken::SystemInfo,
        NoticeKind::Warning => ThemeToken::SystemWarning,
        NoticeKind::Error => ThemeToken::SystemError,
    }
}

fn split_output_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    text.lines().collect()
}

#[cfg(test)]
mod tests {
    use super::{NoticeKind, Timeline, notice_token, split_output_lines, thinking_line};
    use crate::cli::theme::Theme;
    use crate::config::{ThemeConfig, ThemePreset, ThemeToken};
    use crate::session::Turn;
    use time::{Duration, OffsetDateTime};

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(seconds)
    }

    fn text_lines(lines: Vec<ratatui::text::Line<'static>>) -> Vec<String> {
        lines.into_iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn split_lines_works() {
        assert_eq!(split_output_lines("a\nb\n"), vec!["a", "b"]);
        assert!(split_output_lines("").is_empty());
    }

    #[test]
    fn notice_kinds_map_to_theme_tokens() {
        assert_eq!(notice_token(NoticeKind::Warning), ThemeToken::SystemWarning);
        assert_eq!(notice_token(NoticeKind::Error), ThemeToken::SystemError);
    }

    #[test]
    fn user_turn_renders_timestamp_prompt_and_continuation_lines() {
        let mut timeline = Timeline::new();
        let mut turn = Turn::user("first line\nsecond line");
        turn.timestamp = at(3600 + 2 * 60 + 3);
        timeline.push_turn(&turn);

        let lines = text_lines(timeline.render_lines(&Theme::new(false)));
        assert_eq!(lines, vec!["[01:02:03] you> first line", "second line"]);
    }

    #[test]
    fn assistant_turn_draws_code_blocks_with_fences() {
        let mut timeline = Timeline::new();
        let mut turn = Turn::assistant("Use this:\n```python\nprint('hi')\n```\nDone.");
        turn.timestamp = at(59);
        timeline.push_turn(&turn);

        let lines = text_lines(timeline.render_lines(&Theme::new(false)));
        insta::assert_snapshot!(lines.join("\n"), @r"
        [00:00:59] companion>
        Use this:
          ```python
          print('hi')
          ```
        Done.
        ");
    }

    #[test]
    fn code_lines_use_code_block_style() {
        let theme = Theme::from_config(
            true,
            &ThemeConfig {
                preset: ThemePreset::Forest,
                ..ThemeConfig::default()
            },
        );
        let mut timeline = Timeline::new();
        timeline.push_reply(
            crate::format::format_code_blocks("```rust\nfn main() {}\n```"),
            at(0),
        );

        let lines = timeline.render_lines(&theme);
        let code_line = lines
            .iter()
            .find(|line| line.to_string().contains("fn main"))
            .expect("code line");
        assert_eq!(code_line.spans[0].style, theme.style(ThemeToken::CodeBlock));
    }

    #[test]
    fn notices_and_turns_render_in_order() {
        let mut timeline = Timeline::new();
        timeline.push_notice(NoticeKind::Info, "Welcome");
        timeline.push_turn(&Turn::user("q"));
        timeline.push_notice(NoticeKind::Error, "Local model request failed: boom");

        let lines = text_lines(timeline.render_lines(&Theme::new(false)));
        assert_eq!(lines[0], "Welcome");
        assert!(lines[1].ends_with("you> q"));
        assert_eq!(lines[2], "Local model request failed: boom");
        assert_eq!(timeline.entries().len(), 3);

        timeline.clear();
        assert!(timeline.render_lines(&Theme::new(false)).is_empty());
    }

    #[test]
    fn thinking_line_shows_step_and_clock() {
        let line = thinking_line(&Theme::new(false), "Checking for edge cases...", at(10));
        assert_eq!(line.to_string(), "  ... Checking for edge cases...  00:00:10");
    }
}
