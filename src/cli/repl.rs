use crate::cli::commands::{Command, HELP_TEXT, is_command_line, is_exit_line, parse_command};
use crate::cli::guide::{HOW_TO_USE, capabilities_text, examples_text};
use crate::cli::render::Screen;
use crate::cli::theme::{Theme, swatch};
use crate::cli::timeline::{
    NoticeKind, Timeline, TimelineEntry, USER_PROMPT, render_entry, thinking_line,
};
use crate::config::{ThemeConfig, ThemePreset, ThemeToken};
use crate::llm::provider::ChatBackend;
use crate::registry::OutputLanguage;
use crate::session::{SessionContext, Turn, local_now};
use crate::thinking::ThinkingSequence;
use crate::trace::{SessionTrace, TraceKind};
use anyhow::Result;
use ratatui::text::{Line, Span};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, IsTerminal, Write};
use tokio_util::sync::CancellationToken;

pub const WELCOME_TEXT: &str =
    "Welcome to Code Companion. Ask a coding question, /help lists commands, exit quits.";

pub struct AppState<B> {
    pub session: SessionContext,
    pub backend: B,
    pub theme_config: ThemeConfig,
    pub color_enabled: bool,
    pub trace: SessionTrace,
    pub startup_notices: Vec<(NoticeKind, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineOutcome {
    Continue,
    Exit,
}

pub async fn run_repl<B: ChatBackend>(state: &mut AppState<B>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();
    let mut repl = Repl::new(state, io::stdout());
    repl.erase_echo = interactive;
    repl.start()?;

    loop {
        match rl.readline(USER_PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if repl.handle_line(line).await? == LineOutcome::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

pub(crate) struct Repl<'a, B, W: Write> {
    state: &'a mut AppState<B>,
    theme: Theme,
    timeline: Timeline,
    screen: Screen<W>,
    erase_echo: bool,
}

impl<'a, B: ChatBackend, W: Write> Repl<'a, B, W> {
    pub(crate) fn new(state: &'a mut AppState<B>, out: W) -> Self {
        let theme = Theme::from_config(state.color_enabled, &state.theme_config);
        Self {
            state,
            theme,
            timeline: Timeline::new(),
            screen: Screen::new(out),
            erase_echo: false,
        }
    }

    pub(crate) fn start(&mut self) -> Result<()> {
        self.notice(NoticeKind::Info, WELCOME_TEXT)?;
        for (kind, text) in std::mem::take(&mut self.state.startup_notices) {
            self.notice(kind, &text)?;
        }
        if let Some(greeting) = self.state.session.store().turns().first() {
            let entry = self.timeline.push_turn(greeting);
            write_entry(&mut self.screen, &self.theme, entry)?;
        }
        Ok(())
    }

    pub(crate) async fn handle_line(&mut self, line: &str) -> Result<LineOutcome> {
        let line = line.trim();
        if is_exit_line(line) {
            return Ok(LineOutcome::Exit);
        }
        if line.is_empty() {
            return Ok(LineOutcome::Continue);
        }

        if is_command_line(line) {
            match parse_command(line) {
                Ok(command) => self.handle_command(command).await?,
                Err(err) => self.notice(NoticeKind::Error, err.message())?,
            }
        } else {
            if self.erase_echo {
                self.screen.erase_previous_line()?;
            }
            self.submit(line).await?;
        }

        Ok(LineOutcome::Continue)
    }

    async fn submit(&mut self, query: &str) -> Result<()> {
        let Self {
            state,
            theme,
            timeline,
            screen,
            ..
        } = self;
        let AppState {
            session,
            backend,
            trace,
            ..
        } = &mut **state;

        trace.log(TraceKind::ChatIn, query);
        let user_turn = Turn::user(query);
        let entry = timeline.push_turn(&user_turn);
        write_entry(screen, theme, entry)?;

        let settings = session.settings();
        let show_thinking = settings.show_thinking();
        let sequence = ThinkingSequence::for_language(settings.output_language());
        let cancel = CancellationToken::new();

        let trace_ref: &SessionTrace = trace;
        let theme_ref: &Theme = theme;
        let thinking = async {
            if show_thinking {
                sequence
                    .run(&cancel, |step, at| {
                        trace_ref.log(TraceKind::Thinking, &step.text);
                        let line = thinking_line(theme_ref, &step.text, at);
                        if let Err(err) = screen.show_transient(&line) {
                            trace_ref.log(
                                TraceKind::Warning,
                                &format!("Failed to draw thinking step: {err}"),
                            );
                        }
                    })
                    .await;
            }
        };
        let call = async {
            let result = session.submit_turn(&*backend, user_turn).await;
            cancel.cancel();
            result
        };
        let ((), result) = tokio::join!(thinking, call);
        screen.clear_transient()?;

        match result {
            Ok(reply) => {
                trace.log(TraceKind::ChatOut, &reply.text);
                let at = session
                    .store()
                    .last()
                    .map_or_else(local_now, |turn| turn.timestamp);
                let entry = timeline.push_reply(reply.formatted, at);
                write_entry(screen, theme, entry)?;
            }
            Err(err) => {
                trace.log(TraceKind::Error, &err.to_string());
                let entry =
                    timeline.push_notice(NoticeKind::Error, &format!("Model request failed: {err}"));
                write_entry(screen, theme, entry)?;
            }
        }

        Ok(())
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Help => self.notice(
                NoticeKind::Info,
                &format!("{HELP_TEXT}\n\n{HOW_TO_USE}\n\n{}", examples_text()),
            ),
            Command::Settings => {
                let text = self.settings_text();
                self.notice(NoticeKind::Info, &text)
            }
            Command::Theme(None) => self.list_themes(),
            Command::Theme(Some(preset)) => self.switch_theme(preset),
            Command::Model(None) => {
                let text = self.models_text();
                self.notice(NoticeKind::Info, &text)
            }
            Command::Model(Some(key)) => {
                match self.state.session.settings_mut().set_model(&key) {
                    Ok(entry) => self.notice(
                        NoticeKind::Info,
                        &format!(
                            "Model set to {} ({})",
                            entry.display_name, entry.backend_identifier
                        ),
                    ),
                    Err(err) => self.notice(
                        NoticeKind::Error,
                        &format!("{err}. Use /model to list available models"),
                    ),
                }
            }
            Command::Language(None) => {
                let names = OutputLanguage::all()
                    .iter()
                    .map(|lang| lang.display_name())
                    .collect::<Vec<_>>()
                    .join(", ");
                let text = format!(
                    "Code output language: {}\nAvailable: {names}",
                    self.state.session.settings().output_language()
                );
                self.notice(NoticeKind::Info, &text)
            }
            Command::Language(Some(language)) => {
                self.state
                    .session
                    .settings_mut()
                    .set_output_language(language);
                self.notice(
                    NoticeKind::Info,
                    &format!("Code output language set to {language}"),
                )
            }
            Command::Temperature(None) => {
                let text = format!(
                    "Temperature: {}",
                    self.state.session.settings().temperature()
                );
                self.notice(NoticeKind::Info, &text)
            }
            Command::Temperature(Some(value)) => {
                match self.state.session.settings_mut().set_temperature(value) {
                    Ok(()) => self.notice(NoticeKind::Info, &format!("Temperature set to {value}")),
                    Err(err) => self.notice(NoticeKind::Error, &err.to_string()),
                }
            }
            Command::Thinking(None) => {
                let text = format!(
                    "Thinking steps are {}",
                    on_off(self.state.session.settings().show_thinking())
                );
                self.notice(NoticeKind::Info, &text)
            }
            Command::Thinking(Some(show)) => {
                self.state.session.settings_mut().set_show_thinking(show);
                self.notice(
                    NoticeKind::Info,
                    &format!("Thinking steps turned {}", on_off(show)),
                )
            }
            Command::History(limit) => self.show_history(limit),
            Command::Example(example) => {
                let language = self.state.session.settings().output_language();
                self.notice(NoticeKind::Info, &format!("Example: {}", example.title()))?;
                self.submit(&example.prompt(language)).await
            }
            Command::Capabilities => self.notice(NoticeKind::Info, &capabilities_text()),
            Command::Trace => {
                let text = format!("Trace file: {}", self.state.trace.file_path().display());
                self.notice(NoticeKind::Info, &text)
            }
            Command::Clear => {
                self.timeline.clear();
                self.screen.clear()?;
                Ok(())
            }
        }
    }

    fn settings_text(&self) -> String {
        let settings = self.state.session.settings();
        let model = settings.model();
        format!(
            "Settings:\n  backend      {}\n  model        {} ({})\n  language     {}\n  temperature  {}\n  thinking     {}\n  theme        {}\n  trace        {}",
            settings.backend(),
            model.display_name,
            model.key,
            settings.output_language(),
            settings.temperature(),
            on_off(settings.show_thinking()),
            settings.theme(),
            self.state.trace.file_path().display()
        )
    }

    fn models_text(&self) -> String {
        let settings = self.state.session.settings();
        let mut text = format!("Models for the {} backend:", settings.backend());
        for entry in settings.backend().models() {
            let marker = if entry.key == settings.model_key() { '*' } else { ' ' };
            text.push_str(&format!(
                "\n  {marker} {:<18} {} ({})",
                entry.key, entry.display_name, entry.backend_identifier
            ));
        }
        text
    }

    fn list_themes(&mut self) -> Result<()> {
        let current = self.state.session.settings().theme();
        let mut lines = vec![Line::from("Themes:")];
        for preset in ThemePreset::all() {
            let marker = if *preset == current { '*' } else { ' ' };
            let mut spans = vec![Span::raw(format!(
                "  {marker} {:<10} {:<10} ",
                preset.key(),
                preset.display_name()
            ))];
            spans.extend(swatch(*preset, self.state.color_enabled));
            lines.push(Line::from(spans));
        }
        self.screen.write_lines(&lines)?;
        Ok(())
    }

    fn switch_theme(&mut self, preset: ThemePreset) -> Result<()> {
        self.state.session.settings_mut().set_theme(preset);
        self.state.theme_config.preset = preset;
        self.theme = Theme::from_config(self.state.color_enabled, &self.state.theme_config);

        self.screen.clear()?;
        let lines = self.timeline.render_lines(&self.theme);
        self.screen.write_lines(&lines)?;
        self.notice(NoticeKind::Info, &format!("Theme set to {preset}"))
    }

    fn show_history(&mut self, limit: Option<usize>) -> Result<()> {
        let store = self.state.session.store();
        let turns = store.recent_window(limit.unwrap_or(store.len()));
        let mut lines = vec![Line::from(Span::styled(
            format!(
                "Conversation history ({} of {} turns):",
                turns.len(),
                store.len()
            ),
            self.theme.style(ThemeToken::SystemInfo),
        ))];
        for turn in turns {
            render_entry(&TimelineEntry::from_turn(turn), &self.theme, &mut lines);
        }
        self.screen.write_lines(&lines)?;
        Ok(())
    }

    fn notice(&mut self, kind: NoticeKind, text: &str) -> Result<()> {
        let entry = self.timeline.push_notice(kind, text);
        write_entry(&mut self.screen, &self.theme, entry)?;
        Ok(())
    }
}

fn write_entry<W: Write>(screen: &mut Screen<W>, theme: &Theme, entry: &TimelineEntry) -> io::Result<()> {
    let mut lines = Vec::new();
    render_entry(entry, theme, &mut lines);
    screen.write_lines(&lines)
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
