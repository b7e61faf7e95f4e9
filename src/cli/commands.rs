use std::str::FromStr;

use crate::config::ThemePreset;
use crate::registry::OutputLanguage;

use super::guide::Example;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Help,
    Settings,
    Theme(Option<ThemePreset>),
    Model(Option<String>),
    Language(Option<OutputLanguage>),
    Temperature(Option<f32>),
    Thinking(Option<bool>),
    History(Option<usize>),
    Example(Example),
    Capabilities,
    Trace,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

pub(crate) const HELP_TEXT: &str = "Available commands:\n  /help                  Show this command list and usage tips\n  /settings              Show the current session settings\n  /theme [name]          Show or switch the color theme\n  /model [key]           Show or switch the model\n  /language [name]       Show or switch the code output language\n  /temperature [0.0-1.0] Show or set the sampling temperature\n  /thinking [on|off]     Show or toggle the thinking steps\n  /history [n]           Show the conversation (or its last n turns)\n  /example <1|2|3>       Send one of the example prompts\n  /capabilities          List what the assistant can help with\n  /trace                 Show path to the current trace file\n  /clear                 Clear the screen\n  exit | quit            Leave the session";

pub(crate) fn parse_command(line: &str) -> Result<Command, ParseError> {
    if !line.starts_with('/') {
        return Err(ParseError::new("not a command"));
    }

    let trimmed = line.trim();
    let command_text = &trimmed[1..];
    let mut parts = command_text.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    if name.is_empty() {
        return Err(ParseError::new("empty command. Try /help"));
    }
    let rest = parts.next().map(str::trim).unwrap_or("");

    match name.as_str() {
        "help" => expect_no_args(rest, Command::Help, "usage: /help"),
        "settings" => expect_no_args(rest, Command::Settings, "usage: /settings"),
        "theme" => parse_optional(rest, Command::Theme, theme_usage),
        "model" => Ok(Command::Model(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "language" | "lang" => parse_optional(rest, Command::Language, language_usage),
        "temperature" | "temp" => parse_temperature(rest),
        "thinking" => parse_thinking(rest),
        "history" => parse_history(rest),
        "example" => parse_example(rest),
        "capabilities" => expect_no_args(rest, Command::Capabilities, "usage: /capabilities"),
        "trace" => expect_no_args(rest, Command::Trace, "usage: /trace"),
        "clear" => expect_no_args(rest, Command::Clear, "usage: /clear"),
        _ => Err(ParseError::new(format!(
            "unknown command '/{name}'. Try /help"
        ))),
    }
}

pub(crate) fn is_command_line(line: &str) -> bool {
    line.starts_with('/')
}

pub(crate) fn is_exit_line(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

fn expect_no_args(rest: &str, command: Command, usage: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(usage))
    }
}

fn parse_optional<T: FromStr>(
    rest: &str,
    build: fn(Option<T>) -> Command,
    usage: fn() -> String,
) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(build(None));
    }
    T::from_str(rest)
        .map(|value| build(Some(value)))
        .map_err(|_| ParseError::new(usage()))
}

fn theme_usage() -> String {
    let names = ThemePreset::all()
        .iter()
        .map(|preset| preset.key())
        .collect::<Vec<_>>();
    format!("usage: /theme [{}]", names.join("|"))
}

fn language_usage() -> String {
    let names = OutputLanguage::all()
        .iter()
        .map(|lang| lang.display_name())
        .collect::<Vec<_>>();
    format!("usage: /language [{}]", names.join("|"))
}

fn parse_temperature(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::Temperature(None));
    }

    let value = rest
        .parse::<f32>()
        .map_err(|_| ParseError::new("usage: /temperature [0.0-1.0]"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ParseError::new(
            "usage: /temperature [0.0-1.0] (value out of range)",
        ));
    }
    Ok(Command::Temperature(Some(value)))
}

fn parse_thinking(rest: &str) -> Result<Command, ParseError> {
    match rest {
        "" => Ok(Command::Thinking(None)),
        "on" => Ok(Command::Thinking(Some(true))),
        "off" => Ok(Command::Thinking(Some(false))),
        _ => Err(ParseError::new("usage: /thinking [on|off]")),
    }
}

fn parse_history(rest: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        return Ok(Command::History(None));
    }

    let value = rest
        .parse::<usize>()
        .map_err(|_| ParseError::new("usage: /history [n]"))?;
    if value == 0 {
        return Err(ParseError::new("usage: /history [n] (n must be >= 1)"));
    }

    Ok(Command::History(Some(value)))
}

fn parse_example(rest: &str) -> Result<Command, ParseError> {
    let usage = || ParseError::new("usage: /example <1|2|3>");
    let index = rest.parse::<usize>().map_err(|_| usage())?;
    Example::from_index(index).map(Command::Example).ok_or_else(usage)
}
