use clap::Parser;
use std::path::PathBuf;

use crate::config::ThemePreset;
use crate::registry::{BackendKind, OutputLanguage};

#[derive(Debug, Parser, Clone, PartialEq)]
#[command(name = "code-companion")]
#[command(
    about = "Themeable terminal chat with a code-assistant model",
    long_about = "Themeable terminal chat with a code-assistant model\n\nBackends:\n  remote  hosted inference API (HF_TOKEN from env, .env or config)\n  local   local model server at OLLAMA_BASE_URL\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default lookup path when --config is not provided:\n    1. $XDG_CONFIG_HOME/code-companion/config.toml\n    2. ~/.config/code-companion/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model backend: remote or local.
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<BackendKind>,

    /// Model key from the selected backend's registry.
    #[arg(long, value_name = "KEY")]
    pub model: Option<String>,

    /// Programming language the assistant answers in.
    #[arg(long, value_name = "LANG")]
    pub language: Option<OutputLanguage>,

    /// Color theme: dark-mode, oceanic, forest or sunset.
    #[arg(long, value_name = "NAME")]
    pub theme: Option<ThemePreset>,

    /// Sampling temperature between 0.0 and 1.0.
    #[arg(long, value_name = "VALUE")]
    pub temperature: Option<f32>,

    /// Hide the thinking steps while waiting for a reply.
    #[arg(long)]
    pub no_thinking: bool,

    /// Echo HTTP requests and responses to stderr, with secrets redacted.
    #[arg(long)]
    pub verbose: bool,
}
