use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::llm::huggingface::DEFAULT_HF_BASE_URL;
use crate::llm::ollama::DEFAULT_OLLAMA_BASE_URL;
use crate::registry::{BackendKind, OutputLanguage};

const CONFIG_DIR_NAME: &str = "code-companion";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_HF_TOKEN: &str = "HF_TOKEN";
pub const ENV_HF_BASE_URL: &str = "HF_BASE_URL";
pub const ENV_OLLAMA_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const ENV_BACKEND: &str = "CODE_COMPANION_BACKEND";

/// Resolved startup configuration. Environment values win over the config
/// file; command-line flags are applied on top by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub backend: BackendKind,
    pub hf_token: Option<String>,
    pub hf_base_url: String,
    pub ollama_base_url: String,
    pub language: Option<OutputLanguage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub show_thinking: Option<bool>,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub preset: ThemePreset,
    pub styles: HashMap<ThemeToken, StyleOverride>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            preset: ThemePreset::DarkMode,
            styles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    DarkMode,
    Oceanic,
    Forest,
    Sunset,
}

impl ThemePreset {
    pub const fn all() -> &'static [Self] {
        &[Self::DarkMode, Self::Oceanic, Self::Forest, Self::Sunset]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::DarkMode => "dark-mode",
            Self::Oceanic => "oceanic",
            Self::Forest => "forest",
            Self::Sunset => "sunset",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::DarkMode => "Dark Mode",
            Self::Oceanic => "Oceanic",
            Self::Forest => "Forest",
            Self::Sunset => "Sunset",
        }
    }
}

impl Display for ThemePreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|preset| {
                preset.key().eq_ignore_ascii_case(wanted)
                    || preset.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("unknown theme '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeToken {
    UserPrompt,
    AssistantPrompt,
    UserText,
    AssistantText,
    CodeBlock,
    Timestamp,
    Thinking,
    SystemInfo,
    SystemWarning,
    SystemError,
}

impl ThemeToken {
    pub const fn all() -> &'static [Self] {
        &[
            Self::UserPrompt,
            Self::AssistantPrompt,
            Self::UserText,
            Self::AssistantText,
            Self::CodeBlock,
            Self::Timestamp,
            Self::Thinking,
            Self::SystemInfo,
            Self::SystemWarning,
            Self::SystemError,
        ]
    }
}

impl FromStr for ThemeToken {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "user_prompt" => Ok(Self::UserPrompt),
            "assistant_prompt" => Ok(Self::AssistantPrompt),
            "user_text" => Ok(Self::UserText),
            "assistant_text" => Ok(Self::AssistantText),
            "code_block" => Ok(Self::CodeBlock),
            "timestamp" => Ok(Self::Timestamp),
            "thinking" => Ok(Self::Thinking),
            "system_info" => Ok(Self::SystemInfo),
            "system_warning" => Ok(Self::SystemWarning),
            "system_error" => Ok(Self::SystemError),
            _ => Err(format!("unknown token '{value}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOverride {
    pub fg: Option<HexColor>,
    pub bg: Option<HexColor>,
    pub modifiers: Option<Vec<ThemeModifier>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || "invalid hex color, expected #RRGGBB".to_string();
        let digits = value.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeModifier {
    Bold,
    Dim,
    Italic,
    Underlined,
    Reversed,
    CrossedOut,
}

impl FromStr for ThemeModifier {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "bold" => Ok(Self::Bold),
            "dim" => Ok(Self::Dim),
            "italic" => Ok(Self::Italic),
            "underlined" => Ok(Self::Underlined),
            "reversed" => Ok(Self::Reversed),
            "crossed_out" => Ok(Self::CrossedOut),
            _ => Err(format!("unknown modifier '{value}'")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    backend: Option<String>,
    hf_token: Option<String>,
    hf_base_url: Option<String>,
    ollama_base_url: Option<String>,
    language: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    show_thinking: Option<bool>,
    theme: Option<RawThemeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThemeConfig {
    name: Option<String>,
    styles: Option<HashMap<String, RawStyleOverride>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyleOverride {
    fg: Option<String>,
    bg: Option<String>,
    modifiers: Option<Vec<String>>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// Loads the config file (the XDG location unless `explicit_path` is
    /// given), then `.env`, then the process environment.
    pub fn load_with_path(explicit_path: Option<&Path>) -> Result<Self> {
        let config_path = match explicit_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                path.to_path_buf()
            }
            None => discover_config_path()?,
        };
        let file_config = load_file_config(&config_path)?.unwrap_or_default();

        dotenvy::dotenv().ok();

        let backend = match env_non_empty(ENV_BACKEND) {
            Some(value) => BackendKind::from_str(&value)
                .map_err(|err| anyhow!("Failed to load config: {ENV_BACKEND}: {err}"))?,
            None => match file_config.backend.as_deref().and_then(non_empty) {
                Some(value) => BackendKind::from_str(value)
                    .map_err(|err| config_error(&config_path, "backend", &err.to_string()))?,
                None => BackendKind::Remote,
            },
        };

        let language = file_config
            .language
            .as_deref()
            .and_then(non_empty)
            .map(OutputLanguage::from_str)
            .transpose()
            .map_err(|err| config_error(&config_path, "language", &err.to_string()))?;

        if let Some(value) = file_config.temperature
            && !(0.0..=1.0).contains(&value)
        {
            return Err(config_error(
                &config_path,
                "temperature",
                &format!("{value} is outside 0.0..=1.0"),
            ));
        }

        let theme = validate_theme(file_config.theme.as_ref(), &config_path)?;

        Ok(Self {
            backend,
            hf_token: env_non_empty(ENV_HF_TOKEN).or(owned_non_empty(file_config.hf_token)),
            hf_base_url: env_non_empty(ENV_HF_BASE_URL)
                .or(owned_non_empty(file_config.hf_base_url))
                .unwrap_or_else(|| DEFAULT_HF_BASE_URL.to_string()),
            ollama_base_url: env_non_empty(ENV_OLLAMA_BASE_URL)
                .or(owned_non_empty(file_config.ollama_base_url))
                .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
            language,
            model: owned_non_empty(file_config.model),
            temperature: file_config.temperature,
            show_thinking: file_config.show_thinking,
            theme,
            config_path,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| anyhow!("Failed to resolve config path: HOME directory is unavailable"))?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text)
        .map(Some)
        .map_err(|err| anyhow!("Failed to load config {}: {err}", config_path.display()))
}

fn validate_theme(raw_theme: Option<&RawThemeConfig>, config_path: &Path) -> Result<ThemeConfig> {
    let Some(theme) = raw_theme else {
        return Ok(ThemeConfig::default());
    };

    let mut config = ThemeConfig::default();

    if let Some(name) = &theme.name {
        config.preset = ThemePreset::from_str(name)
            .map_err(|reason| config_error(config_path, "theme.name", &reason))?;
    }

    for (token_name, raw_style) in theme.styles.iter().flatten() {
        let token = ThemeToken::from_str(token_name).map_err(|reason| {
            config_error(config_path, &format!("theme.styles.{token_name}"), &reason)
        })?;

        let fg = parse_color(raw_style.fg.as_deref(), config_path, token_name, "fg")?;
        let bg = parse_color(raw_style.bg.as_deref(), config_path, token_name, "bg")?;
        let modifiers = parse_modifiers(raw_style.modifiers.as_deref(), config_path, token_name)?;

        config.styles.insert(token, StyleOverride { fg, bg, modifiers });
    }

    Ok(config)
}

fn parse_color(
    value: Option<&str>,
    config_path: &Path,
    token_name: &str,
    field_name: &str,
) -> Result<Option<HexColor>> {
    let Some(value) = value else {
        return Ok(None);
    };

    HexColor::from_str(value).map(Some).map_err(|reason| {
        config_error(
            config_path,
            &format!("theme.styles.{token_name}.{field_name}"),
            &reason,
        )
    })
}

fn parse_modifiers(
    values: Option<&[String]>,
    config_path: &Path,
    token_name: &str,
) -> Result<Option<Vec<ThemeModifier>>> {
    let Some(values) = values else {
        return Ok(None);
    };

    values
        .iter()
        .map(|value| {
            ThemeModifier::from_str(value).map_err(|reason| {
                config_error(
                    config_path,
                    &format!("theme.styles.{token_name}.modifiers"),
                    &reason,
                )
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|value| non_empty(&value).map(ToOwned::to_owned))
}

fn owned_non_empty(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(non_empty).map(ToOwned::to_owned)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}
