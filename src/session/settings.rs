use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::config::ThemePreset;
use crate::registry::{BackendKind, ModelEntry, OutputLanguage, RegistryError};

pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    Registry(RegistryError),
    TemperatureOutOfRange(f32),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "{err}"),
            Self::TemperatureOutOfRange(value) => {
                write!(f, "temperature {value} is outside 0.0..=1.0")
            }
        }
    }
}

impl Error for SettingsError {}

impl From<RegistryError> for SettingsError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

/// User-selected knobs for one session. Fields are only reachable through
/// setters so every value stays inside its registry or range.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    backend: BackendKind,
    output_language: OutputLanguage,
    model: &'static ModelEntry,
    temperature: f32,
    show_thinking: bool,
    theme: ThemePreset,
}

impl Settings {
    pub fn new(backend: BackendKind) -> Self {
        let model = backend
            .models()
            .iter()
            .find(|entry| entry.key == backend.default_model_key())
            .unwrap_or(&backend.models()[0]);

        Self {
            backend,
            output_language: OutputLanguage::Python,
            model,
            temperature: DEFAULT_TEMPERATURE,
            show_thinking: true,
            theme: ThemePreset::DarkMode,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn output_language(&self) -> OutputLanguage {
        self.output_language
    }

    pub fn model(&self) -> &'static ModelEntry {
        self.model
    }

    pub fn model_key(&self) -> &'static str {
        self.model.key
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn show_thinking(&self) -> bool {
        self.show_thinking
    }

    pub fn theme(&self) -> ThemePreset {
        self.theme
    }

    pub fn set_output_language(&mut self, language: OutputLanguage) {
        self.output_language = language;
    }

    /// Selects a model from the registry of the session's backend.
    pub fn set_model(&mut self, key: &str) -> Result<&'static ModelEntry, SettingsError> {
        let entry = self.backend.model(key)?;
        self.model = entry;
        Ok(entry)
    }

    pub fn set_temperature(&mut self, value: f32) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(SettingsError::TemperatureOutOfRange(value));
        }
        self.temperature = value;
        Ok(())
    }

    pub fn set_show_thinking(&mut self, show: bool) {
        self.show_thinking = show;
    }

    pub fn set_theme(&mut self, theme: ThemePreset) {
        self.theme = theme;
    }
}
