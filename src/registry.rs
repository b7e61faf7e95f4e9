use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    UnknownKey { kind: &'static str, value: String },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKey { kind, value } => write!(f, "unknown {kind} '{value}'"),
        }
    }
}

impl Error for RegistryError {}

fn unknown(kind: &'static str, value: &str) -> RegistryError {
    RegistryError::UnknownKey {
        kind,
        value: value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLanguage {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    CSharp,
    Go,
    Rust,
    Php,
    Ruby,
    Swift,
    Kotlin,
}

impl OutputLanguage {
    pub const fn all() -> &'static [Self] {
        &[
            Self::Python,
            Self::JavaScript,
            Self::TypeScript,
            Self::Java,
            Self::Cpp,
            Self::CSharp,
            Self::Go,
            Self::Rust,
            Self::Php,
            Self::Ruby,
            Self::Swift,
            Self::Kotlin,
        ]
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Java => "Java",
            Self::Cpp => "C++",
            Self::CSharp => "C#",
            Self::Go => "Go",
            Self::Rust => "Rust",
            Self::Php => "PHP",
            Self::Ruby => "Ruby",
            Self::Swift => "Swift",
            Self::Kotlin => "Kotlin",
        }
    }

    const fn alias(self) -> Option<&'static str> {
        match self {
            Self::Cpp => Some("cpp"),
            Self::CSharp => Some("csharp"),
            Self::JavaScript => Some("js"),
            Self::TypeScript => Some("ts"),
            _ => None,
        }
    }
}

impl Display for OutputLanguage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for OutputLanguage {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::all()
            .iter()
            .copied()
            .find(|lang| {
                lang.display_name().eq_ignore_ascii_case(wanted)
                    || lang.alias().is_some_and(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| unknown("language", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Remote,
    Local,
}

impl BackendKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }

    pub const fn models(self) -> &'static [ModelEntry] {
        match self {
            Self::Remote => HOSTED_MODELS,
            Self::Local => LOCAL_MODELS,
        }
    }

    pub const fn default_model_key(self) -> &'static str {
        match self {
            Self::Remote => "gpt2",
            Self::Local => "deepseek-r1:1.5b",
        }
    }

    pub fn model(self, key: &str) -> Result<&'static ModelEntry, RegistryError> {
        match self {
            Self::Remote => hosted_model(key),
            Self::Local => local_model(key),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" | "hf" | "huggingface" => Ok(Self::Remote),
            "local" | "ollama" => Ok(Self::Local),
            _ => Err(unknown("backend", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub key: &'static str,
    pub display_name: &'static str,
    pub backend_identifier: &'static str,
}

pub const HOSTED_MODELS: &[ModelEntry] = &[
    ModelEntry {
        key: "bloom",
        display_name: "Bloom",
        backend_identifier: "bigscience/bloom",
    },
    ModelEntry {
        key: "bloom-560m",
        display_name: "Bloom-560m",
        backend_identifier: "bigscience/bloom-560m",
    },
    ModelEntry {
        key: "flan-t5-xl",
        display_name: "Flan-T5-XL",
        backend_identifier: "google/flan-t5-xl",
    },
    ModelEntry {
        key: "flan-t5-large",
        display_name: "Flan-T5-Large",
        backend_identifier: "google/flan-t5-large",
    },
    ModelEntry {
        key: "gpt2",
        display_name: "GPT2",
        backend_identifier: "gpt2",
    },
    ModelEntry {
        key: "gpt2-xl",
        display_name: "GPT2-XL",
        backend_identifier: "gpt2-xl",
    },
    ModelEntry {
        key: "gpt-neo",
        display_name: "GPT-Neo",
        backend_identifier: "EleutherAI/gpt-neo-1.3B",
    },
];

pub const LOCAL_MODELS: &[ModelEntry] = &[
    ModelEntry {
        key: "deepseek-r1:1.5b",
        display_name: "DeepSeek R1 1.5B",
        backend_identifier: "deepseek-r1:1.5b",
    },
    ModelEntry {
        key: "deepseek-r1:3b",
        display_name: "DeepSeek R1 3B",
        backend_identifier: "deepseek-r1:3b",
    },
];

/// Looks up a hosted model by key or display name, ignoring case.
pub fn hosted_model(key: &str) -> Result<&'static ModelEntry, RegistryError> {
    find_model(HOSTED_MODELS, key).ok_or_else(|| unknown("model", key))
}

pub fn local_model(key: &str) -> Result<&'static ModelEntry, RegistryError> {
    find_model(LOCAL_MODELS, key).ok_or_else(|| unknown("model", key))
}

fn find_model(table: &'static [ModelEntry], key: &str) -> Option<&'static ModelEntry> {
    let wanted = key.trim();
    table.iter().find(|entry| {
        entry.key.eq_ignore_ascii_case(wanted) || entry.display_name.eq_ignore_ascii_case(wanted)
    })
}
