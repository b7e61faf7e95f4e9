use crate::registry::OutputLanguage;

pub(crate) const CAPABILITIES: &[&str] = &[
    "Code Generation & Completion",
    "Error Detection & Debugging",
    "Code Documentation",
    "Code Refactoring",
    "Algorithm Explanation",
    "Multi-language Support",
];

pub(crate) const HOW_TO_USE: &str = "How to use:\n  1. Select your theme (/theme) and preferred language (/language)\n  2. Choose a model (/model)\n  3. Type your coding question at the prompt\n  4. Read the reply; code blocks are highlighted\n  5. Adjust the temperature (/temperature) for different response styles";

pub(crate) const TOKEN_SETUP_GUIDE: &str = "Setting up your Hugging Face API token:\n  1. Create a Hugging Face account at https://huggingface.co\n  2. Go to your profile settings and create an API token\n  3. Create a .env file in your project directory\n  4. Add the line HF_TOKEN=your-token-here\n  5. Restart the application\nThis authenticates your requests and raises your rate limits.";

/// Canned prompts offered as "try these examples".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Example {
    DebugRecursion,
    ExplainSort,
    RestApi,
}

impl Example {
    pub(crate) const ALL: [Self; 3] = [Self::DebugRecursion, Self::ExplainSort, Self::RestApi];

    pub(crate) fn from_index(index: usize) -> Option<Self> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub(crate) const fn title(self) -> &'static str {
        match self {
            Self::DebugRecursion => "Debug a recursive function",
            Self::ExplainSort => "Explain a sorting algorithm",
            Self::RestApi => "Generate a REST API",
        }
    }

    pub(crate) fn prompt(self, language: OutputLanguage) -> String {
        match self {
            Self::DebugRecursion => "Debug this recursive function that's causing a stack overflow: def factorial(n): return n * factorial(n-1)".to_string(),
            Self::ExplainSort => {
                "Explain how quicksort works and show me an implementation in Python".to_string()
            }
            Self::RestApi => format!("Create a simple REST API for a todo app using {language}"),
        }
    }
}

pub(crate) fn examples_text() -> String {
    let mut text = String::from("Try these examples:");
    for (index, example) in Example::ALL.iter().enumerate() {
        text.push_str(&format!("\n  /example {}  {}", index + 1, example.title()));
    }
    text
}

pub(crate) fn capabilities_text() -> String {
    let mut text = String::from("Model capabilities:");
    for capability in CAPABILITIES {
        text.push_str("\n  - ");
        text.push_str(capability);
    }
    text
}
