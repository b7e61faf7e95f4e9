pub mod cli;
pub mod config;
pub mod format;
pub mod http;
pub mod llm;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod thinking;
pub mod trace;

use anyhow::{Result, anyhow};
use cli::{AppState, CliArgs, NoticeKind, TOKEN_SETUP_GUIDE, run_repl};
use config::{AppConfig, ThemeConfig};
use http::{HttpClient, HttpDebugConfig};
use llm::Backend;
use llm::huggingface::{HfInferenceClient, SHARED_CLIENT};
use llm::ollama::LocalBackend;
use llm::remote::RemoteBackend;
use registry::BackendKind;
use session::{SessionContext, Settings};
use std::io::{self, IsTerminal};
use std::time::{SystemTime, UNIX_EPOCH};
use trace::{SessionTrace, TraceKind};

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let settings = build_settings(&config, &args)?;
    let theme_config = ThemeConfig {
        preset: settings.theme(),
        ..config.theme.clone()
    };

    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;
    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());

    let mut startup_notices = Vec::new();
    let backend = match settings.backend() {
        BackendKind::Remote => {
            let (client, warning) = SHARED_CLIENT.get_or_init(|| {
                HfInferenceClient::new(http, config.hf_token.clone(), &config.hf_base_url)
            });
            if let Some(warning) = warning {
                trace.log(TraceKind::Warning, warning);
                startup_notices.push((NoticeKind::Warning, warning.to_string()));
                startup_notices.push((NoticeKind::Info, TOKEN_SETUP_GUIDE.to_string()));
            }
            Backend::Remote(RemoteBackend::new(client).with_trace(trace.clone()))
        }
        BackendKind::Local => Backend::Local(LocalBackend::new(http, &config.ollama_base_url)),
    };

    let mut app_state = AppState {
        session: SessionContext::new(settings),
        backend,
        theme_config,
        color_enabled: color_enabled(),
        trace,
        startup_notices,
    };

    run_repl(&mut app_state).await
}

/// Resolves session settings: command-line flags win over the config file,
/// which wins over built-in defaults.
fn build_settings(config: &AppConfig, args: &CliArgs) -> Result<Settings> {
    let backend = args.backend.unwrap_or(config.backend);
    let mut settings = Settings::new(backend);

    if let Some(language) = args.language.or(config.language) {
        settings.set_output_language(language);
    }

    if let Some(model) = args.model.as_deref().or(config.model.as_deref()) {
        settings
            .set_model(model)
            .map_err(|err| anyhow!("{err} for the {backend} backend"))?;
    }

    if let Some(temperature) = args.temperature.or(config.temperature) {
        settings
            .set_temperature(temperature)
            .map_err(|err| anyhow!("{err}"))?;
    }

    settings.set_show_thinking(!args.no_thinking && config.show_thinking.unwrap_or(true));
    settings.set_theme(args.theme.unwrap_or(config.theme.preset));
    Ok(settings)
}

fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal()
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
