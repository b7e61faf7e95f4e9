mod args;
mod commands;
mod guide;
mod render;
mod repl;
pub(crate) mod theme;
mod timeline;

pub use args::CliArgs;
pub(crate) use guide::TOKEN_SETUP_GUIDE;
pub use repl::{AppState, WELCOME_TEXT, run_repl};
pub use timeline::NoticeKind;
