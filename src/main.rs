use anyhow::Result;
use clap::Parser;
use code_companion::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    code_companion::run(args).await
}
