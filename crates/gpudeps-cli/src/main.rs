//! CLI entry point - the composition root.

use clap::Parser;
use gpudeps_cli::{Cli, handlers};
use gpudeps_core::{DepsPaths, Settings};
use gpudeps_runtime::{CancellationToken, DependencyManager};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = match &cli.home {
        Some(root) => DepsPaths::under(root),
        None => DepsPaths::resolve()?,
    };
    let settings = Settings::load(&paths.settings_path())?;

    let manager = DependencyManager::open(paths, &settings).await?;
    tracing::debug!(paths = %manager.paths(), platform = %manager.platform(), "Manager ready");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    handlers::dispatch(&manager, cli.command, &cancel).await
}
