use anyhow::{Context, Result};
use clap::Parser;
use dispdash::{
    app::{self, AppState},
    config::{self, Settings},
    process,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Serve the displacement dashboard for the built-in survey tracks.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Verbose logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_filter = if cli.debug { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let settings = Settings::from_env(cli.debug)?;
    let tracks = config::builtin_tracks()?;
    info!(tracks = tracks.len(), port = settings.port, "configured");

    // ─── 3) build the observation table before accepting requests ────
    let table = tokio::task::spawn_blocking(move || process::load_tracks(&tracks))
        .await?
        .context("loading survey tracks")?;

    // ─── 4) serve ────────────────────────────────────────────────────
    let state = AppState::new(table, app::dashboard_registry());
    app::serve(&settings, state).await?;

    info!("all done");
    Ok(())
}
