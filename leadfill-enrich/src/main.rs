//! leadfill-enrich - Contact enrichment microservice
//!
//! Accepts CSV uploads of real-estate contacts, resolves agent email/phone
//! for each row through the configured upstream lookups, and serves the
//! enriched CSV for download. `enrich` runs the same pipeline on a local
//! file without starting the server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use leadfill_enrich::batch::enrich_csv;
use leadfill_enrich::config::EnrichConfig;
use leadfill_enrich::resolver::ResolutionPolicy;
use leadfill_enrich::services::build_strategies;
use leadfill_enrich::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "leadfill-enrich", version, about = "Real-estate contact enrichment service")]
struct Cli {
    /// Config file (overrides LEADFILL_CONFIG and the default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,
        /// Port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Enrich a local CSV file and exit
    Enrich {
        /// Input CSV
        input: PathBuf,
        /// Output CSV (defaults to `enriched_<input name>` beside the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Start at info so config loading is logged; the configured level is
    // applied once known unless RUST_LOG is set.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    info!("Starting leadfill-enrich v{}", env!("CARGO_PKG_VERSION"));

    let config = EnrichConfig::load(cli.config.as_deref())?;
    if !from_env {
        filter_handle.reload(EnvFilter::new(&config.logging.level))?;
    }

    let strategies = build_strategies(&config)?;
    let policy = ResolutionPolicy::new(strategies, &config.policy);

    match cli.command.unwrap_or(Command::Serve { bind: None, port: None }) {
        Command::Serve { bind, port } => serve(config, policy, bind, port).await,
        Command::Enrich { input, output } => enrich_file(config, policy, input, output).await,
    }
}

async fn serve(
    mut config: EnrichConfig,
    policy: ResolutionPolicy,
    bind: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(bind) = bind {
        config.bind_address = bind;
    }
    if let Some(port) = port {
        config.port = port;
    }
    let address = format!("{}:{}", config.bind_address, config.port);

    let state = AppState::new(config, policy);
    state
        .outputs
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create output dir {}", state.outputs.dir().display()))?;
    info!("Output directory: {}", state.outputs.dir().display());
    if let Err(e) = state.outputs.sweep_expired().await {
        tracing::warn!(error = %e, "Startup output sweep failed");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn enrich_file(
    config: EnrichConfig,
    policy: ResolutionPolicy,
    input: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let output = output.unwrap_or_else(|| {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.csv".to_string());
        input.with_file_name(format!("enriched_{}", name))
    });

    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let enriched = enrich_csv(bytes, &config.columns, &policy).await?;

    tokio::fs::write(&output, &enriched.contents)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        rows = enriched.counts.total(),
        ok = enriched.counts.ok,
        "Wrote {}",
        output.display()
    );
    Ok(())
}
