use anyhow::{Context, Result};
use clap::Parser;
use heartwise_core::{init_logging, Settings};
use heartwise_service::{start_server, AppState, InferenceService};
use tracing::info;

#[derive(Parser)]
#[command(name = "heartwise-service")]
#[command(about = "Heart disease prediction API")]
#[command(version)]
struct Cli {
    /// Model locator: file:// URI, path or runs:/<run_id>/<artifact_path>
    #[arg(long)]
    model: Option<String>,

    /// Override API_HOST
    #[arg(long)]
    host: Option<String>,

    /// Override API_PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load settings")?;
    if let Some(host) = cli.host {
        settings.api.host = host;
    }
    if let Some(port) = cli.port {
        settings.api.port = port;
    }
    init_logging(&settings.logging).context("failed to initialise logging")?;
    info!("starting heartwise-service v{}", env!("CARGO_PKG_VERSION"));

    let explicit = cli.model.clone();
    let startup = settings.clone();
    let (inference, source) = tokio::task::spawn_blocking(move || {
        InferenceService::from_settings(explicit.as_deref(), &startup)
    })
    .await
    .context("model startup task panicked")?
    .context("could not determine a model to serve")?;
    info!(
        locator = inference.locator(),
        model = inference.model_name(),
        %source,
        "inference service ready"
    );

    start_server(AppState::new(inference), &settings.api).await?;
    info!("heartwise-service stopped");
    Ok(())
}
