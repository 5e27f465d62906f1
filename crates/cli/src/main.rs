//! Heartwise command line interface
//!
//! Runs the pipeline stages individually or end to end. Behaviour comes from
//! the environment (see `heartwise config`); flags only override it.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use heartwise_core::{init_logging, PatientRecord, Settings};
use heartwise_data::{clean_dataset, download_dataset, CleanTable, RawTable};
use heartwise_service::InferenceService;
use heartwise_trainer::{TrainerConfig, TrainingReport};
use heartwise_tracking::{run_experiment, save_final_model, ExperimentOutcome};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "heartwise")]
#[command(about = "Heart disease MLOps pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Override DATA_DIR
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Override MLRUNS_DIR
    #[arg(long, global = true, value_name = "PATH")]
    mlruns_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration as JSON
    Config,
    /// Download the dataset archive and write the raw CSV
    Download,
    /// Clean the raw CSV and summarise the result
    Preprocess(PreprocessCommand),
    /// Train both models and print the comparison table
    Train(TrainCommand),
    /// Record a logistic regression run and a random forest run
    Track,
    /// Train the production model and replace PRODUCTION_MODEL_DIR
    Package,
    /// Score one patient record with a stored model
    Predict(PredictCommand),
    /// Download, preprocess, train, track and package in one go
    Pipeline(PipelineCommand),
}

#[derive(Args)]
struct PreprocessCommand {
    /// Write the cleaned table (with header) to this path
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Number of cleaned rows to print
    #[arg(long, default_value_t = 5)]
    head: usize,
}

#[derive(Args)]
struct TrainCommand {
    /// Skip the random forest grid search and use RF_* settings
    #[arg(long)]
    no_grid_search: bool,

    /// Write the comparison table as CSV to this path
    #[arg(long, value_name = "PATH")]
    comparison_csv: Option<PathBuf>,
}

#[derive(Args)]
struct PredictCommand {
    /// Model locator; resolved like the service does when omitted
    #[arg(long)]
    model: Option<String>,

    /// Patient record as inline JSON
    #[arg(long, conflicts_with = "input")]
    json: Option<String>,

    /// Path to a JSON file holding the patient record
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
}

#[derive(Args)]
struct PipelineCommand {
    /// Reuse the existing raw CSV instead of downloading
    #[arg(long)]
    skip_download: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load settings")?;
    if let Some(dir) = cli.data_dir {
        settings.data.dir = dir;
    }
    if let Some(dir) = cli.mlruns_dir {
        settings.tracking.mlruns_dir = dir;
    }
    init_logging(&settings.logging).context("failed to initialise logging")?;

    match cli.command {
        Commands::Config => handle_config(&settings),
        Commands::Download => handle_download(&settings).await,
        Commands::Preprocess(cmd) => handle_preprocess(cmd, &settings),
        Commands::Train(cmd) => handle_train(cmd, &settings).map(|_| ()),
        Commands::Track => handle_track(&settings).map(|_| ()),
        Commands::Package => handle_package(&settings),
        Commands::Predict(cmd) => handle_predict(cmd, &settings),
        Commands::Pipeline(cmd) => handle_pipeline(cmd, &settings).await,
    }
}

fn handle_config(settings: &Settings) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    Ok(())
}

async fn handle_download(settings: &Settings) -> Result<()> {
    let csv = download_dataset(&settings.data)
        .await
        .with_context(|| format!("failed to download dataset from {}", settings.data.url))?;
    println!("Raw dataset written to {}", csv.display());
    Ok(())
}

fn load_clean(settings: &Settings) -> Result<CleanTable> {
    let path = settings.data.csv_path();
    let raw = RawTable::from_path(&path)
        .with_context(|| format!("failed to read raw dataset {}", path.display()))?;
    let clean = clean_dataset(&raw).context("failed to clean dataset")?;
    info!(raw_rows = raw.len(), clean_rows = clean.len(), "dataset cleaned");
    Ok(clean)
}

fn handle_preprocess(cmd: PreprocessCommand, settings: &Settings) -> Result<()> {
    let clean = load_clean(settings)?;
    let targets = clean.targets();
    let positives = targets.iter().filter(|&&t| t == 1).count();

    println!(
        "{} rows, {} columns, {} positive / {} negative",
        clean.len(),
        clean.columns().len(),
        positives,
        targets.len() - positives
    );
    println!("{}", clean.columns().join(","));
    for row in clean.rows.iter().take(cmd.head) {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", cells.join(","));
    }

    if let Some(output) = cmd.output {
        clean
            .write_csv(&output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("Cleaned dataset written to {}", output.display());
    }
    Ok(())
}

fn handle_train(cmd: TrainCommand, settings: &Settings) -> Result<TrainingReport> {
    let dataset = heartwise_trainer::Dataset::from_raw_csv(settings.data.csv_path())
        .context("failed to load training data")?;
    let mut config = TrainerConfig::from_settings(&settings.model);
    if cmd.no_grid_search {
        config.grid_search = false;
    }
    let report = heartwise_trainer::train_models(&dataset, &config).context("training failed")?;

    println!("{}", report.comparison_table);
    println!(
        "Best random forest: n_estimators={} max_depth={} min_samples_split={}",
        report.best_params.n_estimators,
        report
            .best_params
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string()),
        report.best_params.min_samples_split
    );
    if let Some(path) = cmd.comparison_csv {
        let file = fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        report.comparison_table.write_csv(file)?;
        println!("Comparison table written to {}", path.display());
    }
    Ok(report)
}

fn handle_track(settings: &Settings) -> Result<ExperimentOutcome> {
    let outcome = run_experiment(settings).context("experiment failed")?;
    println!("Logistic regression run: {}", outcome.log_reg_run_id);
    println!("Random forest run:       {}", outcome.random_forest_run_id);
    println!("Model URI: {}", outcome.model_uri);
    Ok(outcome)
}

fn handle_package(settings: &Settings) -> Result<()> {
    let saved = save_final_model(settings).context("packaging failed")?;
    println!(
        "Production model saved to {} (blake3 {})",
        saved.model_path.display(),
        saved.hash
    );
    Ok(())
}

fn handle_predict(cmd: PredictCommand, settings: &Settings) -> Result<()> {
    let raw = match (cmd.json, cmd.input) {
        (Some(json), _) => json,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("provide a patient record with --json or --input"),
    };
    let value: Value = serde_json::from_str(&raw).context("patient record is not valid JSON")?;
    let record: PatientRecord =
        serde_json::from_value(value).context("patient record has missing or invalid fields")?;

    let (service, source) = InferenceService::from_settings(cmd.model.as_deref(), settings)
        .context("could not determine a model to use")?;
    info!(locator = service.locator(), %source, "model selected");

    let result = service.predict_single(&record)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn handle_pipeline(cmd: PipelineCommand, settings: &Settings) -> Result<()> {
    if cmd.skip_download {
        info!("skipping download");
    } else {
        handle_download(settings).await?;
    }
    handle_preprocess(
        PreprocessCommand {
            output: None,
            head: 5,
        },
        settings,
    )?;
    handle_train(
        TrainCommand {
            no_grid_search: false,
            comparison_csv: None,
        },
        settings,
    )?;
    handle_track(settings)?;
    handle_package(settings)?;
    println!("Pipeline finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_rejects_two_record_sources() {
        let parsed = Cli::try_parse_from([
            "heartwise", "predict", "--json", "{}", "--input", "record.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_overrides_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["heartwise", "track", "--mlruns-dir", "/tmp/runs"]).unwrap();
        assert!(matches!(cli.command, Commands::Track));
        assert_eq!(cli.mlruns_dir, Some(PathBuf::from("/tmp/runs")));
    }
}
