use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tuner_core::TunerApp;
use tuner_core::exporters::read_jsonl;
use tuner_core::services::{Diagnostics, GeminiGenerator, TextGenerator};
use tuner_core::settings::{SettingsJsonRepository, SettingsRepository, TunerSettings};

mod app;
mod ui;

use app::TuiApp;

const APP_DIR: &str = "tuner-lab";
const DIAGNOSTICS_CAPACITY: usize = 200;

/// Interactive fine-tuning walkthrough in the terminal.
#[derive(Debug, Parser)]
#[command(name = "tuner-lab", version)]
struct Cli {
    /// Gemini API key. Without one the playground reports an error per message.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier for base and tuned responses.
    #[arg(long)]
    model: Option<String>,

    /// Milliseconds between simulated training epochs.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Load the example set from a JSONL file instead of the built-in samples.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Where Ctrl+E writes the example set.
    #[arg(long, default_value = "tuning-dataset.jsonl")]
    export: PathBuf,

    /// Log file; defaults to the platform data directory.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Persist --model and --tick-ms to the settings file.
    #[arg(long)]
    save_settings: bool,
}

fn init_logging(log_file: Option<PathBuf>, diagnostics: &Diagnostics) -> Result<PathBuf> {
    let path = match log_file {
        Some(path) => path,
        None => dirs::data_local_dir()
            .context("Cannot determine data directory")?
            .join(APP_DIR)
            .join("tuner-lab.log"),
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    // Stdout belongs to the terminal UI, so fmt output goes to the file.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(diagnostics.layer())
        .init();

    Ok(path)
}

async fn load_settings(cli: &Cli) -> Result<TunerSettings> {
    let repository = SettingsJsonRepository::new()?;

    let mut settings = match repository.load().await {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = ?e, path = %repository.storage_path(), "Failed to load settings, using defaults");
            TunerSettings::default()
        }
    };

    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if let Some(tick_ms) = cli.tick_ms {
        settings.tick_interval_ms = tick_ms;
    }

    if cli.save_settings {
        repository
            .save(settings.clone())
            .await
            .context("Failed to save settings")?;
        info!(path = %repository.storage_path(), "Settings saved");
    }

    settings.api_key = cli.api_key.clone();

    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let diagnostics = Diagnostics::new(DIAGNOSTICS_CAPACITY);
    let log_path = init_logging(cli.log_file.clone(), &diagnostics)?;
    info!(log = %log_path.display(), "Starting tuner-lab");

    let settings = load_settings(&cli).await?;

    let (tick_tx, tick_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let mut core = TunerApp::with_timer(tick_tx, settings.tick_interval());
    if let Some(path) = &cli.dataset {
        let examples = read_jsonl(path)
            .await
            .with_context(|| format!("Failed to load dataset {}", path.display()))?;
        core.examples_mut().replace_all(examples);
    }

    // clap already read GEMINI_API_KEY; from_env adds the API_KEY fallback.
    let generator = match settings.api_key.clone() {
        Some(key) => GeminiGenerator::new(Some(key), settings.model.clone()),
        None => GeminiGenerator::from_env(settings.model.clone()),
    };
    let has_api_key = generator.has_api_key();
    if !has_api_key {
        warn!("No API key configured; playground requests will fail");
    }
    let generator: Arc<dyn TextGenerator> = Arc::new(generator);

    let mut app = TuiApp::new(
        core,
        generator,
        diagnostics,
        cli.export,
        has_api_key,
        event_tx,
    );

    let mut terminal = ratatui::init();
    let result = app::run(&mut terminal, &mut app, tick_rx, event_rx).await;
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = ?e, "Event loop failed");
    }
    info!("Shutting down");
    result
}
