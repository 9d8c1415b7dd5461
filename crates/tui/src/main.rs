mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use station_quiz_core::{
    config::{self, AppConfig},
    CatalogLoader, SystemMapLauncher,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    tracing::info!(?config, "Configuration loaded");

    let loader = CatalogLoader::new(config.stations_path.clone());
    let launcher = SystemMapLauncher::new(config.station_suffix.clone(), config.open_command.clone());

    let mut app = app::QuizApp::new(loader, config, Box::new(launcher));
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("station-quiz.log");

    let env_filter = EnvFilter::from_default_env();

    // File only; stdout belongs to the alternate screen.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
