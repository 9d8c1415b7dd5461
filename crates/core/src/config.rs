//! Layered application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{quiz::MAX_HISTORY, route::DEFAULT_STATION_SUFFIX};

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "station-quiz";

/// Prefix for environment overrides, e.g. `STATION_QUIZ_SEED=7`.
pub const ENV_PREFIX: &str = "STATION_QUIZ";

const DEFAULT_CONFIG: &str = r#"# Station quiz configuration.

# Station data file. Leave unset to use the bundled dataset.
# stations_path = "/path/to/stations.json"

# Appended to station names in map links.
station_suffix = "駅"

# Fixed random seed for reproducible question sequences.
# seed = 42

# Program used to open map links. Defaults to the platform opener.
# open_command = "firefox"

# Questions kept for back/forward navigation (1-100).
history_limit = 100
"#;

/// Runtime settings for the quiz front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Station JSON file; `None` selects the bundled dataset.
    pub stations_path: Option<PathBuf>,
    /// Qualifier appended to station names in map links.
    pub station_suffix: String,
    /// Seed for the question generator; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Program used to open map links.
    pub open_command: Option<String>,
    /// Questions kept for back/forward navigation.
    pub history_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stations_path: None,
            station_suffix: DEFAULT_STATION_SUFFIX.to_string(),
            seed: None,
            open_command: None,
            history_limit: MAX_HISTORY,
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path` (optional on disk) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .context("invalid configuration values")?;
        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        self.history_limit = self.history_limit.clamp(1, MAX_HISTORY);
        self.open_command = self
            .open_command
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }
}

/// Default location of `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join("config.toml")
}

/// Write the commented default config if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(&config_path())
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
