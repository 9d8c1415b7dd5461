use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{info, warn};

use super::StationCatalog;
use crate::models::Station;

/// Thread-safe loader that caches the station catalog for a data source.
///
/// A `None` path selects the bundled dataset.
#[derive(Clone)]
pub struct CatalogLoader {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    path: Option<PathBuf>,
    cache: Option<Arc<StationCatalog>>,
}

impl CatalogLoader {
    /// Build a loader for the given station file.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner { path, cache: None })),
        }
    }

    /// Station file currently in use.
    pub fn path(&self) -> Option<PathBuf> {
        self.inner.read().path.clone()
    }

    /// Point the loader at a new data source and drop the cached catalog.
    pub fn refresh(&self, path: Option<PathBuf>) {
        let mut inner = self.inner.write();
        inner.path = path;
        inner.cache = None;
    }

    /// Return the catalog, reading the source on first use.
    pub fn catalog(&self) -> Arc<StationCatalog> {
        if let Some(catalog) = self.inner.read().cache.clone() {
            return catalog;
        }
        let mut inner = self.inner.write();
        if let Some(catalog) = inner.cache.clone() {
            return catalog;
        }
        let catalog = Arc::new(read_source(inner.path.as_deref()));
        inner.cache = Some(catalog.clone());
        catalog
    }

    /// Re-read the data source, replacing the cached catalog.
    pub fn reload(&self) -> Arc<StationCatalog> {
        let mut inner = self.inner.write();
        let catalog = Arc::new(read_source(inner.path.as_deref()));
        inner.cache = Some(catalog.clone());
        catalog
    }
}

fn read_source(path: Option<&Path>) -> StationCatalog {
    let catalog = match path {
        Some(path) => load_catalog(path),
        None => StationCatalog::bundled(),
    };
    info!(
        stations = catalog.len(),
        source = %path.map(|p| p.display().to_string()).unwrap_or_else(|| "bundled".to_string()),
        "Station catalog loaded"
    );
    catalog
}

/// Read a station file, falling back to an empty catalog on any failure.
pub fn load_catalog(path: impl AsRef<Path>) -> StationCatalog {
    let path = path.as_ref();
    match read_catalog(path) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!("Failed to load stations from {}: {err:#}", path.display());
            StationCatalog::empty()
        }
    }
}

fn read_catalog(path: &Path) -> Result<StationCatalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_catalog(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parse station JSON, either `{"stations": [...]}` or a bare array.
///
/// Unknown fields are ignored and records without a name are skipped.
pub fn parse_catalog(contents: &str) -> Result<StationCatalog> {
    let raw: RawStationFile =
        serde_json::from_str(contents).context("invalid station document")?;
    let records = match raw {
        RawStationFile::Wrapped { stations } => stations,
        RawStationFile::Bare(stations) => stations,
    };
    let stations = records.into_iter().filter_map(build_station);
    Ok(StationCatalog::new(stations))
}

fn build_station(raw: RawStation) -> Option<Station> {
    let name = raw
        .name
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let Some(name) = name else {
        warn!("Skipping station record without a name");
        return None;
    };
    Some(Station {
        name,
        ward: raw.ward.map(|value| value.trim().to_string()).unwrap_or_default(),
        lines: raw
            .lines
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStationFile {
    Wrapped {
        #[serde(default)]
        stations: Vec<RawStation>,
    },
    Bare(Vec<RawStation>),
}

#[derive(Debug, Deserialize)]
struct RawStation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ward: Option<String>,
    #[serde(default)]
    lines: Vec<String>,
}
