//! Station catalog and its file loader.

/// JSON catalog parsing and cached loading.
pub mod loader;

use std::collections::HashSet;

use tracing::warn;

use crate::models::Station;

pub use loader::{load_catalog, parse_catalog, CatalogLoader};

const BUNDLED_STATIONS: &str = include_str!("../../data/stations.json");

/// Immutable, name-sorted list of stations with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    /// Build a catalog, sorting by name and dropping repeated names.
    ///
    /// The first record for a name wins; later duplicates are logged and skipped.
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for station in stations {
            if seen.insert(station.name.clone()) {
                unique.push(station);
            } else {
                warn!(name = %station.name, "Skipping duplicate station record");
            }
        }
        unique.sort_by(|a, b| a.name.cmp(&b.name));
        Self { stations: unique }
    }

    /// Catalog with no stations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dataset compiled into the crate.
    pub fn bundled() -> Self {
        match parse_catalog(BUNDLED_STATIONS) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(?err, "Bundled station data is unreadable");
                Self::empty()
            }
        }
    }

    /// Number of stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// True when the catalog holds no stations.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// All stations in name order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Iterate stations in name order.
    pub fn iter(&self) -> std::slice::Iter<'_, Station> {
        self.stations.iter()
    }

    /// Station at `index` in name order.
    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    /// Index of the station called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.stations
            .binary_search_by(|station| station.name.as_str().cmp(name))
            .ok()
    }

    /// Station called `name`, if present.
    pub fn find(&self, name: &str) -> Option<&Station> {
        self.position(name).and_then(|index| self.get(index))
    }

    /// True when a station with the same name is present.
    pub fn contains(&self, station: &Station) -> bool {
        self.position(&station.name).is_some()
    }

    /// Case-insensitive substring search over name, ward and lines.
    pub fn matching(&self, query: &str) -> Vec<&Station> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.stations.iter().collect();
        }
        self.stations
            .iter()
            .filter(|station| {
                station.name.to_lowercase().contains(&needle)
                    || station.ward.to_lowercase().contains(&needle)
                    || station
                        .lines
                        .iter()
                        .any(|line| line.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a StationCatalog {
    type Item = &'a Station;
    type IntoIter = std::slice::Iter<'a, Station>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StationCatalog {
        StationCatalog::new([
            Station::new("Shinjuku", "Shinjuku", ["Yamanote", "Chuo"]),
            Station::new("Ikebukuro", "Toshima", ["Yamanote", "Saikyo"]),
            Station::new("Shibuya", "Shibuya", ["Yamanote", "Ginza"]),
            Station::new("Shinjuku", "Duplicate", ["Nowhere"]),
        ])
    }

    #[test]
    fn sorts_and_dedups_by_name() {
        let catalog = sample();
        let names: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Ikebukuro", "Shibuya", "Shinjuku"]);
        assert_eq!(catalog.find("Shinjuku").map(|s| s.ward.as_str()), Some("Shinjuku"));
    }

    #[test]
    fn lookups_use_names() {
        let catalog = sample();
        assert_eq!(catalog.position("Shibuya"), Some(1));
        assert!(catalog.contains(&Station::new("Ikebukuro", "", Vec::<String>::new())));
        assert!(catalog.find("Ueno").is_none());
    }

    #[test]
    fn matching_searches_ward_and_lines() {
        let catalog = sample();
        let by_line: Vec<_> = catalog.matching("ginza").iter().map(|s| s.name.clone()).collect();
        assert_eq!(by_line, ["Shibuya"]);
        let by_ward: Vec<_> = catalog.matching("TOSHIMA").iter().map(|s| s.name.clone()).collect();
        assert_eq!(by_ward, ["Ikebukuro"]);
        assert_eq!(catalog.matching("  ").len(), 3);
    }

    #[test]
    fn bundled_dataset_is_usable() {
        let catalog = StationCatalog::bundled();
        assert!(catalog.len() >= 2);
        assert!(catalog.find("新宿").is_some());
        let names: Vec<_> = catalog.iter().map(|s| s.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
