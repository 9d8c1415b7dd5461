//! Shared domain models.

use std::hash::{Hash, Hasher};

use crate::error::QuizError;

/// A single station record from the catalog.
///
/// Stations compare and hash by `name`; names are unique within a catalog.
#[derive(Debug, Clone)]
pub struct Station {
    /// Display name (e.g. `新宿`).
    pub name: String,
    /// Ward the station sits in.
    pub ward: String,
    /// Lines serving the station, in source order.
    pub lines: Vec<String>,
}

impl Station {
    /// Build a station from its parts.
    pub fn new(
        name: impl Into<String>,
        ward: impl Into<String>,
        lines: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            ward: ward.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Lines joined for the hint card.
    pub fn lines_label(&self) -> String {
        self.lines.join(", ")
    }
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Station {}

impl Hash for Station {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// One history entry: a question plus the visibility of its hint cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizState {
    origin: Station,
    destination: Station,
    origin_hint_expanded: bool,
    destination_hint_expanded: bool,
}

impl QuizState {
    /// Build a fresh question with both hints collapsed.
    pub fn new(origin: Station, destination: Station) -> Result<Self, QuizError> {
        if origin == destination {
            return Err(QuizError::SameStation(origin.name));
        }
        Ok(Self {
            origin,
            destination,
            origin_hint_expanded: false,
            destination_hint_expanded: false,
        })
    }

    /// Departure station.
    pub fn origin(&self) -> &Station {
        &self.origin
    }

    /// Arrival station.
    pub fn destination(&self) -> &Station {
        &self.destination
    }

    /// Whether the origin hint card is open.
    pub fn origin_hint_expanded(&self) -> bool {
        self.origin_hint_expanded
    }

    /// Whether the destination hint card is open.
    pub fn destination_hint_expanded(&self) -> bool {
        self.destination_hint_expanded
    }

    pub(crate) fn set_hint_flags(&mut self, origin_expanded: bool, destination_expanded: bool) {
        self.origin_hint_expanded = origin_expanded;
        self.destination_hint_expanded = destination_expanded;
    }

    /// Route request for the map launcher.
    pub fn route(&self) -> RouteRequest {
        RouteRequest {
            origin: self.origin.name.clone(),
            destination: self.destination.name.clone(),
        }
    }
}

/// Plain station names handed to the map launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    /// Origin station name, without qualifier.
    pub origin: String,
    /// Destination station name, without qualifier.
    pub destination: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stations_compare_by_name() {
        let a = Station::new("新宿", "新宿区", ["JR山手線"]);
        let b = Station::new("新宿", "somewhere else", Vec::<String>::new());
        assert_eq!(a, b);
        assert_ne!(a, Station::new("渋谷", "渋谷区", ["JR山手線"]));
    }

    #[test]
    fn quiz_state_rejects_same_station() {
        let a = Station::new("池袋", "豊島区", ["JR山手線"]);
        let err = QuizState::new(a.clone(), a).unwrap_err();
        assert!(matches!(err, QuizError::SameStation(name) if name == "池袋"));
    }

    #[test]
    fn new_state_starts_collapsed() {
        let state = QuizState::new(
            Station::new("新宿", "新宿区", ["JR山手線", "JR中央線"]),
            Station::new("渋谷", "渋谷区", ["JR山手線"]),
        )
        .unwrap();
        assert!(!state.origin_hint_expanded());
        assert!(!state.destination_hint_expanded());
        assert_eq!(state.origin().lines_label(), "JR山手線, JR中央線");
        assert_eq!(
            state.route(),
            RouteRequest {
                origin: "新宿".to_string(),
                destination: "渋谷".to_string(),
            }
        );
    }
}
