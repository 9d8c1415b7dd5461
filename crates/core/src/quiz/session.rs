use std::sync::Arc;

use rand::Rng;
use tracing::info;

use super::{
    generator::{ensure_playable, generate},
    history::{QuestionHistory, MAX_HISTORY},
};
use crate::{
    catalog::StationCatalog,
    error::QuizError,
    models::{QuizState, RouteRequest, Station},
};

/// Generation policy for a running session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Keep the origin fixed and only re-draw destinations.
    pub fixed_origin: bool,
}

/// Turns user intents into question generation and history moves.
///
/// Each session owns its history, policy and random source; the catalog is a
/// shared read-only snapshot.
pub struct QuizSession<R> {
    catalog: Arc<StationCatalog>,
    history: QuestionHistory,
    config: SessionConfig,
    rng: R,
}

impl<R: Rng> QuizSession<R> {
    /// Start a free-mode session with the default history bound.
    pub fn new(catalog: Arc<StationCatalog>, rng: R) -> Result<Self, QuizError> {
        Self::with_history_limit(catalog, rng, MAX_HISTORY)
    }

    /// Start a free-mode session retaining at most `limit` questions.
    pub fn with_history_limit(
        catalog: Arc<StationCatalog>,
        mut rng: R,
        limit: usize,
    ) -> Result<Self, QuizError> {
        ensure_playable(&catalog)?;
        let placeholder = catalog
            .get(0)
            .cloned()
            .ok_or(QuizError::InsufficientData { available: 0 })?;
        let first = generate(&catalog, &placeholder, false, &mut rng)?;
        info!(stations = catalog.len(), "Quiz session started");
        Ok(Self {
            catalog,
            history: QuestionHistory::with_limit(first, limit),
            config: SessionConfig::default(),
            rng,
        })
    }

    pub fn current_question(&self) -> &QuizState {
        self.history.current()
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn is_fixed_origin(&self) -> bool {
        self.config.fixed_origin
    }

    pub fn catalog(&self) -> &Arc<StationCatalog> {
        &self.catalog
    }

    pub fn history(&self) -> &QuestionHistory {
        &self.history
    }

    pub fn can_go_back(&self) -> bool {
        self.history.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.history.can_go_forward()
    }

    /// One-based position of the current question and the history length.
    pub fn position(&self) -> (usize, usize) {
        (self.history.cursor() + 1, self.history.len())
    }

    /// Generate the next question under the current policy and record it.
    pub fn advance(&mut self) -> Result<&QuizState, QuizError> {
        let origin = self.history.current().origin().clone();
        let next = generate(&self.catalog, &origin, self.config.fixed_origin, &mut self.rng)?;
        Ok(self.history.append(next))
    }

    pub fn go_back(&mut self) -> &QuizState {
        self.history.go_back()
    }

    pub fn go_forward(&mut self) -> &QuizState {
        self.history.go_forward()
    }

    /// Switch the generation policy, starting a new history.
    ///
    /// Enabling pins the origin of the question on screen. Calling with the
    /// active mode leaves the session untouched.
    pub fn toggle_fixed_origin(&mut self, enabled: bool) -> Result<&QuizState, QuizError> {
        if enabled == self.config.fixed_origin {
            return Ok(self.history.current());
        }
        let origin = self.history.current().origin().clone();
        let fresh = generate(&self.catalog, &origin, enabled, &mut self.rng)?;
        self.config.fixed_origin = enabled;
        self.history.reset(fresh);
        info!(fixed_origin = enabled, "Origin mode changed");
        Ok(self.history.current())
    }

    /// Pin `station` as the origin and start a new history from it.
    pub fn select_origin(&mut self, station: &Station) -> Result<&QuizState, QuizError> {
        if !self.config.fixed_origin {
            return Err(QuizError::InvalidOperation(
                "origin can only be selected in fixed-origin mode".to_string(),
            ));
        }
        let Some(origin) = self.catalog.find(&station.name).cloned() else {
            return Err(QuizError::InvalidOperation(format!(
                "station {} is not in the catalog",
                station.name
            )));
        };
        let fresh = generate(&self.catalog, &origin, true, &mut self.rng)?;
        self.history.reset(fresh);
        info!(origin = %origin.name, "Origin selected");
        Ok(self.history.current())
    }

    pub fn set_origin_hint_expanded(&mut self, expanded: bool) {
        let destination = self.history.current().destination_hint_expanded();
        self.history.update_current_hint_flags(expanded, destination);
    }

    pub fn set_destination_hint_expanded(&mut self, expanded: bool) {
        let origin = self.history.current().origin_hint_expanded();
        self.history.update_current_hint_flags(origin, expanded);
    }

    /// Flip the origin hint card; returns the new visibility.
    pub fn toggle_origin_hint(&mut self) -> bool {
        let expanded = !self.history.current().origin_hint_expanded();
        self.set_origin_hint_expanded(expanded);
        expanded
    }

    /// Flip the destination hint card; returns the new visibility.
    pub fn toggle_destination_hint(&mut self) -> bool {
        let expanded = !self.history.current().destination_hint_expanded();
        self.set_destination_hint_expanded(expanded);
        expanded
    }

    /// Route for the question on screen, for the map launcher.
    pub fn open_route(&self) -> RouteRequest {
        self.history.current().route()
    }
}
