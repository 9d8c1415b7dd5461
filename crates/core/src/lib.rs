#![warn(clippy::all, missing_docs)]

//! Core logic for the station route quiz.
//!
//! This crate hosts the station models, catalog loading, question
//! generation, the navigable question history and the session controller
//! used by the terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod quiz;
pub mod route;

pub use catalog::{CatalogLoader, StationCatalog};
pub use config::AppConfig;
pub use error::QuizError;
pub use models::{QuizState, RouteRequest, Station};
pub use quiz::{QuestionHistory, QuizSession, SessionConfig, MAX_HISTORY};
pub use route::{MapLauncher, SystemMapLauncher};
