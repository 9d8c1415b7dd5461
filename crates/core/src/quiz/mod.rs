#![allow(missing_docs)]

//! Question generation, history tracking and the session controller.

pub mod generator;
pub mod history;
mod session;

pub use generator::{ensure_playable, generate};
pub use history::{QuestionHistory, MAX_HISTORY};
pub use session::{QuizSession, SessionConfig};
