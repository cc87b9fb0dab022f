//! Aggregates - consistency boundaries for dialogue editing

mod dialogue;
mod project;

pub use dialogue::Dialogue;
pub use project::{Project, DIALOGUE_EXTENSION};
