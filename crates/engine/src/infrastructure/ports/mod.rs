//! Port traits for infrastructure boundaries.
//!
//! The store is the only abstraction in the engine; everything else is a
//! concrete type. It exists so editors and tools can swap the on-disk format
//! (or use an in-memory store in tests) without touching the domain.

mod error;

use std::path::{Path, PathBuf};

use talegraph_domain::{Dialogue, DialogueId, Project};

pub use error::CodecError;

/// A file that could not be loaded. Loading carries on without it.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: CodecError,
}

/// Result of loading a project directory: everything that parsed, plus what
/// did not.
#[derive(Debug)]
pub struct ProjectLoad {
    pub project: Project,
    pub failures: Vec<LoadFailure>,
}

impl ProjectLoad {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Loads and saves projects. All calls are synchronous and run to completion.
pub trait ProjectStore {
    /// Load every dialogue document under `root`.
    ///
    /// Only an unreadable `root` fails the whole call; per-file problems end
    /// up in [`ProjectLoad::failures`].
    fn load_project(&self, root: &Path) -> Result<ProjectLoad, CodecError>;

    /// Write a dialogue to its file path and clear its modified flag.
    fn save_dialogue(&self, dialogue: &mut Dialogue) -> Result<(), CodecError>;

    /// Write the project's character registry.
    fn save_characters(&self, project: &Project) -> Result<(), CodecError>;

    /// Save every modified dialogue that has a file path.
    fn save_modified(&self, project: &mut Project) -> Vec<(DialogueId, Result<(), CodecError>)> {
        project
            .dialogues_mut()
            .filter(|d| d.is_modified() && d.file_path().is_some())
            .map(|d| (d.id().clone(), self.save_dialogue(d)))
            .collect()
    }
}
