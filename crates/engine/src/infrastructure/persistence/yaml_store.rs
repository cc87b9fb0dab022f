//! Directory-of-YAML-files project store.
//!
//! A project root holds one `*.yaml` / `*.yml` file per dialogue, plus an
//! optional `characters.yaml` (or `characters.yml`). Subdirectories are not
//! scanned. Saves go through a temporary file in the same directory that is
//! renamed over the target, so a failed write leaves the old file intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use talegraph_domain::{Dialogue, Project};
use tempfile::NamedTempFile;

use super::codec::{parse_characters, parse_dialogue, render_characters, render_dialogue};
use crate::infrastructure::ports::{CodecError, LoadFailure, ProjectLoad, ProjectStore};

/// Character registry file name, relative to the project root.
pub const CHARACTERS_FILE: &str = "characters.yaml";

/// Any YAML file with this stem is the character registry, never a dialogue.
const CHARACTERS_STEM: &str = "characters";

/// Documents larger than this are refused unless configured otherwise.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct YamlProjectStore {
    max_document_bytes: u64,
}

impl Default for YamlProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl YamlProjectStore {
    pub fn new() -> Self {
        Self {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    pub fn with_max_document_bytes(mut self, limit: u64) -> Self {
        self.max_document_bytes = limit;
        self
    }

    pub fn max_document_bytes(&self) -> u64 {
        self.max_document_bytes
    }

    /// Read a whole document, refusing anything over the size limit.
    fn read_document(&self, path: &Path) -> Result<String, CodecError> {
        let size = fs::metadata(path)
            .map_err(|e| CodecError::io(path, e))?
            .len();
        if size > self.max_document_bytes {
            return Err(CodecError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_document_bytes,
            });
        }
        fs::read_to_string(path).map_err(|e| CodecError::io(path, e))
    }

    /// Dialogue files directly under `root`, sorted by name.
    fn dialogue_files(root: &Path) -> Result<Vec<PathBuf>, CodecError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(root).map_err(|e| CodecError::io(root, e))? {
            let path = entry.map_err(|e| CodecError::io(root, e))?.path();
            let is_registry = path.file_stem().is_some_and(|stem| stem == CHARACTERS_STEM);
            if path.is_file() && is_yaml(&path) && !is_registry {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn load_dialogue(&self, path: &Path) -> Result<Dialogue, CodecError> {
        let text = self.read_document(path)?;
        parse_dialogue(&text, path)
    }

    fn load_characters(&self, project: &mut Project, failures: &mut Vec<LoadFailure>) {
        let path = characters_path(project.root_path());
        if !path.is_file() {
            return;
        }
        let characters = match self
            .read_document(&path)
            .and_then(|text| parse_characters(&text, &path))
        {
            Ok(characters) => characters,
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "Failed to load characters");
                failures.push(LoadFailure { path, error });
                return;
            }
        };
        for character in characters {
            if let Err(e) = project.add_character(character) {
                tracing::warn!(path = %path.display(), error = %e, "Skipping character");
                failures.push(LoadFailure {
                    path: path.clone(),
                    error: e.into(),
                });
            }
        }
    }
}

impl ProjectStore for YamlProjectStore {
    fn load_project(&self, root: &Path) -> Result<ProjectLoad, CodecError> {
        let files = Self::dialogue_files(root)?;
        let mut project = Project::new(root);
        let mut failures = Vec::new();

        self.load_characters(&mut project, &mut failures);

        for path in files {
            let result = self
                .load_dialogue(&path)
                .and_then(|dialogue| project.add_dialogue(dialogue).map_err(CodecError::from));
            match result {
                Ok(()) => tracing::debug!(path = %path.display(), "Loaded dialogue"),
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "Failed to load dialogue");
                    failures.push(LoadFailure { path, error });
                }
            }
        }

        tracing::info!(
            root = %root.display(),
            dialogues = project.dialogues().count(),
            characters = project.characters().count(),
            failures = failures.len(),
            "Loaded project"
        );
        Ok(ProjectLoad { project, failures })
    }

    fn save_dialogue(&self, dialogue: &mut Dialogue) -> Result<(), CodecError> {
        let path = dialogue
            .file_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| CodecError::MissingFilePath(dialogue.id().to_string()))?;
        let text = render_dialogue(dialogue)?;
        write_atomically(&path, &text)?;
        dialogue.mark_saved();
        tracing::info!(dialogue = %dialogue.id(), path = %path.display(), "Saved dialogue");
        Ok(())
    }

    fn save_characters(&self, project: &Project) -> Result<(), CodecError> {
        let path = characters_path(project.root_path());
        let text = render_characters(project)?;
        write_atomically(&path, &text)?;
        tracing::info!(path = %path.display(), "Saved characters");
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// The registry file in use under `root`: `characters.yaml`, else an existing
/// `characters.yml`. A root with neither gets `characters.yaml`.
fn characters_path(root: &Path) -> PathBuf {
    let preferred = root.join(CHARACTERS_FILE);
    let fallback = root.join(CHARACTERS_STEM).with_extension("yml");
    if !preferred.is_file() && fallback.is_file() {
        return fallback;
    }
    if preferred.is_file() && fallback.is_file() {
        tracing::warn!(ignored = %fallback.display(), "Both characters.yaml and characters.yml exist");
    }
    preferred
}

fn write_atomically(path: &Path, text: &str) -> Result<(), CodecError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CodecError::io(path, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| CodecError::io(path, e))?;
    tmp.persist(path).map_err(|e| CodecError::io(path, e.error))?;
    Ok(())
}
