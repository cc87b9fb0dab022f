//! Text-level conversion between YAML documents and dialogues.

use std::path::Path;

use talegraph_domain::{Character, Dialogue, Project};

use super::documents::{CharacterDocument, CharactersDocument, DialogueDocument};
use crate::infrastructure::ports::CodecError;

/// Parse one dialogue document. `path` becomes the dialogue's file path and
/// supplies the id when the document has none.
pub fn parse_dialogue(text: &str, path: &Path) -> Result<Dialogue, CodecError> {
    let document: DialogueDocument =
        serde_yaml::from_str(text).map_err(|e| CodecError::parse(path, e))?;
    document
        .into_dialogue(path)
        .map_err(|e| CodecError::parse(path, e))
}

/// Render a dialogue back to YAML text.
pub fn render_dialogue(dialogue: &Dialogue) -> Result<String, CodecError> {
    serde_yaml::to_string(&DialogueDocument::from_dialogue(dialogue))
        .map_err(CodecError::serialization)
}

pub fn parse_characters(text: &str, path: &Path) -> Result<Vec<Character>, CodecError> {
    let document: CharactersDocument =
        serde_yaml::from_str(text).map_err(|e| CodecError::parse(path, e))?;
    document
        .characters
        .into_iter()
        .map(|c| c.into_character().map_err(|e| CodecError::parse(path, e)))
        .collect()
}

pub fn render_characters(project: &Project) -> Result<String, CodecError> {
    let document = CharactersDocument {
        characters: project
            .characters()
            .map(CharacterDocument::from_character)
            .collect(),
    };
    serde_yaml::to_string(&document).map_err(CodecError::serialization)
}
