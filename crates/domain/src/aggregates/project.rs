//! Project aggregate - the dialogues and characters of one editing session

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::aggregates::Dialogue;
use crate::entities::{Character, DialogueNode};
use crate::error::DomainError;
use crate::ids::{CharacterId, DialogueId, NodeId};
use crate::value_objects::JumpTarget;

const DIALOGUE: &str = "Dialogue";
const CHARACTER: &str = "Character";

/// File extension used for dialogues created through the registry.
pub const DIALOGUE_EXTENSION: &str = "yaml";

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root_path: PathBuf,
    dialogues: IndexMap<DialogueId, Dialogue>,
    characters: IndexMap<CharacterId, Character>,
}

impl Project {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            dialogues: IndexMap::new(),
            characters: IndexMap::new(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    // =========================================================================
    // Dialogues
    // =========================================================================

    pub fn dialogue(&self, id: &str) -> Option<&Dialogue> {
        self.dialogues.get(id)
    }

    pub fn dialogue_mut(&mut self, id: &str) -> Option<&mut Dialogue> {
        self.dialogues.get_mut(id)
    }

    pub fn dialogues(&self) -> impl Iterator<Item = &Dialogue> {
        self.dialogues.values()
    }

    pub fn dialogues_mut(&mut self) -> impl Iterator<Item = &mut Dialogue> {
        self.dialogues.values_mut()
    }

    /// Dialogues with unsaved changes.
    pub fn modified_dialogues(&self) -> impl Iterator<Item = &Dialogue> {
        self.dialogues.values().filter(|d| d.is_modified())
    }

    pub fn add_dialogue(&mut self, dialogue: Dialogue) -> Result<(), DomainError> {
        if self.dialogues.contains_key(dialogue.id()) {
            return Err(DomainError::duplicate_id(DIALOGUE, dialogue.id().as_str()));
        }
        self.dialogues.insert(dialogue.id().clone(), dialogue);
        Ok(())
    }

    /// Create an empty dialogue saved as `<root>/<id>.yaml`.
    ///
    /// The new dialogue counts as modified until it is first saved.
    pub fn create_dialogue(
        &mut self,
        id: &str,
        title: impl Into<String>,
    ) -> Result<&mut Dialogue, DomainError> {
        let id = DialogueId::new(id)?;
        if self.dialogues.contains_key(&id) {
            return Err(DomainError::duplicate_id(DIALOGUE, id.as_str()));
        }
        let path = self
            .root_path
            .join(format!("{}.{}", id, DIALOGUE_EXTENSION));
        let mut dialogue = Dialogue::new(id.clone(), title).with_file_path(path);
        dialogue.mark_modified();
        Ok(self.dialogues.entry(id).or_insert(dialogue))
    }

    /// Remove a dialogue from the registry. Its file is left on disk.
    pub fn remove_dialogue(&mut self, id: &str) -> Result<Dialogue, DomainError> {
        self.dialogues
            .shift_remove(id)
            .ok_or_else(|| DomainError::not_found(DIALOGUE, id))
    }

    /// Rename a node and rewrite references to it everywhere in the project,
    /// including cross-dialogue jumps from other dialogues.
    pub fn rename_node(
        &mut self,
        dialogue_id: &str,
        old: &str,
        new: &str,
    ) -> Result<usize, DomainError> {
        let dialogue = self
            .dialogues
            .get_mut(dialogue_id)
            .ok_or_else(|| DomainError::not_found(DIALOGUE, dialogue_id))?;
        let old_id = NodeId::new(old)?;
        let mut rewritten = dialogue.rename_node(old, new)?;
        let new_id = NodeId::new(new)?;
        let owner = dialogue.id().clone();

        for other in self.dialogues.values_mut() {
            if other.id() != &owner {
                rewritten += other.rename_external_refs(&owner, &old_id, &new_id);
            }
        }
        Ok(rewritten)
    }

    /// Find the node a `dialogue/node` jump target names.
    pub fn resolve_jump(&self, target: JumpTarget<'_>) -> Option<&DialogueNode> {
        match target {
            JumpTarget::External { dialogue, node } => self.dialogues.get(dialogue)?.get_node(node),
            JumpTarget::Local(_) => None,
        }
    }

    // =========================================================================
    // Characters
    // =========================================================================

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn has_character(&self, id: &str) -> bool {
        self.characters.contains_key(id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn add_character(&mut self, character: Character) -> Result<(), DomainError> {
        if self.characters.contains_key(character.id()) {
            return Err(DomainError::duplicate_id(CHARACTER, character.id().as_str()));
        }
        self.characters.insert(character.id().clone(), character);
        Ok(())
    }

    /// Insert or replace a character, keeping its original position.
    pub fn upsert_character(&mut self, character: Character) -> Option<Character> {
        self.characters.insert(character.id().clone(), character)
    }

    /// Remove a character. Nodes naming it as speaker are left alone.
    pub fn remove_character(&mut self, id: &str) -> Result<Character, DomainError> {
        self.characters
            .shift_remove(id)
            .ok_or_else(|| DomainError::not_found(CHARACTER, id))
    }
}
