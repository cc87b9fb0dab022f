//! Dialogue aggregate - an ordered graph of nodes
//!
//! # Invariants
//!
//! - Node ids are unique within the dialogue
//! - Node order is insertion order; it is also the save order
//! - `is_modified` is set by every mutation and cleared only by
//!   [`Dialogue::mark_saved`] (successful save or fresh load)
//!
//! Removing a node never rewrites the successor fields of other nodes. The
//! references left dangling are reported by [`crate::validation::validate`].
//! Renaming a node, on the other hand, rewrites every reference to it.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::entities::{DialogueNode, NodeDraft, NodeKind};
use crate::error::DomainError;
use crate::ids::{CharacterId, DialogueId, NodeId};
use crate::value_objects::{Extensions, Position};

const NODE: &str = "DialogueNode";

#[derive(Debug, Clone, PartialEq)]
pub struct Dialogue {
    // Identity
    id: DialogueId,
    title: String,

    // Graph
    nodes: IndexMap<NodeId, DialogueNode>,
    /// Explicit entry node; the first node is the entry when unset
    entry: Option<NodeId>,

    /// Characters known to speak in this dialogue
    characters: Vec<CharacterId>,

    // Persistence
    file_path: Option<PathBuf>,
    is_modified: bool,
    extensions: Extensions,
}

impl Dialogue {
    // =========================================================================
    // Constructor
    // =========================================================================

    pub fn new(id: DialogueId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            nodes: IndexMap::new(),
            entry: None,
            characters: Vec::new(),
            file_path: None,
            is_modified: false,
            extensions: Extensions::new(),
        }
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_characters(mut self, characters: Vec<CharacterId>) -> Self {
        self.characters = characters;
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> &DialogueId {
        &self.id
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn characters(&self) -> &[CharacterId] {
        &self.characters
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    // =========================================================================
    // Node queries
    // =========================================================================

    pub fn get_node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &DialogueNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The explicitly marked entry node, if any.
    pub fn entry(&self) -> Option<&NodeId> {
        self.entry.as_ref()
    }

    /// Where reachability starts: the explicit entry, else the first node.
    pub fn entry_node(&self) -> Option<&DialogueNode> {
        match &self.entry {
            Some(id) => self.nodes.get(id),
            None => self.nodes.values().next(),
        }
    }

    // =========================================================================
    // Mutation Methods
    // =========================================================================

    /// Add a node and return its id.
    ///
    /// A draft without an id gets a fresh `<kind>_<hex>` id. A draft without a
    /// position is placed in the next default slot.
    ///
    /// # Errors
    ///
    /// `DomainError::DuplicateId` if the draft's id is already taken; the
    /// dialogue is left untouched.
    pub fn add_node(&mut self, draft: NodeDraft) -> Result<NodeId, DomainError> {
        let id = match draft.id.clone() {
            Some(id) if self.nodes.contains_key(&id) => {
                return Err(DomainError::duplicate_id(NODE, id.as_str()));
            }
            Some(id) => id,
            None => self.fresh_node_id(draft.kind()),
        };
        let position = draft
            .position
            .unwrap_or_else(|| Position::slot(self.nodes.len()));
        let node = DialogueNode::from_draft(id.clone(), draft, position);
        self.nodes.insert(id.clone(), node);
        self.is_modified = true;
        Ok(id)
    }

    fn fresh_node_id(&self, kind: NodeKind) -> NodeId {
        loop {
            let candidate = NodeId::generate(kind.as_str());
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Remove a node and return it.
    ///
    /// Other nodes keep their references to the removed id. An explicit entry
    /// pointing at it is cleared.
    pub fn remove_node(&mut self, id: &str) -> Result<DialogueNode, DomainError> {
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| DomainError::not_found(NODE, id))?;
        if self.entry.as_ref().is_some_and(|entry| entry.as_str() == id) {
            self.entry = None;
        }
        self.is_modified = true;
        Ok(node)
    }

    /// Edit a node in place. The dialogue is marked modified only if the
    /// edit changed the node.
    pub fn update_node<R>(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut DialogueNode) -> R,
    ) -> Result<R, DomainError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found(NODE, id))?;
        let before = node.clone();
        let result = edit(node);
        if *node != before {
            self.is_modified = true;
        }
        Ok(result)
    }

    pub fn retype_node(&mut self, id: &str, kind: NodeKind) -> Result<(), DomainError> {
        self.update_node(id, |node| node.retype_in_place(kind))
    }

    pub fn set_node_position(&mut self, id: &str, position: Position) -> Result<(), DomainError> {
        self.update_node(id, |node| node.set_position(position))
    }

    /// Rename a node and rewrite every reference to it in this dialogue.
    ///
    /// Covers `next`, choice targets, `then`/`else`, jump targets (bare and
    /// `<this dialogue>/<node>` forms), retained payloads and the explicit
    /// entry. All checks happen before anything changes. Returns the number of
    /// rewritten references.
    pub fn rename_node(&mut self, old: &str, new: &str) -> Result<usize, DomainError> {
        let new_id = NodeId::new(new)?;
        let index = self
            .nodes
            .get_index_of(old)
            .ok_or_else(|| DomainError::not_found(NODE, old))?;
        if new_id.as_str() == old {
            return Ok(0);
        }
        if self.nodes.contains_key(&new_id) {
            return Err(DomainError::duplicate_id(NODE, new_id.as_str()));
        }

        let Some((old_id, mut node)) = self.nodes.shift_remove_index(index) else {
            return Err(DomainError::not_found(NODE, old));
        };
        node.set_id(new_id.clone());
        self.nodes.shift_insert(index, new_id.clone(), node);

        let mut rewritten = 0;
        for node in self.nodes.values_mut() {
            rewritten += node.rename_refs(&old_id, &new_id, &self.id);
        }
        if self.entry.as_ref() == Some(&old_id) {
            self.entry = Some(new_id);
        }
        self.is_modified = true;
        Ok(rewritten)
    }

    /// Rewrite jumps into `dialogue/old` after a node of another dialogue was
    /// renamed.
    pub(crate) fn rename_external_refs(
        &mut self,
        dialogue: &DialogueId,
        old: &NodeId,
        new: &NodeId,
    ) -> usize {
        let mut rewritten = 0;
        for node in self.nodes.values_mut() {
            rewritten += node.rename_external_refs(dialogue, old, new);
        }
        if rewritten > 0 {
            self.is_modified = true;
        }
        rewritten
    }

    /// Mark a node as the entry point, or clear the mark with `None`.
    pub fn set_entry(&mut self, id: Option<&str>) -> Result<(), DomainError> {
        let entry = match id {
            Some(id) => Some(
                self.nodes
                    .get_key_value(id)
                    .map(|(key, _)| key.clone())
                    .ok_or_else(|| DomainError::not_found(NODE, id))?,
            ),
            None => None,
        };
        self.entry = entry;
        self.is_modified = true;
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.is_modified = true;
    }

    /// Returns `false` if the character was already listed.
    pub fn add_character_ref(&mut self, id: CharacterId) -> bool {
        if self.characters.contains(&id) {
            return false;
        }
        self.characters.push(id);
        self.is_modified = true;
        true
    }

    /// Returns `false` if the character was not listed.
    pub fn remove_character_ref(&mut self, id: &str) -> bool {
        let before = self.characters.len();
        self.characters.retain(|c| c.as_str() != id);
        let removed = self.characters.len() != before;
        if removed {
            self.is_modified = true;
        }
        removed
    }

    /// Edit the dialogue-level unknown keys, marking the dialogue modified
    /// only if they changed.
    pub fn update_extensions<R>(&mut self, edit: impl FnOnce(&mut Extensions) -> R) -> R {
        let before = self.extensions.clone();
        let result = edit(&mut self.extensions);
        if self.extensions != before {
            self.is_modified = true;
        }
        result
    }

    // =========================================================================
    // Persistence state
    // =========================================================================

    /// Where the dialogue is saved. Not a content change.
    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        self.file_path = Some(path.into());
    }

    /// Clear the modified flag after a successful save or load.
    pub fn mark_saved(&mut self) {
        self.is_modified = false;
    }

    pub(crate) fn mark_modified(&mut self) {
        self.is_modified = true;
    }
}
