//! Successor references.
//!
//! A `NodeRef` is the raw text of a successor field. Unlike [`NodeId`] it is
//! not validated: it may be empty, and it may name a node that does not exist
//! (a dangling reference is a validation finding, not a construction error).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DialogueId, NodeId, PATH_SEPARATOR};

/// Raw successor reference as stored in a node field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(String);

impl NodeRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty reference means "no successor" for every node kind.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn points_to(&self, id: &NodeId) -> bool {
        self.0 == id.as_str()
    }

    /// Interpret this reference as a jump target.
    pub fn jump_target(&self) -> JumpTarget<'_> {
        JumpTarget::parse(&self.0)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&NodeId> for NodeRef {
    fn from(value: &NodeId) -> Self {
        Self::new(value.as_str())
    }
}

impl From<NodeId> for NodeRef {
    fn from(value: NodeId) -> Self {
        Self(value.into())
    }
}

/// Where a `jump` node sends the flow.
///
/// # Example
///
/// ```
/// use talegraph_domain::JumpTarget;
///
/// assert_eq!(JumpTarget::parse("outro"), JumpTarget::Local("outro"));
/// assert_eq!(
///     JumpTarget::parse("chapter_2/start"),
///     JumpTarget::External { dialogue: "chapter_2", node: "start" }
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget<'a> {
    /// A node in the same dialogue
    Local(&'a str),
    /// `<dialogue_id>/<node_id>`
    External { dialogue: &'a str, node: &'a str },
}

impl<'a> JumpTarget<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once(PATH_SEPARATOR) {
            Some((dialogue, node)) => Self::External { dialogue, node },
            None => Self::Local(raw),
        }
    }

    /// Format a cross-dialogue reference.
    pub fn external_ref(dialogue: &DialogueId, node: &NodeId) -> NodeRef {
        NodeRef(format!("{}{}{}", dialogue, PATH_SEPARATOR, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_refs_are_empty() {
        assert!(NodeRef::new("").is_empty());
        assert!(NodeRef::new("  ").is_empty());
        assert!(!NodeRef::new("b").is_empty());
    }

    #[test]
    fn external_ref_round_trips_through_parse() {
        let dialogue = DialogueId::new("tavern").unwrap();
        let node = NodeId::new("greet").unwrap();
        let target = JumpTarget::external_ref(&dialogue, &node);

        assert_eq!(target.as_str(), "tavern/greet");
        assert_eq!(
            target.jump_target(),
            JumpTarget::External {
                dialogue: "tavern",
                node: "greet"
            }
        );
    }
}
