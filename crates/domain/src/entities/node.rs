//! Dialogue nodes - the closed set of node kinds and their payloads
//!
//! Each node carries exactly one active [`NodePayload`]. Payloads of kinds the
//! node used to have are kept in `retained`, so an author can switch a `say`
//! node to `choice` and back without losing the line they wrote.
//!
//! # Retype policy
//!
//! [`DialogueNode::retype`] moves the active payload into `retained` and then:
//! - restores the retained payload of the target kind when there is one, or
//! - builds a default payload of the target kind, carrying over `next` when
//!   both kinds have a single `next` successor (`say`, `set`, `signal`).
//!
//! Retained payloads are inert: [`DialogueNode::successors`], validation and
//! [`NodePayload::summary`] only ever look at the active payload.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DialogueId, NodeId};
use crate::value_objects::{Extensions, JumpTarget, NodeRef, Position, VariableValue};

/// Kind tag of a node, as written in dialogue documents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Say,
    Choice,
    Set,
    If,
    Jump,
    End,
    Signal,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Say,
        NodeKind::Choice,
        NodeKind::Set,
        NodeKind::If,
        NodeKind::Jump,
        NodeKind::End,
        NodeKind::Signal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::Choice => "choice",
            Self::Set => "set",
            Self::If => "if",
            Self::Jump => "jump",
            Self::End => "end",
            Self::Signal => "signal",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown node type: '{0}'")]
pub struct UnknownNodeKind(pub String);

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| UnknownNodeKind(s.to_string()))
    }
}

/// One selectable option of a `choice` node.
///
/// Options are identified by their position in the list; duplicate text is legal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceOption {
    pub text: String,
    pub next: Option<NodeRef>,
    pub extensions: Extensions,
}

impl ChoiceOption {
    pub fn new(text: impl Into<String>, next: impl Into<NodeRef>) -> Self {
        Self {
            text: text.into(),
            next: Some(next.into()),
            extensions: Extensions::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SayNode {
    /// Character id; empty means unspecified
    pub speaker: String,
    pub text: String,
    pub next: Option<NodeRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceNode {
    pub choices: Vec<ChoiceOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetNode {
    pub assignments: IndexMap<String, VariableValue>,
    pub next: Option<NodeRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IfNode {
    /// Expression text, never evaluated here
    pub condition: String,
    pub then_node: Option<NodeRef>,
    pub else_node: Option<NodeRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpNode {
    /// `node` or `dialogue/node`
    pub jump_target: Option<NodeRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndNode {
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalNode {
    pub signal_name: String,
    pub next: Option<NodeRef>,
}

/// Kind-specific data of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    Say(SayNode),
    Choice(ChoiceNode),
    Set(SetNode),
    If(IfNode),
    Jump(JumpNode),
    End(EndNode),
    Signal(SignalNode),
}

impl NodePayload {
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Say => Self::Say(SayNode::default()),
            NodeKind::Choice => Self::Choice(ChoiceNode::default()),
            NodeKind::Set => Self::Set(SetNode::default()),
            NodeKind::If => Self::If(IfNode::default()),
            NodeKind::Jump => Self::Jump(JumpNode::default()),
            NodeKind::End => Self::End(EndNode::default()),
            NodeKind::Signal => Self::Signal(SignalNode::default()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Say(_) => NodeKind::Say,
            Self::Choice(_) => NodeKind::Choice,
            Self::Set(_) => NodeKind::Set,
            Self::If(_) => NodeKind::If,
            Self::Jump(_) => NodeKind::Jump,
            Self::End(_) => NodeKind::End,
            Self::Signal(_) => NodeKind::Signal,
        }
    }

    /// Every outgoing branch slot in field order, set or not.
    ///
    /// A slot holding an empty reference counts as unset.
    pub fn branches(&self) -> Vec<Option<&NodeRef>> {
        let slots: Vec<Option<&NodeRef>> = match self {
            Self::Say(node) => vec![node.next.as_ref()],
            Self::Choice(node) => node.choices.iter().map(|c| c.next.as_ref()).collect(),
            Self::Set(node) => vec![node.next.as_ref()],
            Self::If(node) => vec![node.then_node.as_ref(), node.else_node.as_ref()],
            Self::Jump(node) => vec![node.jump_target.as_ref()],
            Self::End(_) => Vec::new(),
            Self::Signal(node) => vec![node.next.as_ref()],
        };
        slots
            .into_iter()
            .map(|slot| slot.filter(|r| !r.is_empty()))
            .collect()
    }

    /// Distinct non-empty successor references, in branch order.
    pub fn successors(&self) -> Vec<&NodeRef> {
        let mut out: Vec<&NodeRef> = Vec::new();
        for target in self.branches().into_iter().flatten() {
            if !out.contains(&target) {
                out.push(target);
            }
        }
        out
    }

    /// The single `next` field of `say`, `set` and `signal` payloads.
    pub fn next(&self) -> Option<&Option<NodeRef>> {
        match self {
            Self::Say(node) => Some(&node.next),
            Self::Set(node) => Some(&node.next),
            Self::Signal(node) => Some(&node.next),
            _ => None,
        }
    }

    fn next_mut(&mut self) -> Option<&mut Option<NodeRef>> {
        match self {
            Self::Say(node) => Some(&mut node.next),
            Self::Set(node) => Some(&mut node.next),
            Self::Signal(node) => Some(&mut node.next),
            _ => None,
        }
    }

    fn refs_mut(&mut self) -> Vec<&mut NodeRef> {
        match self {
            Self::Say(node) => node.next.iter_mut().collect(),
            Self::Choice(node) => node
                .choices
                .iter_mut()
                .filter_map(|c| c.next.as_mut())
                .collect(),
            Self::Set(node) => node.next.iter_mut().collect(),
            Self::If(node) => node
                .then_node
                .iter_mut()
                .chain(node.else_node.iter_mut())
                .collect(),
            Self::Jump(node) => node.jump_target.iter_mut().collect(),
            Self::End(_) => Vec::new(),
            Self::Signal(node) => node.next.iter_mut().collect(),
        }
    }

    /// Point every reference to `old` at `new` instead. Returns how many
    /// fields changed.
    ///
    /// `jump` payloads also match the `dialogue/old` form for their own
    /// dialogue.
    pub(crate) fn rename_refs(&mut self, old: &NodeId, new: &NodeId, dialogue: &DialogueId) -> usize {
        let is_jump = matches!(self, Self::Jump(_));
        let mut changed = 0;
        for target in self.refs_mut() {
            if target.points_to(old) {
                *target = NodeRef::from(new);
                changed += 1;
            } else if is_jump
                && target.jump_target()
                    == (JumpTarget::External {
                        dialogue: dialogue.as_str(),
                        node: old.as_str(),
                    })
            {
                *target = JumpTarget::external_ref(dialogue, new);
                changed += 1;
            }
        }
        changed
    }

    /// Rewrite jumps into `dialogue/old` to `dialogue/new`; used for jumps
    /// living in other dialogues.
    pub(crate) fn rename_external_refs(
        &mut self,
        dialogue: &DialogueId,
        old: &NodeId,
        new: &NodeId,
    ) -> usize {
        let Self::Jump(node) = self else {
            return 0;
        };
        match node.jump_target.as_mut() {
            Some(target)
                if target.jump_target()
                    == (JumpTarget::External {
                        dialogue: dialogue.as_str(),
                        node: old.as_str(),
                    }) =>
            {
                *target = JumpTarget::external_ref(dialogue, new);
                1
            }
            _ => 0,
        }
    }

    /// Speaker of a `say` payload, if one is set.
    pub fn speaker(&self) -> Option<&str> {
        match self {
            Self::Say(node) if !node.speaker.trim().is_empty() => Some(node.speaker.as_str()),
            _ => None,
        }
    }

    /// One-line preview for node lists and canvases.
    pub fn summary(&self) -> String {
        match self {
            Self::Say(node) => {
                let speaker = if node.speaker.is_empty() {
                    "???"
                } else {
                    node.speaker.as_str()
                };
                format!("{}: {}", speaker, truncate(&node.text, 50))
            }
            Self::Choice(node) => format!("{} choices", node.choices.len()),
            Self::Set(node) => node
                .assignments
                .iter()
                .take(2)
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(", "),
            Self::If(node) => format!("if {}", node.condition),
            Self::Jump(node) => format!(
                "-> {}",
                node.jump_target.as_ref().map(NodeRef::as_str).unwrap_or("")
            ),
            Self::End(node) => match node.outcome.as_deref() {
                Some(outcome) if !outcome.is_empty() => format!("END: {}", outcome),
                _ => "END".to_string(),
            },
            Self::Signal(node) => format!("signal: {}", node.signal_name),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// A node of a dialogue graph.
///
/// The id is fixed at creation. Renaming goes through
/// [`crate::aggregates::Dialogue::rename_node`] so references stay intact.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueNode {
    id: NodeId,
    payload: NodePayload,
    retained: BTreeMap<NodeKind, NodePayload>,
    position: Position,
    extensions: Extensions,
}

impl DialogueNode {
    pub(crate) fn from_draft(id: NodeId, draft: NodeDraft, position: Position) -> Self {
        let mut retained = draft.retained;
        retained.remove(&draft.payload.kind());
        Self {
            id,
            payload: draft.payload,
            retained,
            position,
            extensions: draft.extensions,
        }
    }

    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    #[inline]
    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut NodePayload {
        &mut self.payload
    }

    /// Payloads of previously active kinds, ordered by kind.
    pub fn retained(&self) -> impl Iterator<Item = &NodePayload> {
        self.retained.values()
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Outgoing successor references of the active payload.
    pub fn successors(&self) -> Vec<&NodeRef> {
        self.payload.successors()
    }

    pub fn branches(&self) -> Vec<Option<&NodeRef>> {
        self.payload.branches()
    }

    /// Switch the active kind; see the module docs for what is preserved.
    pub fn retype(mut self, kind: NodeKind) -> Self {
        self.retype_in_place(kind);
        self
    }

    pub(crate) fn retype_in_place(&mut self, kind: NodeKind) {
        if self.kind() == kind {
            return;
        }
        let carried_next = self.payload.next().cloned();
        let incoming = self.retained.remove(&kind).unwrap_or_else(|| {
            let mut fresh = NodePayload::default_for(kind);
            if let (Some(slot), Some(next)) = (fresh.next_mut(), carried_next) {
                *slot = next;
            }
            fresh
        });
        let outgoing = std::mem::replace(&mut self.payload, incoming);
        self.retained.insert(outgoing.kind(), outgoing);
    }

    pub(crate) fn rename_refs(&mut self, old: &NodeId, new: &NodeId, dialogue: &DialogueId) -> usize {
        let mut changed = self.payload.rename_refs(old, new, dialogue);
        for payload in self.retained.values_mut() {
            changed += payload.rename_refs(old, new, dialogue);
        }
        changed
    }

    pub(crate) fn rename_external_refs(
        &mut self,
        dialogue: &DialogueId,
        old: &NodeId,
        new: &NodeId,
    ) -> usize {
        let mut changed = self.payload.rename_external_refs(dialogue, old, new);
        for payload in self.retained.values_mut() {
            changed += payload.rename_external_refs(dialogue, old, new);
        }
        changed
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }
}

/// Everything needed to add a node to a dialogue.
///
/// # Example
///
/// ```
/// use talegraph_domain::{NodeDraft, NodeKind, NodePayload, SayNode};
///
/// let draft = NodeDraft::new(NodePayload::Say(SayNode {
///     speaker: "innkeeper".into(),
///     text: "Welcome, traveller.".into(),
///     next: None,
/// }))
/// .with_id("greeting")
/// .unwrap();
///
/// assert_eq!(draft.kind(), NodeKind::Say);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub(crate) id: Option<NodeId>,
    pub(crate) payload: NodePayload,
    pub(crate) retained: BTreeMap<NodeKind, NodePayload>,
    pub(crate) position: Option<Position>,
    pub(crate) extensions: Extensions,
}

impl NodeDraft {
    pub fn new(payload: NodePayload) -> Self {
        Self {
            id: None,
            payload,
            retained: BTreeMap::new(),
            position: None,
            extensions: Extensions::new(),
        }
    }

    /// Draft with the default payload of `kind`.
    pub fn of_kind(kind: NodeKind) -> Self {
        Self::new(NodePayload::default_for(kind))
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn id(&self) -> Option<&NodeId> {
        self.id.as_ref()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Result<Self, crate::DomainError> {
        self.id = Some(NodeId::new(id)?);
        Ok(self)
    }

    pub fn with_node_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Add a payload kept from an earlier kind. Ignored if it matches the
    /// active kind.
    pub fn with_retained(mut self, payload: NodePayload) -> Self {
        self.retained.insert(payload.kind(), payload);
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(payload: NodePayload) -> DialogueNode {
        DialogueNode::from_draft(
            NodeId::new("n").unwrap(),
            NodeDraft::new(payload),
            Position::default(),
        )
    }

    fn say(text: &str, next: &str) -> NodePayload {
        NodePayload::Say(SayNode {
            speaker: "alice".into(),
            text: text.into(),
            next: Some(NodeRef::from(next)),
        })
    }

    mod kind {
        use super::*;

        #[test]
        fn parses_case_insensitively() {
            assert_eq!("SAY".parse::<NodeKind>().unwrap(), NodeKind::Say);
            assert_eq!("signal".parse::<NodeKind>().unwrap(), NodeKind::Signal);
            assert!("goto".parse::<NodeKind>().is_err());
        }

        #[test]
        fn display_matches_document_tag() {
            for kind in NodeKind::ALL {
                assert_eq!(kind.to_string().parse::<NodeKind>().unwrap(), kind);
            }
        }
    }

    mod successors {
        use super::*;

        #[test]
        fn say_has_its_next() {
            let n = node(say("hi", "b"));
            assert_eq!(n.successors(), vec![&NodeRef::from("b")]);
        }

        #[test]
        fn empty_and_absent_successors_are_skipped() {
            let n = node(NodePayload::If(IfNode {
                condition: "gold > 3".into(),
                then_node: Some(NodeRef::from("")),
                else_node: None,
            }));
            assert!(n.successors().is_empty());
            assert_eq!(n.branches(), vec![None, None]);
        }

        #[test]
        fn choice_successors_are_deduplicated_in_order() {
            let n = node(NodePayload::Choice(ChoiceNode {
                choices: vec![
                    ChoiceOption::new("Yes", "b"),
                    ChoiceOption::new("Sure", "b"),
                    ChoiceOption::new("No", "c"),
                ],
            }));
            assert_eq!(
                n.successors(),
                vec![&NodeRef::from("b"), &NodeRef::from("c")]
            );
            assert_eq!(n.branches().len(), 3);
        }

        #[test]
        fn end_has_none() {
            let n = node(NodePayload::End(EndNode {
                outcome: Some("victory".into()),
            }));
            assert!(n.successors().is_empty());
        }
    }

    mod retype {
        use super::*;

        #[test]
        fn switching_away_and_back_restores_payload() {
            let original = say("Hello there", "b");
            let n = node(original.clone())
                .retype(NodeKind::Choice)
                .retype(NodeKind::Say);

            assert_eq!(n.payload(), &original);
            assert_eq!(n.retained().count(), 1);
        }

        #[test]
        fn next_carries_over_between_single_successor_kinds() {
            let n = node(say("hi", "b")).retype(NodeKind::Signal);
            match n.payload() {
                NodePayload::Signal(signal) => {
                    assert_eq!(signal.next, Some(NodeRef::from("b")));
                    assert!(signal.signal_name.is_empty());
                }
                other => panic!("expected signal, got {:?}", other),
            }
        }

        #[test]
        fn retained_payloads_are_inert() {
            let n = node(say("hi", "b")).retype(NodeKind::End);
            assert!(n.successors().is_empty());
            assert_eq!(n.payload().speaker(), None);
        }

        #[test]
        fn retype_to_same_kind_is_noop() {
            let n = node(say("hi", "b"));
            let same = n.clone().retype(NodeKind::Say);
            assert_eq!(n, same);
        }
    }

    mod rename {
        use super::*;

        #[test]
        fn rewrites_local_and_own_external_jump_forms() {
            let dialogue = DialogueId::new("intro").unwrap();
            let old = NodeId::new("b").unwrap();
            let new = NodeId::new("c").unwrap();

            let mut local = NodePayload::Jump(JumpNode {
                jump_target: Some(NodeRef::from("b")),
            });
            let mut external = NodePayload::Jump(JumpNode {
                jump_target: Some(NodeRef::from("intro/b")),
            });
            let mut foreign = NodePayload::Jump(JumpNode {
                jump_target: Some(NodeRef::from("other/b")),
            });

            assert_eq!(local.rename_refs(&old, &new, &dialogue), 1);
            assert_eq!(external.rename_refs(&old, &new, &dialogue), 1);
            assert_eq!(foreign.rename_refs(&old, &new, &dialogue), 0);
            assert_eq!(local.successors(), vec![&NodeRef::from("c")]);
            assert_eq!(external.successors(), vec![&NodeRef::from("intro/c")]);
        }
    }

    #[test]
    fn summary_previews_active_payload() {
        assert_eq!(node(say("Hello", "b")).payload().summary(), "alice: Hello");
        let long = "x".repeat(60);
        assert!(node(say(&long, "b")).payload().summary().ends_with("..."));
        assert_eq!(
            NodePayload::default_for(NodeKind::End).summary(),
            "END".to_string()
        );
    }
}
