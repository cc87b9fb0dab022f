//! YAML document shapes and their mapping to domain types.
//!
//! A dialogue file looks like:
//!
//! ```yaml
//! id: tavern
//! title: The Tavern
//! entry: greet            # optional, first node otherwise
//! characters: [innkeeper]
//! nodes:
//!   - id: greet
//!     type: say
//!     position: { x: 0.0, y: 0.0 }
//!     speaker: innkeeper
//!     text: Welcome!
//!     next: order
//!   - id: order
//!     type: choice
//!     position: { x: 250.0, y: 0.0 }
//!     choices:
//!       - text: Ale, please
//!         next: done
//!   - id: done
//!     type: end
//!     position: { x: 500.0, y: 0.0 }
//! ```
//!
//! Keys this module does not know are kept on the matching domain value and
//! written back after the known keys. Known payload keys that do not belong
//! to the node's type (say `text` on a `choice` node) are kept the same way.
//!
//! An extension whose name is one of the document's own keys cannot be written
//! beside them, or it would be read back as that field. Such extensions are
//! written under a `shadowed:` mapping instead and merged back on load:
//!
//! ```yaml
//! - id: menu
//!   type: say
//!   text: Fresh line
//!   shadowed:
//!     text: stale line   # left over from when this node was a choice
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::{Mapping, Value};
use talegraph_domain::{
    Character, CharacterId, ChoiceNode, ChoiceOption, Dialogue, DialogueId, DialogueNode, EndNode,
    IfNode, JumpNode, NodeDraft, NodeKind, NodePayload, NodeRef, Position, SayNode, SetNode,
    SignalNode, VariableValue,
};

const SHADOWED: &str = "shadowed";
const DIALOGUE_KEYS: &[&str] = &["id", "title", "entry", "characters", "nodes", SHADOWED];
const NODE_KEYS: &[&str] = &["id", "type", "position", "retained", SHADOWED];
const CHOICE_KEYS: &[&str] = &["text", "next", SHADOWED];
const CHARACTER_KEYS: &[&str] = &["id", "name", "color", "portrait", SHADOWED];

/// Every field of [`PayloadDocument`], written or not.
const PAYLOAD_KEYS: &[&str] = &[
    "speaker",
    "text",
    "next",
    "choices",
    "assignments",
    "condition",
    "then_node",
    "else_node",
    "jump_target",
    "outcome",
    "signal_name",
];

// ============================================================================
// Scalar
// ============================================================================

/// A YAML scalar read as text, so ids like `1` need no quoting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scalar(pub String);

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
                Ok(Scalar(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

fn non_empty(value: &str) -> Option<Scalar> {
    if value.is_empty() {
        None
    } else {
        Some(Scalar::from(value))
    }
}

fn text(value: Option<Scalar>) -> String {
    value.map(|s| s.0).unwrap_or_default()
}

fn node_ref(value: Option<Scalar>) -> Option<NodeRef> {
    value.map(|s| NodeRef::new(s.0))
}

fn ref_scalar(value: &Option<NodeRef>) -> Option<Scalar> {
    value.as_ref().map(|r| Scalar::from(r.as_str()))
}

/// Split `extensions` into keys that can sit beside the document's own keys
/// and keys named like one of `reserved`, which go under `shadowed:`.
fn split_extensions(extensions: &Mapping, reserved: &[&[&str]]) -> (Mapping, Mapping) {
    let mut free = Mapping::new();
    let mut shadowed = Mapping::new();
    for (key, value) in extensions {
        let is_reserved = key
            .as_str()
            .is_some_and(|k| reserved.iter().any(|keys| keys.contains(&k)));
        let target = if is_reserved { &mut shadowed } else { &mut free };
        target.insert(key.clone(), value.clone());
    }
    (free, shadowed)
}

fn key_list(mapping: &Mapping) -> String {
    mapping
        .keys()
        .map(|k| match k {
            Value::String(s) => s.clone(),
            other => format!("{:?}", other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Position
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionDocument {
    pub x: f64,
    pub y: f64,
}

impl From<PositionDocument> for Position {
    fn from(doc: PositionDocument) -> Self {
        Position::new(doc.x, doc.y)
    }
}

impl From<Position> for PositionDocument {
    fn from(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
        }
    }
}

// ============================================================================
// Payload fields
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceDocument {
    pub text: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Scalar>,
    #[serde(skip_serializing_if = "Mapping::is_empty")]
    pub shadowed: Mapping,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ChoiceDocument {
    fn from_option(option: &ChoiceOption) -> Self {
        let (extra, shadowed) = split_extensions(&option.extensions, &[CHOICE_KEYS]);
        Self {
            text: Some(Scalar::from(option.text.as_str())),
            next: ref_scalar(&option.next),
            shadowed,
            extra,
        }
    }

    fn into_option(self) -> ChoiceOption {
        let mut extensions = self.extra;
        extensions.extend(self.shadowed);
        ChoiceOption {
            text: text(self.text),
            next: node_ref(self.next),
            extensions,
        }
    }
}

/// Every type-specific key of a node, all optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<IndexMap<String, VariableValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub then_node: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub else_node: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jump_target: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_name: Option<Scalar>,
}

impl PayloadDocument {
    pub fn from_payload(payload: &NodePayload) -> Self {
        let mut doc = Self::default();
        match payload {
            NodePayload::Say(node) => {
                doc.speaker = non_empty(&node.speaker);
                doc.text = non_empty(&node.text);
                doc.next = ref_scalar(&node.next);
            }
            NodePayload::Choice(node) => {
                doc.choices = Some(node.choices.iter().map(ChoiceDocument::from_option).collect());
            }
            NodePayload::Set(node) => {
                doc.assignments = Some(node.assignments.clone());
                doc.next = ref_scalar(&node.next);
            }
            NodePayload::If(node) => {
                doc.condition = non_empty(&node.condition);
                doc.then_node = ref_scalar(&node.then_node);
                doc.else_node = ref_scalar(&node.else_node);
            }
            NodePayload::Jump(node) => {
                doc.jump_target = ref_scalar(&node.jump_target);
            }
            NodePayload::End(node) => {
                doc.outcome = node.outcome.as_deref().map(Scalar::from);
            }
            NodePayload::Signal(node) => {
                doc.signal_name = non_empty(&node.signal_name);
                doc.next = ref_scalar(&node.next);
            }
        }
        doc
    }

    /// Take the fields of `kind` out of the document, leaving the rest.
    pub fn take_payload(&mut self, kind: NodeKind) -> NodePayload {
        match kind {
            NodeKind::Say => NodePayload::Say(SayNode {
                speaker: text(self.speaker.take()),
                text: text(self.text.take()),
                next: node_ref(self.next.take()),
            }),
            NodeKind::Choice => NodePayload::Choice(ChoiceNode {
                choices: self
                    .choices
                    .take()
                    .unwrap_or_default()
                    .into_iter()
                    .map(ChoiceDocument::into_option)
                    .collect(),
            }),
            NodeKind::Set => NodePayload::Set(SetNode {
                assignments: self.assignments.take().unwrap_or_default(),
                next: node_ref(self.next.take()),
            }),
            NodeKind::If => NodePayload::If(IfNode {
                condition: text(self.condition.take()),
                then_node: node_ref(self.then_node.take()),
                else_node: node_ref(self.else_node.take()),
            }),
            NodeKind::Jump => NodePayload::Jump(JumpNode {
                jump_target: node_ref(self.jump_target.take()),
            }),
            NodeKind::End => NodePayload::End(EndNode {
                outcome: self.outcome.take().map(|s| s.0),
            }),
            NodeKind::Signal => NodePayload::Signal(SignalNode {
                signal_name: text(self.signal_name.take()),
                next: node_ref(self.next.take()),
            }),
        }
    }

    /// Whatever fields are still set, as raw YAML.
    fn into_leftovers(self) -> Result<Mapping, String> {
        match serde_yaml::to_value(&self).map_err(|e| e.to_string())? {
            Value::Mapping(mapping) => Ok(mapping),
            _ => Ok(Mapping::new()),
        }
    }
}

/// A payload kept from a type the node used to have.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetainedDocument {
    #[serde(rename = "type")]
    pub kind: Scalar,
    #[serde(flatten)]
    pub fields: PayloadDocument,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl RetainedDocument {
    fn from_payload(payload: &NodePayload) -> Self {
        Self {
            kind: Scalar::from(payload.kind().as_str()),
            fields: PayloadDocument::from_payload(payload),
            extra: Mapping::new(),
        }
    }

    fn into_payload(self) -> Result<NodePayload, String> {
        let kind: NodeKind = self.kind.0.parse().map_err(|e| format!("{}", e))?;
        let mut fields = self.fields;
        let payload = fields.take_payload(kind);
        let mut unexpected = fields.into_leftovers()?;
        unexpected.extend(self.extra);
        if !unexpected.is_empty() {
            return Err(format!(
                "retained {} payload has unexpected keys: {}",
                kind,
                key_list(&unexpected)
            ));
        }
        Ok(payload)
    }
}

// ============================================================================
// Node
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: Scalar,
    #[serde(rename = "type")]
    pub kind: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionDocument>,
    #[serde(flatten)]
    pub fields: PayloadDocument,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retained: Vec<RetainedDocument>,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub shadowed: Mapping,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl NodeDocument {
    pub fn from_node(node: &DialogueNode) -> Self {
        // Payload keys of any kind are reserved: an inactive one is typed on
        // load and a stray value could fail to parse.
        let (extra, shadowed) = split_extensions(node.extensions(), &[NODE_KEYS, PAYLOAD_KEYS]);
        Self {
            id: Scalar::from(node.id().as_str()),
            kind: Scalar::from(node.kind().as_str()),
            position: Some(node.position().into()),
            fields: PayloadDocument::from_payload(node.payload()),
            retained: node.retained().map(RetainedDocument::from_payload).collect(),
            shadowed,
            extra,
        }
    }

    pub fn into_draft(self) -> Result<NodeDraft, String> {
        let id = self.id.0;
        let context = |message: String| format!("node '{}': {}", id, message);

        let kind: NodeKind = self
            .kind
            .0
            .parse()
            .map_err(|e| context(format!("{}", e)))?;
        let mut fields = self.fields;
        let payload = fields.take_payload(kind);
        let mut extensions = self.extra;
        extensions.extend(fields.into_leftovers().map_err(context)?);
        extensions.extend(self.shadowed);

        let mut draft = NodeDraft::new(payload)
            .with_id(id.as_str())
            .map_err(|e| context(e.to_string()))?
            .with_extensions(extensions);
        if let Some(position) = self.position {
            draft = draft.with_position(position.into());
        }

        let mut kinds = BTreeSet::from([kind]);
        for retained in self.retained {
            let payload = retained.into_payload().map_err(context)?;
            if !kinds.insert(payload.kind()) {
                return Err(context(format!(
                    "retained {} payload repeats a type already present",
                    payload.kind()
                )));
            }
            draft = draft.with_retained(payload);
        }
        Ok(draft)
    }
}

// ============================================================================
// Dialogue
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Scalar>,
    #[serde(default)]
    pub title: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub characters: Vec<Scalar>,
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub shadowed: Mapping,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl DialogueDocument {
    pub fn from_dialogue(dialogue: &Dialogue) -> Self {
        let (extra, shadowed) = split_extensions(dialogue.extensions(), &[DIALOGUE_KEYS]);
        Self {
            id: Some(Scalar::from(dialogue.id().as_str())),
            title: Some(Scalar::from(dialogue.title())),
            entry: dialogue.entry().map(|id| Scalar::from(id.as_str())),
            characters: dialogue
                .characters()
                .iter()
                .map(|c| Scalar::from(c.as_str()))
                .collect(),
            nodes: dialogue.nodes().map(NodeDocument::from_node).collect(),
            shadowed,
            extra,
        }
    }

    /// Build the domain dialogue. The id falls back to the file stem.
    pub fn into_dialogue(self, path: &Path) -> Result<Dialogue, String> {
        let raw_id = match self.id {
            Some(id) => id.0,
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let id = DialogueId::new(raw_id).map_err(|e| e.to_string())?;
        let characters = self
            .characters
            .into_iter()
            .map(|c| CharacterId::new(c.0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        let mut extensions = self.extra;
        extensions.extend(self.shadowed);
        let mut dialogue = Dialogue::new(id, text(self.title))
            .with_characters(characters)
            .with_extensions(extensions)
            .with_file_path(path);

        for node in self.nodes {
            let draft = node.into_draft()?;
            dialogue.add_node(draft).map_err(|e| e.to_string())?;
        }
        if let Some(entry) = self.entry {
            dialogue
                .set_entry(Some(entry.0.as_str()))
                .map_err(|_| format!("entry node '{}' does not exist", entry.0))?;
        }
        dialogue.mark_saved();
        Ok(dialogue)
    }
}

// ============================================================================
// Characters
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDocument {
    pub id: Scalar,
    #[serde(default)]
    pub name: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub shadowed: Mapping,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl CharacterDocument {
    pub fn from_character(character: &Character) -> Self {
        let (extra, shadowed) = split_extensions(character.extensions(), &[CHARACTER_KEYS]);
        Self {
            id: Scalar::from(character.id().as_str()),
            name: Some(Scalar::from(character.name())),
            color: character.color().map(Scalar::from),
            portrait: character.portrait().map(Scalar::from),
            shadowed,
            extra,
        }
    }

    pub fn into_character(self) -> Result<Character, String> {
        let id = CharacterId::new(self.id.0).map_err(|e| e.to_string())?;
        let mut extensions = self.extra;
        extensions.extend(self.shadowed);
        let mut character = Character::new(id, text(self.name)).with_extensions(extensions);
        if let Some(color) = self.color {
            character = character.with_color(color.0);
        }
        if let Some(portrait) = self.portrait {
            character = character.with_portrait(portrait.0);
        }
        Ok(character)
    }
}

/// `characters.yaml` at the project root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharactersDocument {
    #[serde(default)]
    pub characters: Vec<CharacterDocument>,
}
