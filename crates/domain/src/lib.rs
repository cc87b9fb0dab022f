//! Talegraph Domain - branching dialogue graphs for interactive fiction.
//!
//! A [`Project`] owns named [`Dialogue`]s and [`Character`]s. A dialogue is an
//! ordered graph of typed [`DialogueNode`]s edited through the dialogue's own
//! API and checked with [`validate`]. Nothing here performs I/O; loading and
//! saving live in the engine crate.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod validation;
pub mod value_objects;

pub use aggregates::{Dialogue, Project, DIALOGUE_EXTENSION};
pub use entities::{
    Character, ChoiceNode, ChoiceOption, DialogueNode, EndNode, IfNode, JumpNode, NodeDraft,
    NodeKind, NodePayload, SayNode, SetNode, SignalNode, UnknownNodeKind,
};
pub use error::DomainError;
pub use ids::{CharacterId, DialogueId, NodeId, PATH_SEPARATOR};
pub use validation::{
    cycle_report, has_errors, validate, validate_project, Diagnostic, DiagnosticKind, Severity,
};
pub use value_objects::{Extensions, JumpTarget, NodeRef, Position, VariableValue};
