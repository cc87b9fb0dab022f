//! Domain entities - Core objects with identity

mod character;
mod node;

pub use character::Character;
pub use node::{
    ChoiceNode, ChoiceOption, DialogueNode, EndNode, IfNode, JumpNode, NodeDraft, NodeKind,
    NodePayload, SayNode, SetNode, SignalNode, UnknownNodeKind,
};
