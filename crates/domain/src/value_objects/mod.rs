//! Value objects - Immutable values without identity

mod node_ref;
mod position;
mod variable;

pub use node_ref::{JumpTarget, NodeRef};
pub use position::Position;
pub use variable::VariableValue;

/// Document keys this crate does not understand, kept in their original order
/// so they can be written back unchanged.
pub type Extensions = serde_yaml::Mapping;
