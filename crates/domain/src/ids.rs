use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Separator between dialogue id and node id in cross-dialogue jump targets.
pub const PATH_SEPARATOR: char = '/';

macro_rules! define_id {
    ($name:ident, $label:literal, allow_separator = $allow:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a validated id (trimmed, non-empty).
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(concat!(
                        $label,
                        " id cannot be empty"
                    )));
                }
                if !$allow && trimmed.contains(PATH_SEPARATOR) {
                    return Err(DomainError::invalid_id(format!(
                        "{} id '{}' cannot contain '{}'",
                        $label, trimmed, PATH_SEPARATOR
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = DomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }
    };
}

define_id!(NodeId, "Node", allow_separator = false);
define_id!(DialogueId, "Dialogue", allow_separator = false);
define_id!(CharacterId, "Character", allow_separator = true);

impl NodeId {
    /// Generate a fresh id of the form `<prefix>_<8 hex chars>`.
    ///
    /// Uniqueness within a dialogue is the caller's job; see
    /// [`crate::aggregates::Dialogue::add_node`].
    pub fn generate(prefix: &str) -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("{}_{}", prefix, &simple[..8]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_trimmed() {
        let id = NodeId::new("  intro ").unwrap();
        assert_eq!(id.as_str(), "intro");
    }

    #[test]
    fn empty_ids_are_rejected() {
        assert!(NodeId::new("   ").is_err());
        assert!(DialogueId::new("").is_err());
        assert!(CharacterId::new("").is_err());
    }

    #[test]
    fn node_and_dialogue_ids_reject_separator() {
        assert!(NodeId::new("a/b").is_err());
        assert!(DialogueId::new("a/b").is_err());
        assert!(CharacterId::new("npc/guard").is_ok());
    }

    #[test]
    fn generated_ids_carry_prefix() {
        let id = NodeId::generate("say");
        assert!(id.as_str().starts_with("say_"));
        assert_eq!(id.as_str().len(), "say_".len() + 8);
        assert_ne!(NodeId::generate("say"), NodeId::generate("say"));
    }
}
