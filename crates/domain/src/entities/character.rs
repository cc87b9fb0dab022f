//! Character entity - someone who can speak in a `say` node
//!
//! Nodes refer to characters by id only. Removing a character never touches
//! the nodes that name it; validation reports the unknown speaker instead.

use crate::ids::CharacterId;
use crate::value_objects::Extensions;

#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    id: CharacterId,
    name: String,
    /// Display color (hex), if any
    color: Option<String>,
    /// Portrait asset reference, if any
    portrait: Option<String>,
    extensions: Extensions,
}

impl Character {
    pub fn new(id: CharacterId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: None,
            portrait: None,
            extensions: Extensions::new(),
        }
    }

    // Read accessors
    pub fn id(&self) -> &CharacterId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn portrait(&self) -> Option<&str> {
        self.portrait.as_deref()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    // Builder methods
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_portrait(mut self, portrait: impl Into<String>) -> Self {
        self.portrait = Some(portrait.into());
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    // Setter methods
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_color(&mut self, color: Option<String>) {
        self.color = color;
    }

    pub fn set_portrait(&mut self, portrait: Option<String>) {
        self.portrait = portrait;
    }
}
