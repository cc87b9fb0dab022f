//! YAML persistence for dialogue projects.
//!
//! `documents` holds the on-disk shapes, `codec` turns text into domain values
//! and back, and `yaml_store` walks a project directory.

mod codec;
mod documents;
mod yaml_store;

pub use codec::{parse_characters, parse_dialogue, render_characters, render_dialogue};
pub use yaml_store::{YamlProjectStore, CHARACTERS_FILE, DEFAULT_MAX_DOCUMENT_BYTES};
