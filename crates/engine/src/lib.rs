//! Talegraph Engine library.
//!
//! Loads and saves dialogue projects and backs the `talegraph` command.
//!
//! ## Structure
//!
//! - `infrastructure/ports` - The [`ProjectStore`] trait and codec errors
//! - `infrastructure/persistence` - YAML documents and the directory store
//! - `config` - Environment configuration
//! - `commands` - CLI subcommands

pub mod commands;
pub mod config;
pub mod infrastructure;

pub use config::{ConfigError, EngineConfig};
pub use infrastructure::persistence::{parse_dialogue, render_dialogue, YamlProjectStore};
pub use infrastructure::ports::{CodecError, LoadFailure, ProjectLoad, ProjectStore};
