//! Unified error types for the domain layer
//!
//! Graph mutations and registry operations return `DomainError`. Validation
//! findings are NOT errors; see [`crate::validation`].

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An entity with the same id already exists in its owner
    #[error("Duplicate id: {entity_type} with id {id} already exists")]
    DuplicateId {
        entity_type: &'static str,
        id: String,
    },

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

impl DomainError {
    /// Create a duplicate id error
    pub fn duplicate_id(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an invalid id error.
    ///
    /// Use this when a textual identifier cannot become a typed id:
    /// - Empty after trimming
    /// - Contains the reserved `/` separator
    ///
    /// # Example
    /// ```ignore
    /// if raw.contains('/') {
    ///     return Err(DomainError::invalid_id(format!("'{}' contains '/'", raw)));
    /// }
    /// ```
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
