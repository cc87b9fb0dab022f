use serde::{Deserialize, Serialize};

/// Canvas position of a node. Presentation only, never validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Horizontal spacing used when laying out freshly added nodes.
    pub const DEFAULT_SPACING: f64 = 250.0;

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Default slot for the `index`-th node: a single row, left to right.
    pub fn slot(index: usize) -> Self {
        Self::new(index as f64 * Self::DEFAULT_SPACING, 0.0)
    }
}
