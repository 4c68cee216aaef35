//! Error types for grid setup and host-side cell access.

use thiserror::Error;

use super::grid::Block;

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors raised while laying out a grid or addressing its cells.
///
/// Stepping only fails when handed blocks that do not fit the layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Grid has no interior cells.
    #[error("grid {width}x{height} is degenerate: both dimensions must be at least 3")]
    Degenerate { width: usize, height: usize },

    /// Cell or word count does not fit in `usize`.
    #[error("grid {width}x{height} is too large to address")]
    TooLarge { width: usize, height: usize },

    /// Shared region cannot hold the five blocks.
    #[error("region too small: need {required} words, have {available}")]
    RegionTooSmall { required: usize, available: usize },

    /// Pre-split block does not match the kernel's cell count.
    #[error("{block:?} block holds {found} words, expected {expected}")]
    BlockSizeMismatch {
        block: Block,
        expected: usize,
        found: usize,
    },

    /// Host asked for a cell outside the grid.
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: usize, y: usize },
}
