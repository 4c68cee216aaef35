mod cell;
mod error;
mod field;
mod fixed;
mod grid;

pub use cell::{Cell, CellStatus};
pub use error::{GridError, Result};
pub use field::{FieldStats, WaveField};
pub use fixed::{color_map, half, saturate, ALPHA, COLOR_SHIFT, MAX_FIXED, MIN_FIXED, WALL_COLOR};
pub use grid::{Block, GridBlocks, GridLayout, GridView, WaveKernel, BLOCK_COUNT, MIN_DIMENSION};
