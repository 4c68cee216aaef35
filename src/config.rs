/// Grid dimensions (256x192 cells, each drawn as a 4x4 block on screen)
pub const GRID_WIDTH: usize = 256;
pub const GRID_HEIGHT: usize = 192;

/// On-screen pixels per grid cell for the initial window size
pub const CELL_SCALE: u32 = 4;

// ============================================
// Force Injection
// ============================================

/// Brush radius in cells for click-and-drag
pub const BRUSH_RADIUS: f32 = 3.0;

/// Force added per cell per frame while dragging (fixed-point units).
/// Left button pushes up, right button pushes down.
pub const BRUSH_FORCE: i32 = 0x0400_0000;

/// Chance per frame that a rain drop lands while rain is on
pub const RAIN_PROBABILITY: f64 = 0.15;

/// Radius range of a rain drop in cells
pub const RAIN_RADIUS_MIN: f32 = 1.0;
pub const RAIN_RADIUS_MAX: f32 = 2.5;

/// Peak force of a rain drop (sign is random)
pub const RAIN_FORCE: i32 = 0x0800_0000;

// ============================================
// Reporting
// ============================================

/// Seconds between FPS / field statistics reports
pub const STATS_INTERVAL_SECS: f64 = 1.0;

/// Background shown through transparent wall cells
pub const CLEAR_COLOR: [f64; 3] = [0.05, 0.05, 0.08];
