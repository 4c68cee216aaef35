//! Fixed-point arithmetic and the displacement-to-color mapping.
//!
//! Field values are plain `i32` words. Shifts are arithmetic, so `x >> 1`
//! floors toward negative infinity (`-1 >> 1 == -1`).

/// Smallest representable displacement or velocity.
pub const MIN_FIXED: i32 = -0x4000_0000;

/// Largest representable displacement or velocity.
pub const MAX_FIXED: i32 = 0x3FFF_FFFF;

/// Opaque alpha channel of a packed RGBA word.
pub const ALPHA: u32 = 0xFF00_0000;

/// Color of a wall cell: fully transparent black.
pub const WALL_COLOR: u32 = 0x0000_0000;

/// Number of low bits discarded when quantizing a value to a color level.
pub const COLOR_SHIFT: u32 = 22;

/// Clamp a wide intermediate into `[MIN_FIXED, MAX_FIXED]`.
///
/// Intermediates are computed in `i64` so sums of three in-range terms,
/// or an unclamped force on top of a clamped displacement, never wrap
/// before they are clamped.
#[inline]
pub fn saturate(x: i64) -> i32 {
    x.clamp(MIN_FIXED as i64, MAX_FIXED as i64) as i32
}

/// Halve with an arithmetic shift (floor division by two).
#[inline]
pub fn half(x: i32) -> i32 {
    x >> 1
}

/// Map a displacement to a packed `R | G << 8 | B << 16 | A << 24` word.
///
/// Crests are gray, troughs are green. Trough levels are offset by one,
/// so level `-1` renders with a green channel of zero.
#[inline]
pub fn color_map(value: i32) -> u32 {
    let level = value >> COLOR_SHIFT;
    if level > 0 {
        let v = level as u32;
        v | (v << 8) | (v << 16) | ALPHA
    } else if level < 0 {
        let m = (-(level + 1)) as u32;
        (m << 8) | ALPHA
    } else {
        ALPHA
    }
}
