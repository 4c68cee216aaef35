//! Fixed-point 2D wave field.
//!
//! The kernel lives in [`simulation`]: a grid laid out as five parallel
//! word blocks (image, force, status, displacement, velocity) inside a
//! host-owned region, advanced one step at a time with saturating integer
//! arithmetic and rendered to packed RGBA.

pub mod config;
pub mod simulation;
