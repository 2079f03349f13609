//! Value types shared by every layer: geometry, height math, random sources, errors and machine states.

pub mod error;
pub mod geometry;
pub mod number;
pub mod random;
pub mod state;
