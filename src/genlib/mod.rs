/// One-dimensional kernels shared by maps and profiles.
pub mod line;
/// Affine transformation matrices.
pub mod matrix;
/// Noise layer tables.
pub mod noise;

/// Two-dimensional height rasters.
pub mod height_map;
/// One-dimensional height rasters.
pub mod height_profile;
