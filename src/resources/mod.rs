//! CPU-side resource data

pub mod geometry;
pub mod texture;

pub use geometry::*;
pub use texture::*;
