//! Batched tile rendering for streamed 3D map content
//!
//! Tiles stream in and out constantly while a map is browsed. Instead of one
//! GPU geometry and material per tile, this crate packs every tile into a
//! fixed pool of slots inside shared buffers:
//! - one vertex, index and transform buffer for all slots
//! - one array texture with a layer per slot
//! - one material that resolves the tile's layer through a per-vertex slot id
//!
//! Adding a tile is a partial buffer upload forced through the GPU before the
//! call returns; drawing is one indexed draw per visible slot, depth sorted
//! with a radix pass.

pub mod backend;
pub mod batch;
pub mod material;
pub mod resources;
pub mod sort;

#[cfg(test)]
mod test_backend;

pub use backend::traits::GraphicsBackend;
pub use backend::wgpu_backend::WgpuBackend;
pub use batch::{
    BatchConfig, BatchError, BatchResult, BatchedTileManager, MeshHandle, SlotId,
};
pub use material::SharedMaterial;
pub use resources::{TextureData, TileGeometry};
