//! Batched tile slot management
//!
//! A fixed-capacity pool of geometry slots inside shared GPU buffers, plus a
//! texture array with one layer per slot. Tiles stream in and out of the pool
//! without reallocating GPU storage.

pub mod allocator;
pub mod manager;
pub mod registry;
pub mod stamper;
pub mod store;
pub mod texture_array;
pub mod upload;

pub use allocator::{SlotAllocator, SlotId};
pub use manager::{BatchConfig, BatchedTileManager};
pub use registry::{MeshHandle, SlotRegistry};
pub use stamper::AttributeStamper;
pub use store::GeometryStore;
pub use texture_array::TextureArrayStore;
pub use upload::UploadForcer;

use crate::backend::traits::BackendError;
use thiserror::Error;

/// Errors from batch slot operations
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("mesh {0:?} is already bound to a slot")]
    DuplicateMesh(MeshHandle),

    #[error("all {0} slots are in use")]
    CapacityExceeded(u32),

    #[error("geometry with {vertices} vertices / {indices} indices exceeds slot budget of {max_vertices} / {max_indices}")]
    GeometryTooLarge {
        vertices: usize,
        indices: usize,
        max_vertices: u32,
        max_indices: u32,
    },

    #[error("slot {0:?} is not bound")]
    InvalidState(SlotId),

    #[error("mesh {0:?} is not bound to any slot")]
    NotFound(MeshHandle),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type BatchResult<T> = Result<T, BatchError>;
