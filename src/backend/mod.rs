//! GPU backend abstraction
//!
//! The batch manager talks to the GPU exclusively through the
//! [`GraphicsBackend`](traits::GraphicsBackend) trait so that tests can run
//! against a recording backend and the render loop can bring its own device.

pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use traits::*;
pub use types::*;
