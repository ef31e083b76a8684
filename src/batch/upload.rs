//! Forced upload of freshly bound slots
//!
//! Staged buffer writes only reach the GPU when a submission consumes them.
//! After binding a slot this module issues a three index draw into a private
//! 1x1 offscreen target and blocks until the queue drains, so the slot's data
//! is resident before the tile is ever shown.

use super::allocator::SlotId;
use super::store::GeometryStore;
use super::BatchResult;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::material::SharedMaterial;

/// Owns the throwaway render target used for upload draws
pub struct UploadForcer {
    color_view: TextureViewHandle,
    depth_view: TextureViewHandle,
}

impl UploadForcer {
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        target_format: TextureFormat,
    ) -> BatchResult<Self> {
        let color = backend.create_texture(&TextureDescriptor {
            label: Some("Upload Color Target".into()),
            width: 1,
            height: 1,
            layers: 1,
            mip_levels: 1,
            format: target_format,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })?;
        let color_view = backend.create_texture_view(color)?;

        let depth = backend.create_texture(&TextureDescriptor {
            label: Some("Upload Depth Target".into()),
            width: 1,
            height: 1,
            layers: 1,
            mip_levels: 1,
            format: TextureFormat::Depth32Float,
            usage: TextureUsage::RENDER_ATTACHMENT,
        })?;
        let depth_view = backend.create_texture_view(depth)?;

        Ok(Self {
            color_view,
            depth_view,
        })
    }

    /// Push the slot's pending data to the GPU and wait for it
    ///
    /// The slot is made visible for the duration of the draw and restored
    /// after, matching the state a real frame would see. The draw covers the
    /// first three indices only; its output is discarded.
    pub fn flush_slot<B: GraphicsBackend>(
        &self,
        backend: &mut B,
        store: &mut GeometryStore,
        material: &SharedMaterial,
        id: SlotId,
    ) -> BatchResult<()> {
        store.flush_ranges(backend);

        let was_visible = store.is_visible(id);
        store.set_visible(id, true)?;

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Upload Pass".into()),
            color_attachments: vec![ColorAttachment {
                view: self.color_view,
                load_op: LoadOp::Clear([0.0, 0.0, 0.0, 0.0]),
                store_op: StoreOp::Discard,
            }],
            depth_stencil_attachment: Some(DepthStencilAttachment {
                view: self.depth_view,
                depth_load_op: LoadOp::Clear([0.0; 4]),
                depth_store_op: StoreOp::Discard,
                depth_clear_value: 1.0,
            }),
        });
        material.encode_bind(backend, store);
        backend.draw_indexed(0..3, 0, 0..1);
        backend.end_render_pass();

        backend.submit();
        backend.wait_idle();

        store.set_visible(id, was_visible)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::texture_array::TextureArrayStore;
    use crate::resources::TileGeometry;
    use crate::test_backend::NullBackend;

    #[test]
    fn flush_draws_three_indices_and_waits() {
        let mut backend = NullBackend::new().unwrap();
        let mut store = GeometryStore::new(&mut backend, 2, 8, 12).unwrap();
        let textures = TextureArrayStore::new(&mut backend, 4, 4, 2).unwrap();
        let material = SharedMaterial::new(
            &mut backend,
            &store,
            &textures,
            TextureFormat::Rgba8UnormSrgb,
            false,
        )
        .unwrap();
        let forcer = UploadForcer::new(&mut backend, TextureFormat::Rgba8UnormSrgb).unwrap();

        let id = SlotId::new(0);
        store
            .bind_geometry(id, &TileGeometry::patch(1.0, 1), &vec![0u32; 8])
            .unwrap();

        forcer.flush_slot(&mut backend, &mut store, &material, id).unwrap();

        assert_eq!(backend.draws, vec![(0..3, 0, 0..1)]);
        assert_eq!(backend.submits, 1);
        assert_eq!(backend.waits, 1);
        assert!(!backend.pass_open);
        // Visibility restored to its pre-flush value
        assert!(!store.is_visible(id));
        // Dirty ranges drained
        assert!(!store.has_dirty_ranges());
    }
}
