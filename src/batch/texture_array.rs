//! Array texture with one layer per slot

use super::allocator::SlotId;
use super::BatchResult;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::resources::TextureData;

/// Owns the shared array texture that tiles sample by slot id
pub struct TextureArrayStore {
    texture: TextureHandle,
    view: TextureViewHandle,
    sampler: SamplerHandle,
    width: u32,
    height: u32,
    layers: u32,
}

impl TextureArrayStore {
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        width: u32,
        height: u32,
        layers: u32,
    ) -> BatchResult<Self> {
        let texture = backend.create_texture(&TextureDescriptor {
            label: Some("Tile Texture Array".into()),
            width,
            height,
            layers,
            mip_levels: 1,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;
        let view = backend.create_texture_view(texture)?;
        let sampler = backend.create_sampler(&SamplerDescriptor {
            label: Some("Tile Sampler".into()),
            ..Default::default()
        })?;

        Ok(Self {
            texture,
            view,
            sampler,
            width,
            height,
            layers,
        })
    }

    pub fn view(&self) -> TextureViewHandle {
        self.view
    }

    pub fn sampler(&self) -> SamplerHandle {
        self.sampler
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Upload texture data into the slot's layer
    ///
    /// Mismatched dimensions are resampled to the layer size first. A freed
    /// layer keeps its old texels; the slot id indirection means nothing
    /// samples it until the slot is bound again.
    pub fn set_layer<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        id: SlotId,
        data: &TextureData,
    ) {
        if id.get() >= self.layers {
            log::warn!(
                "texture layer {} out of range ({} layers)",
                id.get(),
                self.layers
            );
            return;
        }

        if data.width != self.width || data.height != self.height {
            log::debug!(
                "resampling {}x{} tile texture to layer size {}x{}",
                data.width,
                data.height,
                self.width,
                self.height
            );
            let resized = data.resized(self.width, self.height);
            backend.write_texture_layer(
                self.texture,
                id.get(),
                &resized.data,
                self.width,
                self.height,
            );
        } else {
            backend.write_texture_layer(self.texture, id.get(), &data.data, self.width, self.height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_backend::NullBackend;

    #[test]
    fn set_layer_targets_slot_layer() {
        let mut backend = NullBackend::new().unwrap();
        let mut store = TextureArrayStore::new(&mut backend, 4, 4, 8).unwrap();

        store.set_layer(&mut backend, SlotId::new(5), &TextureData::white(4, 4));
        assert_eq!(backend.texture_writes.len(), 1);
        assert_eq!(backend.texture_writes[0].1, 5);
    }

    #[test]
    fn out_of_range_layer_is_skipped() {
        let mut backend = NullBackend::new().unwrap();
        let mut store = TextureArrayStore::new(&mut backend, 4, 4, 2).unwrap();

        store.set_layer(&mut backend, SlotId::new(2), &TextureData::white(4, 4));
        assert!(backend.texture_writes.is_empty());
    }

    #[test]
    fn mismatched_dimensions_still_upload() {
        let mut backend = NullBackend::new().unwrap();
        let mut store = TextureArrayStore::new(&mut backend, 8, 8, 2).unwrap();

        store.set_layer(&mut backend, SlotId::new(0), &TextureData::white(2, 2));
        assert_eq!(backend.texture_writes.len(), 1);
    }
}
