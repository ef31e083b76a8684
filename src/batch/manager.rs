//! Batched tile manager

use super::allocator::{SlotAllocator, SlotId};
use super::registry::{MeshHandle, SlotRegistry};
use super::stamper::AttributeStamper;
use super::store::GeometryStore;
use super::texture_array::TextureArrayStore;
use super::upload::UploadForcer;
use super::{BatchError, BatchResult};
use crate::backend::traits::GraphicsBackend;
use crate::backend::types::TextureFormat;
use crate::material::SharedMaterial;
use crate::sort;
use glam::Mat4;

/// Capacity and layout of the slot pool
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_slots: u32,
    pub max_vertices_per_slot: u32,
    pub max_indices_per_slot: u32,
    pub layer_width: u32,
    pub layer_height: u32,
    pub target_format: TextureFormat,
    pub transparent: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_slots: 800,
            max_vertices_per_slot: 1800,
            max_indices_per_slot: 9000,
            layer_width: 256,
            layer_height: 256,
            target_format: TextureFormat::Rgba8UnormSrgb,
            transparent: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotDraw {
    index_start: u32,
    index_count: u32,
    depth_key: u32,
}

/// Streams tile meshes in and out of a fixed pool of GPU slots
///
/// Every tile shares one vertex buffer, one index buffer, one array texture
/// and one material. Adding a tile uploads into its slot's region and forces
/// the upload through before returning; drawing is one indexed draw per
/// visible slot with no state changes in between.
pub struct BatchedTileManager {
    config: BatchConfig,
    allocator: SlotAllocator,
    registry: SlotRegistry,
    store: GeometryStore,
    textures: TextureArrayStore,
    stamper: AttributeStamper,
    material: SharedMaterial,
    forcer: UploadForcer,
    /// Draw the batch at all; per-slot visibility still applies underneath
    pub visible: bool,
    /// Sort visible slots by camera distance before drawing
    pub sort_objects: bool,
}

impl BatchedTileManager {
    pub fn new<B: GraphicsBackend>(backend: &mut B, config: BatchConfig) -> BatchResult<Self> {
        let store = GeometryStore::new(
            backend,
            config.max_slots,
            config.max_vertices_per_slot,
            config.max_indices_per_slot,
        )?;
        let textures = TextureArrayStore::new(
            backend,
            config.layer_width,
            config.layer_height,
            config.max_slots,
        )?;
        let material = SharedMaterial::new(
            backend,
            &store,
            &textures,
            config.target_format,
            config.transparent,
        )?;
        let forcer = UploadForcer::new(backend, config.target_format)?;

        log::info!(
            "tile batch ready: {} slots, {} verts / {} indices per slot, {}x{} layers",
            config.max_slots,
            config.max_vertices_per_slot,
            config.max_indices_per_slot,
            config.layer_width,
            config.layer_height
        );

        Ok(Self {
            allocator: SlotAllocator::new(config.max_slots),
            registry: SlotRegistry::new(),
            store,
            textures,
            stamper: AttributeStamper::new(),
            material,
            forcer,
            visible: true,
            sort_objects: true,
            config,
        })
    }

    /// Seeded variant for reproducible debug colors
    pub fn with_seed<B: GraphicsBackend>(
        backend: &mut B,
        config: BatchConfig,
        seed: u64,
    ) -> BatchResult<Self> {
        let mut manager = Self::new(backend, config)?;
        manager.stamper = AttributeStamper::with_seed(seed);
        Ok(manager)
    }

    /// Claim a slot for a mesh, upload its geometry and texture, and force
    /// the upload through the GPU
    ///
    /// The tile comes back hidden; callers reveal it once its surroundings
    /// are ready. Returns the claimed slot id.
    pub fn add_mesh<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        mesh: MeshHandle,
        geometry: &crate::resources::TileGeometry,
        texture: &crate::resources::TextureData,
        transform: Mat4,
    ) -> BatchResult<SlotId> {
        if self.registry.contains(mesh) {
            return Err(BatchError::DuplicateMesh(mesh));
        }
        // Validate before allocating so a failure leaves no state behind
        self.store.check_budget(geometry)?;

        let id = self.allocator.allocate()?;

        let mut slot_id_stream = vec![0u32; self.config.max_vertices_per_slot as usize];
        self.stamper.stamp_slot_id(&mut slot_id_stream, id);
        self.store.bind_geometry(id, geometry, &slot_id_stream)?;

        if !self.store.has_debug_color(id) {
            let color = self.stamper.debug_color();
            self.store.fill_debug_color(id, color);
        }

        self.store.set_transform(id, transform)?;
        self.store.set_visible(id, false)?;
        self.registry.bind(mesh, id)?;
        self.textures.set_layer(backend, id, texture);

        self.forcer
            .flush_slot(backend, &mut self.store, &self.material, id)?;

        log::debug!("mesh {:?} bound to slot {}", mesh, id.get());
        Ok(id)
    }

    /// Release a mesh's slot for reuse
    ///
    /// Unknown meshes are ignored; eviction races with streaming and asking
    /// twice is not an error.
    pub fn remove_mesh(&mut self, mesh: MeshHandle) -> BatchResult<()> {
        let Some(id) = self.registry.unbind(mesh) else {
            return Ok(());
        };
        self.store.release(id)?;
        self.allocator.release(id)?;
        log::debug!("mesh {:?} released slot {}", mesh, id.get());
        Ok(())
    }

    /// Show or hide a mesh without touching its slot data
    pub fn set_visible(&mut self, mesh: MeshHandle, visible: bool) -> BatchResult<()> {
        let Some(id) = self.registry.slot_of(mesh) else {
            return Ok(());
        };
        self.store.set_visible(id, visible)
    }

    pub fn is_visible(&self, mesh: MeshHandle) -> bool {
        self.registry
            .slot_of(mesh)
            .map(|id| self.store.is_visible(id))
            .unwrap_or(false)
    }

    /// Update a mesh's transform; uploaded with the next flush
    pub fn set_transform(&mut self, mesh: MeshHandle, transform: Mat4) -> BatchResult<()> {
        let id = self
            .registry
            .slot_of(mesh)
            .ok_or(BatchError::NotFound(mesh))?;
        self.store.set_transform(id, transform)
    }

    pub fn slot_of(&self, mesh: MeshHandle) -> Option<SlotId> {
        self.registry.slot_of(mesh)
    }

    pub fn mesh_of(&self, slot: SlotId) -> Option<MeshHandle> {
        self.registry.mesh_of(slot)
    }

    pub fn live_count(&self) -> u32 {
        self.allocator.live_count()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Switch all tiles between textured and debug color shading
    pub fn set_debug_colors<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        enabled: bool,
    ) -> BatchResult<()> {
        self.material.set_debug_colors(backend, enabled)
    }

    pub fn debug_colors(&self) -> bool {
        self.material.debug_colors()
    }

    /// Encode one indexed draw per visible slot into the open render pass
    ///
    /// Must be called between `begin_render_pass` and `end_render_pass` on a
    /// pass whose color target matches the configured format and that has a
    /// `Depth32Float` depth attachment. Opaque batches draw front to back,
    /// transparent ones back to front.
    pub fn encode_draws<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        view: Mat4,
        proj: Mat4,
        far: f32,
    ) {
        self.material.update_camera(backend, proj * view);
        self.store.flush_ranges(backend);

        if !self.visible {
            return;
        }

        let mut draws: Vec<SlotDraw> = self
            .store
            .visible_slots()
            .map(|(id, index_start, index_count)| {
                let world_pos = self.store.transform_of(id).w_axis.truncate();
                let depth = -view.transform_point3(world_pos).z;
                SlotDraw {
                    index_start,
                    index_count,
                    depth_key: sort::depth_key(depth, far),
                }
            })
            .collect();

        if self.sort_objects {
            sort::radix_sort_by_key(&mut draws, |d| d.depth_key);
            if self.material.transparent() {
                draws.reverse();
            }
        }

        self.material.encode_bind(backend, &self.store);
        for draw in &draws {
            backend.draw_indexed(draw.index_start..draw.index_start + draw.index_count, 0, 0..1);
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &GeometryStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{TextureData, TileGeometry};
    use crate::test_backend::NullBackend;

    fn small_config() -> BatchConfig {
        BatchConfig {
            max_slots: 2,
            max_vertices_per_slot: 4,
            max_indices_per_slot: 6,
            layer_width: 4,
            layer_height: 4,
            ..Default::default()
        }
    }

    fn manager(backend: &mut NullBackend) -> BatchedTileManager {
        BatchedTileManager::with_seed(backend, small_config(), 42).unwrap()
    }

    #[test]
    fn add_assigns_slots_in_order() {
        let mut backend = NullBackend::new().unwrap();
        let mut mgr = manager(&mut backend);
        let geometry = TileGeometry::patch(1.0, 1);
        let texture = TextureData::white(4, 4);

        let a = mgr
            .add_mesh(&mut backend, MeshHandle(1), &geometry, &texture, Mat4::IDENTITY)
            .unwrap();
        let b = mgr
            .add_mesh(&mut backend, MeshHandle(2), &geometry, &texture, Mat4::IDENTITY)
            .unwrap();
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
        assert_eq!(mgr.live_count(), 2);
    }

    #[test]
    fn new_tiles_start_hidden() {
        let mut backend = NullBackend::new().unwrap();
        let mut mgr = manager(&mut backend);
        mgr.add_mesh(
            &mut backend,
            MeshHandle(1),
            &TileGeometry::patch(1.0, 1),
            &TextureData::white(4, 4),
            Mat4::IDENTITY,
        )
        .unwrap();
        assert!(!mgr.is_visible(MeshHandle(1)));
    }

    #[test]
    fn remove_unknown_mesh_is_a_no_op() {
        let mut backend = NullBackend::new().unwrap();
        let mut mgr = manager(&mut backend);
        assert!(mgr.remove_mesh(MeshHandle(99)).is_ok());
    }

    #[test]
    fn set_transform_on_unknown_mesh_fails() {
        let mut backend = NullBackend::new().unwrap();
        let mut mgr = manager(&mut backend);
        assert!(matches!(
            mgr.set_transform(MeshHandle(1), Mat4::IDENTITY),
            Err(BatchError::NotFound(_))
        ));
    }

    #[test]
    fn encode_draws_emits_one_draw_per_visible_slot() {
        let mut backend = NullBackend::new().unwrap();
        let mut mgr = manager(&mut backend);
        let geometry = TileGeometry::patch(1.0, 1);
        let texture = TextureData::white(4, 4);

        mgr.add_mesh(&mut backend, MeshHandle(1), &geometry, &texture, Mat4::IDENTITY)
            .unwrap();
        mgr.add_mesh(&mut backend, MeshHandle(2), &geometry, &texture, Mat4::IDENTITY)
            .unwrap();
        mgr.set_visible(MeshHandle(2), true).unwrap();

        backend.draws.clear();
        mgr.encode_draws(&mut backend, Mat4::IDENTITY, Mat4::IDENTITY, 100.0);

        // Only the visible slot draws, over its slot's index region
        assert_eq!(backend.draws, vec![(6..12, 0, 0..1)]);

        // Hiding the whole batch suppresses every draw
        mgr.visible = false;
        backend.draws.clear();
        mgr.encode_draws(&mut backend, Mat4::IDENTITY, Mat4::IDENTITY, 100.0);
        assert!(backend.draws.is_empty());
    }
}
