//! Shared geometry buffers with fixed per-slot regions

use super::allocator::SlotId;
use super::{BatchError, BatchResult};
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::resources::TileGeometry;
use glam::Mat4;

/// Streams backed by the shared GPU buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Vertex,
    SlotId,
    Color,
    Index,
    Transform,
}

/// Dirty element range inside one stream, in element units
#[derive(Debug, Clone, Copy)]
struct DirtyRange {
    stream: Stream,
    start: usize,
    count: usize,
}

#[derive(Debug, Clone, Copy)]
enum SlotState {
    Free,
    Bound {
        vertex_count: usize,
        index_count: usize,
    },
}

struct Slot {
    state: SlotState,
    visible: bool,
    // Set when the current occupant's color is filled in; cleared on release
    // so the next occupant gets its own color.
    has_debug_color: bool,
}

/// CPU mirrors plus GPU buffers for all geometry streams
///
/// Every slot owns a fixed region: vertices at `id * max_vertices`, indices
/// at `id * max_indices`. Indices are stored rebased into the shared vertex
/// buffer, so slots draw with a plain indexed range and no base vertex.
pub struct GeometryStore {
    max_vertices: u32,
    max_indices: u32,

    vertex_data: Vec<TileVertex>,
    slot_id_data: Vec<u32>,
    color_data: Vec<[u8; 4]>,
    index_data: Vec<u32>,
    transform_data: Vec<Mat4>,

    slots: Vec<Slot>,
    dirty: Vec<DirtyRange>,

    vertex_buffer: BufferHandle,
    slot_id_buffer: BufferHandle,
    color_buffer: BufferHandle,
    index_buffer: BufferHandle,
    transform_buffer: BufferHandle,
}

impl GeometryStore {
    pub fn new<B: GraphicsBackend>(
        backend: &mut B,
        capacity: u32,
        max_vertices: u32,
        max_indices: u32,
    ) -> BatchResult<Self> {
        let vertex_count = capacity as usize * max_vertices as usize;
        let index_count = capacity as usize * max_indices as usize;

        let vertex_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Tile Vertex Buffer".into()),
            size: (vertex_count * std::mem::size_of::<TileVertex>()) as u64,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;
        let slot_id_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Tile Slot Id Buffer".into()),
            size: (vertex_count * std::mem::size_of::<u32>()) as u64,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;
        let color_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Tile Debug Color Buffer".into()),
            size: (vertex_count * 4) as u64,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;
        let index_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Tile Index Buffer".into()),
            size: (index_count * std::mem::size_of::<u32>()) as u64,
            usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;
        let transform_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Tile Transform Buffer".into()),
            size: (capacity as usize * std::mem::size_of::<Mat4>()) as u64,
            usage: BufferUsage::STORAGE | BufferUsage::COPY_DST,
            mapped_at_creation: false,
        })?;

        let slots = (0..capacity)
            .map(|_| Slot {
                state: SlotState::Free,
                visible: false,
                has_debug_color: false,
            })
            .collect();

        Ok(Self {
            max_vertices,
            max_indices,
            vertex_data: vec![TileVertex::default(); vertex_count],
            slot_id_data: vec![0; vertex_count],
            color_data: vec![[0; 4]; vertex_count],
            index_data: vec![0; index_count],
            transform_data: vec![Mat4::IDENTITY; capacity as usize],
            slots,
            dirty: Vec::new(),
            vertex_buffer,
            slot_id_buffer,
            color_buffer,
            index_buffer,
            transform_buffer,
        })
    }

    pub fn max_vertices(&self) -> u32 {
        self.max_vertices
    }

    pub fn max_indices(&self) -> u32 {
        self.max_indices
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    pub fn slot_id_buffer(&self) -> BufferHandle {
        self.slot_id_buffer
    }

    pub fn color_buffer(&self) -> BufferHandle {
        self.color_buffer
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    pub fn transform_buffer(&self) -> BufferHandle {
        self.transform_buffer
    }

    /// Check geometry against the per-slot budget without touching state
    pub fn check_budget(&self, geometry: &TileGeometry) -> BatchResult<()> {
        if geometry.vertex_count() > self.max_vertices as usize
            || geometry.index_count() > self.max_indices as usize
        {
            return Err(BatchError::GeometryTooLarge {
                vertices: geometry.vertex_count(),
                indices: geometry.index_count(),
                max_vertices: self.max_vertices,
                max_indices: self.max_indices,
            });
        }
        Ok(())
    }

    /// Copy geometry into the slot's region and mark the touched ranges dirty
    ///
    /// Indices are rebased by the slot's vertex base so they address the
    /// shared vertex buffer directly. Stale data from a previous occupant is
    /// simply overwritten; anything past the new counts is never drawn.
    pub fn bind_geometry(
        &mut self,
        id: SlotId,
        geometry: &TileGeometry,
        slot_id_stream: &[u32],
    ) -> BatchResult<()> {
        self.check_budget(geometry)?;
        debug_assert_eq!(slot_id_stream.len(), self.max_vertices as usize);

        let base_v = id.index() * self.max_vertices as usize;
        let base_i = id.index() * self.max_indices as usize;
        let vertex_count = geometry.vertex_count();
        let index_count = geometry.index_count();

        self.vertex_data[base_v..base_v + vertex_count].copy_from_slice(&geometry.vertices);
        self.slot_id_data[base_v..base_v + slot_id_stream.len()].copy_from_slice(slot_id_stream);

        for (dst, &src) in self.index_data[base_i..base_i + index_count]
            .iter_mut()
            .zip(geometry.indices.iter())
        {
            *dst = src + base_v as u32;
        }

        self.dirty.push(DirtyRange {
            stream: Stream::Vertex,
            start: base_v,
            count: vertex_count,
        });
        self.dirty.push(DirtyRange {
            stream: Stream::SlotId,
            start: base_v,
            count: self.max_vertices as usize,
        });
        self.dirty.push(DirtyRange {
            stream: Stream::Index,
            start: base_i,
            count: index_count,
        });

        self.slots[id.index()].state = SlotState::Bound {
            vertex_count,
            index_count,
        };
        Ok(())
    }

    pub fn has_debug_color(&self, id: SlotId) -> bool {
        self.slots[id.index()].has_debug_color
    }

    /// Fill the slot's whole color region with one color
    pub fn fill_debug_color(&mut self, id: SlotId, color: [u8; 4]) {
        let base_v = id.index() * self.max_vertices as usize;
        let count = self.max_vertices as usize;
        self.color_data[base_v..base_v + count].fill(color);
        self.slots[id.index()].has_debug_color = true;
        self.dirty.push(DirtyRange {
            stream: Stream::Color,
            start: base_v,
            count,
        });
    }

    pub fn set_transform(&mut self, id: SlotId, transform: Mat4) -> BatchResult<()> {
        self.bound_counts(id)?;
        self.transform_data[id.index()] = transform;
        self.dirty.push(DirtyRange {
            stream: Stream::Transform,
            start: id.index(),
            count: 1,
        });
        Ok(())
    }

    pub fn transform_of(&self, id: SlotId) -> Mat4 {
        self.transform_data[id.index()]
    }

    pub fn set_visible(&mut self, id: SlotId, visible: bool) -> BatchResult<()> {
        self.bound_counts(id)?;
        self.slots[id.index()].visible = visible;
        Ok(())
    }

    pub fn is_visible(&self, id: SlotId) -> bool {
        self.slots[id.index()].visible
    }

    pub fn release(&mut self, id: SlotId) -> BatchResult<()> {
        self.bound_counts(id)?;
        let slot = &mut self.slots[id.index()];
        slot.state = SlotState::Free;
        slot.visible = false;
        slot.has_debug_color = false;
        Ok(())
    }

    /// Visible bound slots with their index draw ranges
    pub fn visible_slots(&self) -> impl Iterator<Item = (SlotId, u32, u32)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            if !slot.visible {
                return None;
            }
            match slot.state {
                SlotState::Bound { index_count, .. } => {
                    let start = i as u32 * self.max_indices;
                    Some((SlotId::new(i as u32), start, index_count as u32))
                }
                SlotState::Free => None,
            }
        })
    }

    /// Upload all dirty ranges, one coalesced write per stream
    pub fn flush_ranges<B: GraphicsBackend>(&mut self, backend: &mut B) {
        for stream in [
            Stream::Vertex,
            Stream::SlotId,
            Stream::Color,
            Stream::Index,
            Stream::Transform,
        ] {
            let mut start = usize::MAX;
            let mut end = 0usize;
            for range in self.dirty.iter().filter(|r| r.stream == stream) {
                start = start.min(range.start);
                end = end.max(range.start + range.count);
            }
            if start >= end {
                continue;
            }

            match stream {
                Stream::Vertex => {
                    let bytes = bytemuck::cast_slice(&self.vertex_data[start..end]);
                    let offset = (start * std::mem::size_of::<TileVertex>()) as u64;
                    backend.write_buffer(self.vertex_buffer, offset, bytes);
                }
                Stream::SlotId => {
                    let bytes = bytemuck::cast_slice(&self.slot_id_data[start..end]);
                    backend.write_buffer(self.slot_id_buffer, (start * 4) as u64, bytes);
                }
                Stream::Color => {
                    let bytes = bytemuck::cast_slice(&self.color_data[start..end]);
                    backend.write_buffer(self.color_buffer, (start * 4) as u64, bytes);
                }
                Stream::Index => {
                    let bytes = bytemuck::cast_slice(&self.index_data[start..end]);
                    backend.write_buffer(self.index_buffer, (start * 4) as u64, bytes);
                }
                Stream::Transform => {
                    let bytes = bytemuck::cast_slice(&self.transform_data[start..end]);
                    let offset = (start * std::mem::size_of::<Mat4>()) as u64;
                    backend.write_buffer(self.transform_buffer, offset, bytes);
                }
            }
        }
        self.dirty.clear();
    }

    pub fn has_dirty_ranges(&self) -> bool {
        !self.dirty.is_empty()
    }

    fn bound_counts(&self, id: SlotId) -> BatchResult<(usize, usize)> {
        match self.slots[id.index()].state {
            SlotState::Bound {
                vertex_count,
                index_count,
            } => Ok((vertex_count, index_count)),
            SlotState::Free => Err(BatchError::InvalidState(id)),
        }
    }

    #[cfg(test)]
    pub(crate) fn index_data(&self) -> &[u32] {
        &self.index_data
    }
}
