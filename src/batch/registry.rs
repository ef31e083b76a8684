//! Bidirectional mesh to slot mapping

use super::allocator::SlotId;
use super::{BatchError, BatchResult};
use std::collections::HashMap;

/// Caller-side identifier of a tile mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Tracks which mesh occupies which slot, in both directions
#[derive(Default)]
pub struct SlotRegistry {
    mesh_to_slot: HashMap<MeshHandle, SlotId>,
    slot_to_mesh: HashMap<SlotId, MeshHandle>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, mesh: MeshHandle, slot: SlotId) -> BatchResult<()> {
        if self.mesh_to_slot.contains_key(&mesh) {
            return Err(BatchError::DuplicateMesh(mesh));
        }
        self.mesh_to_slot.insert(mesh, slot);
        self.slot_to_mesh.insert(slot, mesh);
        Ok(())
    }

    pub fn slot_of(&self, mesh: MeshHandle) -> Option<SlotId> {
        self.mesh_to_slot.get(&mesh).copied()
    }

    pub fn mesh_of(&self, slot: SlotId) -> Option<MeshHandle> {
        self.slot_to_mesh.get(&slot).copied()
    }

    pub fn contains(&self, mesh: MeshHandle) -> bool {
        self.mesh_to_slot.contains_key(&mesh)
    }

    /// Remove the mapping for a mesh, returning its slot
    pub fn unbind(&mut self, mesh: MeshHandle) -> Option<SlotId> {
        let slot = self.mesh_to_slot.remove(&mesh)?;
        self.slot_to_mesh.remove(&slot);
        Some(slot)
    }

    pub fn len(&self) -> usize {
        self.mesh_to_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh_to_slot.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_lookup_both_ways() {
        let mut registry = SlotRegistry::new();
        let mesh = MeshHandle(7);
        let slot = SlotId::new(3);

        registry.bind(mesh, slot).unwrap();
        assert_eq!(registry.slot_of(mesh), Some(slot));
        assert_eq!(registry.mesh_of(slot), Some(mesh));
    }

    #[test]
    fn duplicate_bind_rejected() {
        let mut registry = SlotRegistry::new();
        let mesh = MeshHandle(1);
        registry.bind(mesh, SlotId::new(0)).unwrap();
        assert!(matches!(
            registry.bind(mesh, SlotId::new(1)),
            Err(BatchError::DuplicateMesh(_))
        ));
        // Original mapping untouched
        assert_eq!(registry.slot_of(mesh), Some(SlotId::new(0)));
    }

    #[test]
    fn unbind_clears_both_directions() {
        let mut registry = SlotRegistry::new();
        let mesh = MeshHandle(2);
        let slot = SlotId::new(5);
        registry.bind(mesh, slot).unwrap();

        assert_eq!(registry.unbind(mesh), Some(slot));
        assert_eq!(registry.slot_of(mesh), None);
        assert_eq!(registry.mesh_of(slot), None);
        assert_eq!(registry.unbind(mesh), None);
    }
}
