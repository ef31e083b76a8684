//! Slot id allocation with reuse

use super::{BatchError, BatchResult};

/// Identifier of a geometry slot inside the shared buffers
///
/// Slot ids double as the layer index of the tile's texture and as the value
/// stamped into the per-vertex slot id stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u32);

impl SlotId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Fixed-capacity slot id allocator
///
/// Fresh ids are handed out in increasing order until the capacity is
/// reached; released ids are reused in last-in first-out order.
pub struct SlotAllocator {
    capacity: u32,
    next: u32,
    free: Vec<SlotId>,
    live: Vec<bool>,
}

impl SlotAllocator {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            next: 0,
            free: Vec::new(),
            live: vec![false; capacity as usize],
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of slots currently allocated
    pub fn live_count(&self) -> u32 {
        self.next - self.free.len() as u32
    }

    pub fn allocate(&mut self) -> BatchResult<SlotId> {
        let id = if let Some(id) = self.free.pop() {
            id
        } else if self.next < self.capacity {
            let id = SlotId::new(self.next);
            self.next += 1;
            id
        } else {
            return Err(BatchError::CapacityExceeded(self.capacity));
        };

        self.live[id.index()] = true;
        Ok(id)
    }

    pub fn release(&mut self, id: SlotId) -> BatchResult<()> {
        if id.get() >= self.capacity || !self.live[id.index()] {
            return Err(BatchError::InvalidState(id));
        }
        self.live[id.index()] = false;
        self.free.push(id);
        Ok(())
    }

    pub fn is_live(&self, id: SlotId) -> bool {
        id.get() < self.capacity && self.live[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_in_order() {
        let mut alloc = SlotAllocator::new(4);
        assert_eq!(alloc.allocate().unwrap().get(), 0);
        assert_eq!(alloc.allocate().unwrap().get(), 1);
        assert_eq!(alloc.allocate().unwrap().get(), 2);
        assert_eq!(alloc.live_count(), 3);
    }

    #[test]
    fn reuses_released_ids_lifo() {
        let mut alloc = SlotAllocator::new(8);
        let a = alloc.allocate().unwrap();
        let b = alloc.allocate().unwrap();
        alloc.allocate().unwrap();

        alloc.release(a).unwrap();
        alloc.release(b).unwrap();

        assert_eq!(alloc.allocate().unwrap(), b);
        assert_eq!(alloc.allocate().unwrap(), a);
    }

    #[test]
    fn capacity_exceeded() {
        let mut alloc = SlotAllocator::new(2);
        alloc.allocate().unwrap();
        alloc.allocate().unwrap();
        assert!(matches!(
            alloc.allocate(),
            Err(BatchError::CapacityExceeded(2))
        ));

        // Releasing makes room again
        alloc.release(SlotId::new(0)).unwrap();
        assert_eq!(alloc.allocate().unwrap().get(), 0);
    }

    #[test]
    fn double_release_is_an_error() {
        let mut alloc = SlotAllocator::new(2);
        let id = alloc.allocate().unwrap();
        alloc.release(id).unwrap();
        assert!(matches!(
            alloc.release(id),
            Err(BatchError::InvalidState(_))
        ));
    }

    #[test]
    fn release_of_never_allocated_is_an_error() {
        let mut alloc = SlotAllocator::new(2);
        assert!(alloc.release(SlotId::new(1)).is_err());
        assert!(alloc.release(SlotId::new(5)).is_err());
    }
}
