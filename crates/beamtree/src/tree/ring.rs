//! Circular slot allocator.

use super::node::NodeIndex;

/// Cursor bookkeeping for a power-of-two ring of node slots.
///
/// Slots are handed out strictly at `right` and reclaimed strictly at `left`,
/// so the resident slots are always the contiguous run `left..left + size`
/// (modulo capacity), oldest first.
#[derive(Debug, Clone)]
pub(crate) struct RingAllocator {
    left: u32,
    right: u32,
    size: u32,
    mask: u32,
}

impl RingAllocator {
    /// Create an allocator over `capacity` slots. `capacity` must be a power of two.
    pub(crate) fn new(capacity: u32) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            left: 0,
            right: 0,
            size: 0,
            mask: capacity - 1,
        }
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.mask + 1
    }

    pub(crate) fn len(&self) -> u32 {
        self.size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub(crate) fn is_full(&self) -> bool {
        self.size > 0 && self.right == self.left
    }

    /// Oldest resident slot.
    pub(crate) fn front(&self) -> NodeIndex {
        NodeIndex(self.left)
    }

    /// Forget every slot and hand out slot 0 as the only resident one.
    pub(crate) fn restart(&mut self) -> NodeIndex {
        self.left = 0;
        self.right = 1 & self.mask;
        self.size = 1;
        NodeIndex(0)
    }

    /// Claim the next slot at the right edge.
    pub(crate) fn allocate(&mut self) -> Option<NodeIndex> {
        if self.is_full() {
            return None;
        }
        let slot = NodeIndex(self.right);
        self.right = (self.right + 1) & self.mask;
        self.size += 1;
        Some(slot)
    }

    /// Release the oldest slot at the left edge.
    pub(crate) fn pop_front(&mut self) -> Option<NodeIndex> {
        if self.is_empty() {
            return None;
        }
        let slot = NodeIndex(self.left);
        self.left = (self.left + 1) & self.mask;
        self.size -= 1;
        Some(slot)
    }

    /// Whether `index` currently names an allocated slot.
    pub(crate) fn contains(&self, index: NodeIndex) -> bool {
        index.0 <= self.mask && (index.0.wrapping_sub(self.left) & self.mask) < self.size
    }

    /// Position of a resident slot counted from the left edge; older slots
    /// have smaller positions.
    pub(crate) fn position(&self, index: NodeIndex) -> Option<u32> {
        if self.contains(index) {
            Some(index.0.wrapping_sub(self.left) & self.mask)
        } else {
            None
        }
    }

    /// Resident slots, oldest first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.size).map(move |offset| NodeIndex((self.left + offset) & self.mask))
    }
}
