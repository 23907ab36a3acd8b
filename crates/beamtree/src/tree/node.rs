//! Node slot representation.

use std::fmt;

/// Symbol emitted on the edge into a node.
pub type Label = u16;

/// Label carried by the sentinel root.
pub const NO_LABEL: Label = Label::MAX;

/// Index of a node slot in the ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Index of the root installed by a reset.
    pub const ROOT: NodeIndex = NodeIndex(0);

    /// Invalid/null node index.
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    /// Check if this is a valid node index.
    pub fn is_valid(&self) -> bool {
        *self != Self::NONE
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("none")
        }
    }
}

impl From<u32> for NodeIndex {
    fn from(index: u32) -> Self {
        NodeIndex(index)
    }
}

impl From<NodeIndex> for u32 {
    fn from(index: NodeIndex) -> Self {
        index.0
    }
}

/// A slot in the ring buffer.
///
/// Children form an intrusive singly-linked list: `first_child` heads it and
/// each child points at the next through `sibling`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node<E> {
    /// Outstanding claims: one per live child plus the self-claim while active.
    pub(crate) refcount: u32,
    /// Whether this node is the endpoint of a live beam.
    pub(crate) active: bool,
    pub(crate) first_child: NodeIndex,
    pub(crate) sibling: NodeIndex,
    pub(crate) parent: NodeIndex,
    pub(crate) label: Label,
    pub(crate) entry: E,
}

impl<E> Node<E> {
    /// Overwrite this slot with a fresh active node.
    pub(crate) fn install(&mut self, label: Label, parent: NodeIndex, sibling: NodeIndex, entry: E) {
        self.refcount = 1;
        self.active = true;
        self.first_child = NodeIndex::NONE;
        self.sibling = sibling;
        self.parent = parent;
        self.label = label;
        self.entry = entry;
    }

    /// Add one claim.
    #[inline]
    pub(crate) fn add_ref(&mut self) {
        self.refcount += 1;
    }

    /// Drop one claim, returning the remaining count.
    ///
    /// Returns `None` if there was no claim to drop.
    #[inline]
    pub(crate) fn release_ref(&mut self) -> Option<u32> {
        self.refcount = self.refcount.checked_sub(1)?;
        Some(self.refcount)
    }

    /// Cut off the history above this node.
    #[inline]
    pub(crate) fn make_root(&mut self) {
        self.parent = NodeIndex::NONE;
    }

    #[inline]
    pub(crate) fn is_root(&self) -> bool {
        !self.parent.is_valid()
    }

    /// Eligible for reclamation from the left edge of the ring.
    ///
    /// Either wholly dead, or inactive with a single claim, which makes it
    /// the soon-to-be-superseded common ancestor.
    #[inline]
    pub(crate) fn is_reclaimable(&self) -> bool {
        !self.active && self.refcount <= 1
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        Self::NONE
    }
}

/// Snapshot of an ancestor evicted from the ring buffer while still part of
/// every live beam's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedEntry<E> {
    /// Label of the evicted node.
    pub label: Label,
    /// Payload moved out of the evicted slot.
    pub entry: E,
}

/// One step of a reconstructed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep<'a, E> {
    /// Label on the edge into this step; `NO_LABEL` for the sentinel root.
    pub label: Label,
    /// Payload stored at this step.
    pub entry: &'a E,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_not_valid() {
        assert!(!NodeIndex::NONE.is_valid());
        assert!(NodeIndex::ROOT.is_valid());
        assert_eq!(NodeIndex::default(), NodeIndex::NONE);
    }

    #[test]
    fn display_names_sentinel() {
        assert_eq!(NodeIndex(5).to_string(), "5");
        assert_eq!(NodeIndex::NONE.to_string(), "none");
    }

    #[test]
    fn install_resets_links() {
        let mut node: Node<u8> = Node::default();
        node.first_child = NodeIndex(9);
        node.refcount = 4;

        node.install(3, NodeIndex(1), NodeIndex(2), 7);

        assert_eq!(node.refcount, 1);
        assert!(node.active);
        assert_eq!(node.first_child, NodeIndex::NONE);
        assert_eq!(node.sibling, NodeIndex(2));
        assert_eq!(node.parent, NodeIndex(1));
        assert_eq!(node.label, 3);
        assert_eq!(node.entry, 7);
    }

    #[test]
    fn release_ref_refuses_underflow() {
        let mut node: Node<()> = Node::default();
        node.refcount = 1;
        assert_eq!(node.release_ref(), Some(0));
        assert_eq!(node.release_ref(), None);
        assert_eq!(node.refcount, 0);
    }

    #[test]
    fn reclaimable_requires_inactive() {
        let mut node: Node<()> = Node::default();
        node.install(0, NodeIndex::NONE, NodeIndex::NONE, ());
        assert!(!node.is_reclaimable());

        node.active = false;
        assert!(node.is_reclaimable());

        node.add_ref();
        assert!(!node.is_reclaimable());
    }
}
