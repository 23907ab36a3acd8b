//! Beam tree state management.

use super::node::{DetachedEntry, Label, Node, NodeIndex, PathStep, NO_LABEL};
use super::ring::RingAllocator;
use crate::config::TreeConfig;
use crate::error::{BeamTreeError, Result};
use tracing::{debug, trace, warn};

/// Outcome of a get-or-create lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child {
    /// Index of the child node.
    pub index: NodeIndex,
    /// True if the node was allocated by this call.
    pub created: bool,
}

impl Child {
    /// Sentinel for "no child could be produced".
    pub const NONE: Child = Child {
        index: NodeIndex::NONE,
        created: false,
    };

    /// Check if this is the sentinel.
    pub fn is_none(&self) -> bool {
        !self.index.is_valid()
    }
}

/// Info about a resident node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Node index.
    pub index: NodeIndex,
    /// Label on the edge into the node.
    pub label: Label,
    /// Parent index, `NodeIndex::NONE` for the current root.
    pub parent: NodeIndex,
    /// Outstanding claims on the node.
    pub reference_count: u32,
    /// Whether the node is a live beam endpoint.
    pub is_active: bool,
}

/// Occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes resident in the ring buffer.
    pub size: usize,
    /// Padded ring capacity.
    pub capacity: usize,
    /// Entries in the detached prefix store.
    pub detached: usize,
    /// Resident nodes that are live beam endpoints.
    pub active: usize,
}

/// Prefix tree of live beams over a fixed ring of node slots.
///
/// Nodes are allocated in creation order at the right edge of the ring and
/// reclaimed in the same order from the left edge once no live beam needs
/// them. The oldest resident node is always the root: the common ancestor of
/// every live beam. Ancestors above it are moved into an append-only detached
/// store so that whole paths can still be reconstructed.
///
/// After construction nothing here allocates except the detached store, which
/// only grows when the common ancestor moves forward.
#[derive(Debug)]
pub struct BeamTree<E> {
    nodes: Box<[Node<E>]>,
    ring: RingAllocator,
    detached: Vec<DetachedEntry<E>>,
}

impl<E: Default> BeamTree<E> {
    /// Create a tree holding at least `capacity` nodes.
    ///
    /// The capacity is rounded up to the next power of two. The root is
    /// installed with a default payload.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(TreeConfig::with_capacity(capacity))
    }

    /// Create a tree from a configuration.
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        let padded = config.padded_capacity()?;
        let nodes: Box<[Node<E>]> = (0..padded).map(|_| Node::default()).collect();

        let mut tree = Self {
            nodes,
            ring: RingAllocator::new(padded as u32),
            detached: Vec::with_capacity(config.detached_reserve),
        };
        tree.reset(E::default());

        debug!(
            requested = config.capacity,
            capacity = padded,
            "beam tree initialized"
        );
        Ok(tree)
    }

    /// Get the child of `parent` reached by `label`, creating it if needed.
    ///
    /// A found child is (re)activated; a created child starts active with a
    /// default payload. Fails with [`BeamTreeError::CapacityExceeded`] when a
    /// new node is needed and every slot is in use, leaving the tree untouched.
    /// A parent that is not resident, or that was released and holds no claims,
    /// is rejected with [`BeamTreeError::InvalidNode`].
    pub fn get_child(&mut self, parent: NodeIndex, label: Label) -> Result<Child> {
        self.get_child_with(parent, label, E::default)
    }

    /// Like [`get_child`](Self::get_child), but reports any failure as
    /// [`Child::NONE`].
    pub fn get_child_or_none(&mut self, parent: NodeIndex, label: Label) -> Child {
        self.get_child(parent, label).unwrap_or(Child::NONE)
    }

    /// Release the beam ending at `index`.
    ///
    /// Claims are dropped up the path for every ancestor left without one, then
    /// unneeded nodes are reclaimed from the left edge of the ring. The new
    /// oldest node becomes the root; a reclaimed ancestor that was still shared
    /// by all live beams is moved to the detached store.
    ///
    /// Releasing a node that is not a live beam endpoint is a bookkeeping bug in
    /// the caller and fails with [`BeamTreeError::InvalidRelease`] without
    /// modifying the tree.
    pub fn delete_entry(&mut self, index: NodeIndex) -> Result<()> {
        self.check_resident(index)?;

        let node = &mut self.nodes[index.slot()];
        if !node.active || node.refcount == 0 {
            warn!(%index, refcount = node.refcount, "release of a node with no live beam");
            return Err(BeamTreeError::InvalidRelease { index: index.0 });
        }
        node.active = false;
        node.refcount -= 1;

        let mut current = index;
        while self.nodes[current.slot()].refcount == 0 {
            current = self.nodes[current.slot()].parent;
            if !current.is_valid() {
                break;
            }
            if self.nodes[current.slot()].release_ref().is_none() {
                warn!(index = %current, "ancestor released with no outstanding claims");
                return Err(BeamTreeError::InvalidRelease { index: current.0 });
            }
        }

        self.reclaim_front();
        Ok(())
    }

    /// Pop reclaimable nodes off the left edge of the ring.
    fn reclaim_front(&mut self) {
        let mut reclaimed = 0u32;

        while !self.ring.is_empty() {
            let front = self.ring.front();
            let node = &mut self.nodes[front.slot()];
            if !node.is_reclaimable() {
                break;
            }
            if node.refcount == 1 {
                trace!(index = %front, label = node.label, "detaching shared prefix node");
                self.detached.push(DetachedEntry {
                    label: node.label,
                    entry: std::mem::take(&mut node.entry),
                });
            }
            self.ring.pop_front();
            reclaimed += 1;
        }

        if reclaimed == 0 {
            return;
        }
        if !self.ring.is_empty() {
            let root = self.ring.front();
            self.nodes[root.slot()].make_root();
        }
        trace!(
            reclaimed,
            size = self.ring.len(),
            root = %self.root(),
            "reclaimed slots from ring front"
        );
    }
}

impl<E> BeamTree<E> {
    /// Reinitialize the tree around a fresh root carrying `root_entry`.
    ///
    /// The ring buffer is reused; the detached store is emptied but keeps its
    /// allocation. Returns the root index, always [`NodeIndex::ROOT`].
    pub fn reset(&mut self, root_entry: E) -> NodeIndex {
        self.detached.clear();
        let root = self.ring.restart();
        self.nodes[root.slot()].install(NO_LABEL, NodeIndex::NONE, NodeIndex::NONE, root_entry);
        debug!(capacity = self.capacity(), "beam tree reset");
        root
    }

    /// Alias of [`reset`](Self::reset).
    pub fn initialize_tree(&mut self, root_entry: E) -> NodeIndex {
        self.reset(root_entry)
    }

    /// Get-or-create with an explicit payload constructor.
    ///
    /// `make_entry` only runs when a node is created.
    pub fn get_child_with<F>(&mut self, parent: NodeIndex, label: Label, make_entry: F) -> Result<Child>
    where
        F: FnOnce() -> E,
    {
        self.check_resident(parent)?;
        // A parent with no claims is waiting to be reclaimed; nothing would
        // hold its ancestors for a new child.
        if self.nodes[parent.slot()].refcount == 0 {
            return Err(BeamTreeError::InvalidNode { index: parent.0 });
        }

        if let Some(index) = self.find_child(parent, label) {
            self.reactivate(index);
            return Ok(Child {
                index,
                created: false,
            });
        }

        let Some(index) = self.ring.allocate() else {
            debug!(%parent, label, capacity = self.capacity(), "beam tree full");
            return Err(BeamTreeError::CapacityExceeded {
                capacity: self.ring.capacity(),
            });
        };

        let sibling = self.nodes[parent.slot()].first_child;
        self.nodes[index.slot()].install(label, parent, sibling, make_entry());

        let parent_node = &mut self.nodes[parent.slot()];
        parent_node.first_child = index;
        parent_node.add_ref();

        Ok(Child {
            index,
            created: true,
        })
    }

    /// Linear scan of the intrusive child list.
    fn find_child(&self, parent: NodeIndex, label: Label) -> Option<NodeIndex> {
        self.children(parent)
            .find(|&child| self.nodes[child.slot()].label == label)
    }

    /// Restore the self-claim of a previously released node.
    ///
    /// A node whose count had dropped to zero had also given up its claim on
    /// its parent, so claims are restored upward until an ancestor that was
    /// still held.
    fn reactivate(&mut self, index: NodeIndex) {
        if self.nodes[index.slot()].active {
            return;
        }
        self.nodes[index.slot()].active = true;

        let mut current = index;
        loop {
            let node = &mut self.nodes[current.slot()];
            node.add_ref();
            if node.refcount > 1 || node.is_root() {
                break;
            }
            current = node.parent;
        }
    }

    /// Full path from the oldest detached ancestor down to `index`.
    ///
    /// Includes the sentinel root while it is still on the path. Never
    /// modifies the tree.
    pub fn backtrace(&self, index: NodeIndex) -> Result<Vec<PathStep<'_, E>>> {
        self.check_resident(index)?;

        let mut path: Vec<PathStep<'_, E>> = self
            .detached
            .iter()
            .map(|d| PathStep {
                label: d.label,
                entry: &d.entry,
            })
            .collect();
        let start = path.len();

        for current in self.ancestors(index)? {
            let node = &self.nodes[current.slot()];
            path.push(PathStep {
                label: node.label,
                entry: &node.entry,
            });
        }
        path[start..].reverse();
        Ok(path)
    }

    /// Labels along the path to `index`, sentinel labels omitted.
    pub fn backtrace_labels(&self, index: NodeIndex) -> Result<Vec<Label>> {
        let mut labels = Vec::new();
        self.backtrace_labels_into(index, &mut labels)?;
        Ok(labels)
    }

    /// Write the labels along the path to `index` into `out`, replacing its
    /// contents. Reusing `out` across calls avoids reallocating.
    pub fn backtrace_labels_into(&self, index: NodeIndex, out: &mut Vec<Label>) -> Result<()> {
        out.clear();
        let ancestors = self.ancestors(index)?;

        out.extend(
            self.detached
                .iter()
                .map(|d| d.label)
                .filter(|&label| label != NO_LABEL),
        );
        let start = out.len();
        out.extend(
            ancestors
                .map(|current| self.nodes[current.slot()].label)
                .filter(|&label| label != NO_LABEL),
        );
        out[start..].reverse();
        Ok(())
    }

    /// Resident nodes from `index` up to the root, leaf first.
    fn ancestors(&self, index: NodeIndex) -> Result<Ancestors<'_, E>> {
        let mut current = index;
        let mut position = self
            .ring
            .position(index)
            .ok_or(BeamTreeError::InvalidNode { index: index.0 })?;
        // Parents are always older than their children. A parent link that
        // points at a newer slot was left behind by a reclaimed ancestor whose
        // slot has since been reused.
        while !self.nodes[current.slot()].is_root() {
            current = self.nodes[current.slot()].parent;
            match self.ring.position(current) {
                Some(parent_position) if parent_position < position => position = parent_position,
                _ => return Err(BeamTreeError::InvalidNode { index: index.0 }),
            }
        }
        Ok(Ancestors {
            tree: self,
            next: index,
        })
    }

    /// Iterate over the children of `index`, newest first.
    ///
    /// Yields nothing for non-resident indices.
    pub fn children(&self, index: NodeIndex) -> Children<'_, E> {
        let next = if self.ring.contains(index) {
            self.nodes[index.slot()].first_child
        } else {
            NodeIndex::NONE
        };
        Children { tree: self, next }
    }

    /// Info about a resident node.
    pub fn node(&self, index: NodeIndex) -> Option<NodeInfo> {
        self.resident(index).map(|n| NodeInfo {
            index,
            label: n.label,
            parent: n.parent,
            reference_count: n.refcount,
            is_active: n.active,
        })
    }

    /// Payload of a resident node.
    pub fn entry(&self, index: NodeIndex) -> Option<&E> {
        self.resident(index).map(|n| &n.entry)
    }

    /// Mutable payload of a resident node.
    pub fn entry_mut(&mut self, index: NodeIndex) -> Option<&mut E> {
        if self.ring.contains(index) {
            Some(&mut self.nodes[index.slot()].entry)
        } else {
            None
        }
    }

    /// Whether `index` is a resident, live beam endpoint.
    pub fn is_active(&self, index: NodeIndex) -> bool {
        self.resident(index).is_some_and(|n| n.active)
    }

    /// Whether `index` names a slot currently in use.
    pub fn is_resident(&self, index: NodeIndex) -> bool {
        self.ring.contains(index)
    }

    /// Resident node indices, oldest first.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.ring.iter()
    }

    /// Current root: the oldest resident node, or `NodeIndex::NONE` once
    /// every node has been released.
    pub fn root(&self) -> NodeIndex {
        if self.ring.is_empty() {
            NodeIndex::NONE
        } else {
            self.ring.front()
        }
    }

    /// Number of nodes resident in the ring buffer, detached entries excluded.
    pub fn size(&self) -> usize {
        self.ring.len() as usize
    }

    /// Whether every node has been released.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Padded capacity of the ring buffer.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Detached ancestors, oldest first.
    pub fn detached(&self) -> &[DetachedEntry<E>] {
        &self.detached
    }

    /// Number of detached ancestors.
    pub fn detached_len(&self) -> usize {
        self.detached.len()
    }

    /// Occupancy snapshot.
    ///
    /// Counting active nodes walks every resident slot, so this is O(size);
    /// keep it off the per-frame hot path.
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            size: self.size(),
            capacity: self.capacity(),
            detached: self.detached.len(),
            active: self
                .ring
                .iter()
                .filter(|i| self.nodes[i.slot()].active)
                .count(),
        }
    }

    fn resident(&self, index: NodeIndex) -> Option<&Node<E>> {
        if self.ring.contains(index) {
            Some(&self.nodes[index.slot()])
        } else {
            None
        }
    }

    fn check_resident(&self, index: NodeIndex) -> Result<()> {
        if self.ring.contains(index) {
            Ok(())
        } else {
            Err(BeamTreeError::InvalidNode { index: index.0 })
        }
    }
}

/// Iterator over a node's intrusive child list.
#[derive(Debug)]
pub struct Children<'a, E> {
    tree: &'a BeamTree<E>,
    next: NodeIndex,
}

impl<E> Iterator for Children<'_, E> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.nodes[current.slot()].sibling;
        Some(current)
    }
}

/// Walk from a node up to the root via parent links.
struct Ancestors<'a, E> {
    tree: &'a BeamTree<E>,
    next: NodeIndex,
}

impl<E> Iterator for Ancestors<'_, E> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.nodes[current.slot()].parent;
        Some(current)
    }
}
