//! Prefix tree of live beam search paths.
//!
//! This module provides:
//! - A fixed-capacity ring of node slots, allocated in creation order
//! - Intrusive parent/child/sibling links between slots
//! - Reference counting with reclamation from the oldest end of the ring
//! - A detached store for shared history evicted from the ring
//!
//! # Overview
//!
//! A decoder extends beams with [`BeamTree::get_child`] and drops them with
//! [`BeamTree::delete_entry`]. Garbage collection runs inside
//! `delete_entry`: every node released there, and every node that becomes
//! unneeded because of it, is paid for by that call.
//!
//! Because nodes are created in temporal order, an ancestor is always older
//! than its descendants. Reclaiming only from the oldest end of the ring
//! therefore never frees a node that a live beam still passes through. The
//! oldest resident node is kept as the root, the lowest common ancestor of
//! all live beams; when it is superseded its label and payload move to the
//! detached store, so [`BeamTree::backtrace`] can still return full paths.
//!
//! # Example
//!
//! ```rust
//! use beamtree::tree::{BeamTree, NodeIndex};
//!
//! let mut tree: BeamTree<f32> = BeamTree::new(16).unwrap();
//! let root = tree.reset(0.0);
//!
//! // Extend the root with two competing labels.
//! let a = tree.get_child(root, 3).unwrap().index;
//! let b = tree.get_child(root, 7).unwrap().index;
//!
//! // Grow one branch and prune the other.
//! let c = tree.get_child(a, 1).unwrap().index;
//! tree.delete_entry(b).unwrap();
//! tree.delete_entry(a).unwrap();
//! tree.delete_entry(root).unwrap();
//!
//! assert_eq!(tree.backtrace_labels(c).unwrap(), vec![3, 1]);
//! assert_eq!(tree.root(), c);
//! ```

mod node;
mod ring;
mod state;

pub use node::{DetachedEntry, Label, NodeIndex, PathStep, NO_LABEL};
pub use state::{BeamTree, Child, Children, NodeInfo, TreeStats};
