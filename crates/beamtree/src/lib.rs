//! # Beamtree
//!
//! Prefix tree of live beam search paths for latency-bound sequence decoding
//! (CTC-style speech and sequence decoders).
//!
//! This crate provides:
//! - **Fixed-capacity ring allocator**: no heap allocation after construction
//! - **Intrusive prefix tree** with first-child/sibling links between slots
//! - **Amortized O(1) garbage collection** charged to the release that causes it
//! - **Detached prefix store** keeping full history reconstructible after slot reuse
//!
//! The tree only stores and prunes paths on request. Scoring, beam selection
//! and batching belong to the caller; run one tree per decode stream.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod tree;

pub use error::{BeamTreeError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::TreeConfig;
    pub use crate::error::{BeamTreeError, Result};
    pub use crate::tree::{BeamTree, Child, Label, NodeIndex, PathStep, NO_LABEL};
}
