//! Error types for beam tree operations.

use thiserror::Error;

/// Result type alias for beam tree operations.
pub type Result<T> = std::result::Result<T, BeamTreeError>;

/// Errors that can occur while manipulating a beam tree.
///
/// Variants returned from the search loop carry only integers, so producing
/// one never touches the heap.
#[derive(Error, Debug)]
pub enum BeamTreeError {
    /// The ring buffer is full and a new child cannot be allocated.
    #[error("capacity exceeded: all {capacity} slots are in use")]
    CapacityExceeded {
        /// Padded capacity of the ring buffer.
        capacity: u32,
    },

    /// A beam was released twice, or an index that never was a beam endpoint.
    #[error("invalid release of node {index}: beam already released")]
    InvalidRelease {
        /// Raw index passed to the release.
        index: u32,
    },

    /// Index is the sentinel, out of range, or not resident in the ring buffer.
    #[error("invalid node index: {index}")]
    InvalidNode {
        /// Raw index that failed validation.
        index: u32,
    },

    /// Requested capacity cannot back a tree.
    #[error("invalid capacity: {requested}")]
    InvalidCapacity {
        /// Capacity as requested by the caller.
        requested: usize,
    },

    /// I/O error while reading a configuration file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration document.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl BeamTreeError {
    /// Whether the caller can keep using the tree after this error.
    ///
    /// Only capacity exhaustion is an expected outcome of the search loop;
    /// everything else means the caller's bookkeeping is out of sync.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BeamTreeError::CapacityExceeded { .. })
    }
}
