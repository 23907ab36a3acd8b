//! Tree configuration.

use crate::error::{BeamTreeError, Result};
use serde::{Deserialize, Serialize};

/// Default number of ring buffer slots.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Configuration for a [`BeamTree`](crate::tree::BeamTree).
///
/// ```
/// use beamtree::config::TreeConfig;
///
/// let config: TreeConfig = serde_json::from_str(r#"{ "capacity": 1000 }"#).unwrap();
/// assert_eq!(config.capacity, 1000);
/// assert_eq!(config.padded_capacity().unwrap(), 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Requested number of node slots, rounded up to a power of two.
    pub capacity: usize,
    /// Entries to pre-reserve in the detached prefix store.
    #[serde(default)]
    pub detached_reserve: usize,
}

impl TreeConfig {
    /// Largest padded capacity; keeps every slot index below `NodeIndex::NONE`.
    pub const MAX_CAPACITY: usize = 1 << 31;

    /// Config with the given capacity and no reserve.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Capacity after rounding up to the next power of two.
    pub fn padded_capacity(&self) -> Result<usize> {
        self.validate()?;
        Ok(self.capacity.next_power_of_two())
    }

    /// Check that the capacity can back a tree.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > Self::MAX_CAPACITY {
            return Err(BeamTreeError::InvalidCapacity {
                requested: self.capacity,
            });
        }
        Ok(())
    }

    /// Load from JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            detached_reserve: 0,
        }
    }
}
