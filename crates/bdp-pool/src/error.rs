//! Allocator error type.

/// Failures reported by pools and memory backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// The backend (or the heap) refused a request.
    #[error("out of memory ({requested} bytes requested)")]
    OutOfMemory {
        /// Size of the refused request in bytes.
        requested: usize,
    },

    /// The handle does not name a live slot of this pool.
    #[error("slot not owned by this pool")]
    NotOwned,

    /// A pool was configured with zero objects per chunk.
    #[error("pool chunks must hold at least one object")]
    ZeroCapacity,

    /// Slots are indexed with `u32`, which bounds the chunk size.
    #[error("pool chunks hold at most {max} objects ({requested} requested)", max = u32::MAX)]
    CapacityTooLarge { requested: usize },
}

impl From<AllocError> for bdp_core::Error {
    fn from(e: AllocError) -> Self {
        match e {
            AllocError::OutOfMemory { requested } => bdp_core::Error::OutOfMemory { requested },
            AllocError::NotOwned => bdp_core::Error::NotOwned,
            AllocError::ZeroCapacity | AllocError::CapacityTooLarge { .. } => {
                bdp_core::Error::Validation(e.to_string())
            }
        }
    }
}
