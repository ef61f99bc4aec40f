//! # bdp-pool
//!
//! A chunked object pool for fixed-size records.
//!
//! Objects live in chunks of `objects_per_chunk` slots. Each chunk keeps an
//! intrusive free list of its unused slots, so allocation and release are
//! O(1) once the owning chunk is found. A chunk is created only when every
//! existing chunk is full and is handed back to its memory backend the moment
//! its last outstanding object is released.
//!
//! Every byte the pool takes is charged to a [`MemoryBackend`]. The default
//! [`SystemBackend`] only reports real heap exhaustion; [`CountingBackend`]
//! tracks live allocations and can be armed to fail, which is how callers
//! prove that their error paths release everything.
//!
//! ```
//! use bdp_pool::Pool;
//!
//! let mut pool: Pool<u64> = Pool::new(4).unwrap();
//! let a = pool.allocate(1).unwrap();
//! let b = pool.allocate(2).unwrap();
//! assert_eq!(pool.get(b), Some(&2));
//! assert_eq!(pool.release(a).unwrap(), 1);
//! assert_eq!(pool.release(b).unwrap(), 2);
//! assert_eq!(pool.chunk_count(), 0);
//! ```

pub mod backend;
pub mod error;
pub mod pool;

pub use backend::{
    system, try_vec, AccountedVec, CountingBackend, MemoryBackend, Reservation, SharedBackend,
    SystemBackend,
};
pub use error::AllocError;
pub use pool::{Pool, SlotHandle};
