//! The chunked object pool.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::{system, try_vec, Reservation, SharedBackend};
use crate::error::AllocError;

/// Bytes of bookkeeping charged per chunk on top of its slots.
const CHUNK_HEADER_BYTES: usize = 3 * std::mem::size_of::<usize>();

/// Chunk ids are unique across every pool in the process, so a handle minted
/// by one pool is never mistaken for a slot of another.
static NEXT_CHUNK_ID: AtomicU64 = AtomicU64::new(1);

/// Names one allocated slot: the owning chunk and the slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    chunk: u64,
    slot: u32,
}

enum Slot<T> {
    Free { next: Option<u32> },
    Used(T),
}

struct Chunk<T> {
    id: u64,
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    free_count: usize,
    _reservation: Reservation,
}

impl<T> Chunk<T> {
    fn new(
        objects: usize,
        object_size: usize,
        backend: &SharedBackend,
    ) -> Result<Self, AllocError> {
        let bytes = object_size
            .checked_mul(objects)
            .and_then(|b| b.checked_add(CHUNK_HEADER_BYTES))
            .ok_or(AllocError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let reservation = Reservation::new(backend, bytes)?;
        let mut slots = try_vec(objects)?;

        // Linked back to front, so the head ends up at slot 0.
        let mut free_head = None;
        slots.resize_with(objects, || Slot::Free { next: None });
        for i in (0..objects as u32).rev() {
            slots[i as usize] = Slot::Free { next: free_head };
            free_head = Some(i);
        }

        Ok(Self {
            id: NEXT_CHUNK_ID.fetch_add(1, Ordering::Relaxed),
            slots,
            free_head,
            free_count: objects,
            _reservation: reservation,
        })
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn take_free(&mut self, value: T) -> u32 {
        let i = match self.free_head {
            Some(i) => i,
            None => unreachable!("take_free on a full chunk"),
        };
        let next = match self.slots[i as usize] {
            Slot::Free { next } => next,
            Slot::Used(_) => unreachable!("free list points at a used slot"),
        };
        self.slots[i as usize] = Slot::Used(value);
        self.free_head = next;
        self.free_count -= 1;
        i
    }

    fn put_free(&mut self, i: u32) -> Option<T> {
        let slot = self.slots.get_mut(i as usize)?;
        if matches!(slot, Slot::Free { .. }) {
            return None;
        }
        let old = std::mem::replace(
            slot,
            Slot::Free {
                next: self.free_head,
            },
        );
        self.free_head = Some(i);
        self.free_count += 1;
        match old {
            Slot::Used(value) => Some(value),
            Slot::Free { .. } => None,
        }
    }
}

/// A pool of `T` objects served from fixed-capacity chunks.
///
/// - Allocation is first-fit across chunks in creation order; a new chunk is
///   created only when all existing ones are full.
/// - A released slot goes to the head of its chunk's free list and is the
///   next one that chunk hands out.
/// - A chunk whose slots are all free again is returned to the backend
///   immediately, wherever it sits in the chunk list.
pub struct Pool<T> {
    backend: SharedBackend,
    objects_per_chunk: usize,
    object_size: usize,
    chunks: Vec<Chunk<T>>,
    live: usize,
}

impl<T> Pool<T> {
    /// Create a pool on the system heap.
    pub fn new(objects_per_chunk: usize) -> Result<Self, AllocError> {
        Self::with_backend(objects_per_chunk, system())
    }

    /// Create a pool charging its chunks to `backend`.
    ///
    /// No chunk is allocated until the first [`Pool::allocate`].
    pub fn with_backend(
        objects_per_chunk: usize,
        backend: SharedBackend,
    ) -> Result<Self, AllocError> {
        if objects_per_chunk == 0 {
            return Err(AllocError::ZeroCapacity);
        }
        if u32::try_from(objects_per_chunk).is_err() {
            return Err(AllocError::CapacityTooLarge {
                requested: objects_per_chunk,
            });
        }
        Ok(Self {
            backend,
            objects_per_chunk,
            object_size: std::mem::size_of::<T>().max(std::mem::size_of::<usize>()),
            chunks: Vec::new(),
            live: 0,
        })
    }

    /// Store `value` in a free slot and return its handle.
    pub fn allocate(&mut self, value: T) -> Result<SlotHandle, AllocError> {
        let pos = match self.chunks.iter().position(|c| c.free_count > 0) {
            Some(pos) => pos,
            None => {
                let chunk = Chunk::new(self.objects_per_chunk, self.object_size, &self.backend)?;
                tracing::trace!(chunk = chunk.id, "pool grew by one chunk");
                self.chunks.push(chunk);
                self.chunks.len() - 1
            }
        };
        let chunk = &mut self.chunks[pos];
        let slot = chunk.take_free(value);
        self.live += 1;
        Ok(SlotHandle {
            chunk: chunk.id,
            slot,
        })
    }

    /// Release the slot named by `handle` and hand its value back.
    ///
    /// Returns [`AllocError::NotOwned`] if no chunk of this pool claims the
    /// handle, or if the slot is already free.
    pub fn release(&mut self, handle: SlotHandle) -> Result<T, AllocError> {
        let pos = self
            .chunks
            .iter()
            .position(|c| c.id == handle.chunk)
            .ok_or(AllocError::NotOwned)?;
        let chunk = &mut self.chunks[pos];
        let value = chunk.put_free(handle.slot).ok_or(AllocError::NotOwned)?;
        self.live -= 1;

        if chunk.free_count == chunk.capacity() {
            let chunk = self.chunks.remove(pos);
            tracing::trace!(chunk = chunk.id, "pool reclaimed an idle chunk");
        }
        Ok(value)
    }

    /// Borrow the value behind `handle`.
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        let chunk = self.chunks.iter().find(|c| c.id == handle.chunk)?;
        match chunk.slots.get(handle.slot as usize)? {
            Slot::Used(v) => Some(v),
            Slot::Free { .. } => None,
        }
    }

    /// Mutably borrow the value behind `handle`.
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        let chunk = self.chunks.iter_mut().find(|c| c.id == handle.chunk)?;
        match chunk.slots.get_mut(handle.slot as usize)? {
            Slot::Used(v) => Some(v),
            Slot::Free { .. } => None,
        }
    }

    /// Return every chunk to the backend. Objects still in the pool are
    /// dropped with their chunk rather than released one by one.
    pub fn destroy(self) {
        tracing::trace!(
            chunks = self.chunks.len(),
            live = self.live,
            "pool destroyed"
        );
    }

    /// Objects currently allocated.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Chunks currently held.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Bytes charged per object slot (at least one pointer width).
    pub fn object_size(&self) -> usize {
        self.object_size
    }

    /// Slots per chunk.
    pub fn objects_per_chunk(&self) -> usize {
        self.objects_per_chunk
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("objects_per_chunk", &self.objects_per_chunk)
            .field("object_size", &self.object_size)
            .field("chunks", &self.chunks.len())
            .field("live", &self.live)
            .finish()
    }
}
