//! Memory backends and accounted allocations.
//!
//! A [`MemoryBackend`] is the caller-supplied allocate/free pair a pool (and
//! anything else that wants its memory tracked) is charged against. The
//! implementor's own state plays the role of the opaque payload.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::AllocError;

/// Caller-supplied allocation accounting.
///
/// `allocate` is asked before memory is taken and may refuse; `deallocate`
/// is called exactly once for every successful `allocate`, with the same
/// byte count.
pub trait MemoryBackend: Send + Sync + fmt::Debug {
    /// Grant (or refuse) a request for `bytes` bytes.
    fn allocate(&self, bytes: usize) -> Result<(), AllocError>;

    /// Return `bytes` bytes previously granted by [`MemoryBackend::allocate`].
    fn deallocate(&self, bytes: usize);
}

/// Shared handle to a backend.
pub type SharedBackend = Arc<dyn MemoryBackend>;

/// The default heap. Grants everything; exhaustion of the real heap is still
/// reported through [`try_vec`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl MemoryBackend for SystemBackend {
    fn allocate(&self, _bytes: usize) -> Result<(), AllocError> {
        Ok(())
    }

    fn deallocate(&self, _bytes: usize) {}
}

/// A shared [`SystemBackend`].
pub fn system() -> SharedBackend {
    Arc::new(SystemBackend)
}

/// Reserve capacity for exactly `capacity` elements without aborting on
/// heap exhaustion.
pub fn try_vec<T>(capacity: usize) -> Result<Vec<T>, AllocError> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|_| AllocError::OutOfMemory {
            requested: capacity.saturating_mul(std::mem::size_of::<T>()),
        })?;
    Ok(v)
}

// ---------------------------------------------------------------------------
// Reservation
// ---------------------------------------------------------------------------

/// Bytes granted by a backend, credited back when dropped.
pub struct Reservation {
    backend: SharedBackend,
    bytes: usize,
}

impl Reservation {
    /// Ask `backend` for `bytes` bytes.
    pub fn new(backend: &SharedBackend, bytes: usize) -> Result<Self, AllocError> {
        backend.allocate(bytes)?;
        Ok(Self {
            backend: Arc::clone(backend),
            bytes,
        })
    }

    /// Size of the reservation in bytes.
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.backend.deallocate(self.bytes);
    }
}

impl fmt::Debug for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reservation")
            .field("bytes", &self.bytes)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AccountedVec
// ---------------------------------------------------------------------------

/// A fixed-length buffer whose memory is charged to a backend.
pub struct AccountedVec<T> {
    items: Vec<T>,
    _reservation: Reservation,
}

impl<T> AccountedVec<T> {
    /// Collect `items` into a freshly charged buffer of exactly their length.
    pub fn from_exact_iter<I>(backend: &SharedBackend, items: I) -> Result<Self, AllocError>
    where
        I: ExactSizeIterator<Item = T>,
    {
        let len = items.len();
        let bytes = len.saturating_mul(std::mem::size_of::<T>());
        let reservation = Reservation::new(backend, bytes)?;
        let mut buf = try_vec(len)?;
        buf.extend(items.take(len));
        Ok(Self {
            items: buf,
            _reservation: reservation,
        })
    }
}

impl<T: Clone> AccountedVec<T> {
    /// Copy `items` into a freshly charged buffer.
    pub fn from_slice(backend: &SharedBackend, items: &[T]) -> Result<Self, AllocError> {
        Self::from_exact_iter(backend, items.iter().cloned())
    }
}

impl<T> Deref for AccountedVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for AccountedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

// ---------------------------------------------------------------------------
// CountingBackend
// ---------------------------------------------------------------------------

/// Instrumented backend that counts allocations and can be told to refuse
/// every request after the first `n` successful ones.
#[derive(Debug)]
pub struct CountingBackend {
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
    live_bytes: AtomicUsize,
    fail_after: AtomicUsize,
}

impl CountingBackend {
    /// A backend that never refuses.
    pub fn new() -> Self {
        Self::failing_after(usize::MAX)
    }

    /// A backend that grants `n` requests and refuses all later ones.
    pub fn failing_after(n: usize) -> Self {
        Self {
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(n),
        }
    }

    /// Successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Deallocations so far.
    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::SeqCst)
    }

    /// Allocations not yet returned.
    pub fn live(&self) -> usize {
        self.allocations() - self.deallocations()
    }

    /// Bytes not yet returned.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::SeqCst)
    }

    /// Whether everything granted has been returned.
    pub fn is_balanced(&self) -> bool {
        self.live() == 0 && self.live_bytes() == 0
    }
}

impl Default for CountingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend for CountingBackend {
    fn allocate(&self, bytes: usize) -> Result<(), AllocError> {
        if self.allocations() >= self.fail_after.load(Ordering::SeqCst) {
            return Err(AllocError::OutOfMemory { requested: bytes });
        }
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_add(bytes, Ordering::SeqCst);
        Ok(())
    }

    fn deallocate(&self, bytes: usize) {
        self.deallocations.fetch_add(1, Ordering::SeqCst);
        self.live_bytes.fetch_sub(bytes, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_is_credited_on_drop() {
        let counter = Arc::new(CountingBackend::new());
        let backend: SharedBackend = counter.clone();
        {
            let r = Reservation::new(&backend, 128).unwrap();
            assert_eq!(r.bytes(), 128);
            assert_eq!(counter.live(), 1);
            assert_eq!(counter.live_bytes(), 128);
        }
        assert!(counter.is_balanced());
        assert_eq!(counter.allocations(), 1);
        assert_eq!(counter.deallocations(), 1);
    }

    #[test]
    fn failing_after_refuses_later_requests() {
        let counter = Arc::new(CountingBackend::failing_after(1));
        let backend: SharedBackend = counter.clone();
        let first = Reservation::new(&backend, 8).unwrap();
        let second = Reservation::new(&backend, 8);
        assert_eq!(
            second.unwrap_err(),
            AllocError::OutOfMemory { requested: 8 }
        );
        drop(first);
        assert!(counter.is_balanced());
    }

    #[test]
    fn accounted_vec_copies_and_credits() {
        let counter = Arc::new(CountingBackend::new());
        let backend: SharedBackend = counter.clone();
        let chapters = AccountedVec::from_slice(&backend, &[0u64, 90_000]).unwrap();
        assert_eq!(&*chapters, &[0, 90_000]);
        assert_eq!(counter.live_bytes(), 16);
        drop(chapters);
        assert!(counter.is_balanced());
    }

    #[test]
    fn accounted_vec_from_exact_iter() {
        let backend = system();
        let starts = AccountedVec::from_exact_iter(&backend, (0..3u32).map(|c| u64::from(c) * 90_000)).unwrap();
        assert_eq!(&*starts, &[0, 90_000, 180_000]);
    }

    #[test]
    fn accounted_vec_refused_leaves_nothing() {
        let counter = Arc::new(CountingBackend::failing_after(0));
        let backend: SharedBackend = counter.clone();
        assert!(AccountedVec::from_slice(&backend, &[1u64]).is_err());
        assert!(counter.is_balanced());
        assert_eq!(counter.allocations(), 0);
    }

    #[test]
    fn system_backend_grants() {
        let backend = system();
        assert!(Reservation::new(&backend, usize::MAX).is_ok());
    }

    #[test]
    fn try_vec_reserves_exactly() {
        let v: Vec<u32> = try_vec(10).unwrap();
        assert!(v.capacity() >= 10);
        assert!(v.is_empty());
    }
}
