//! Property tests for pool invariants over arbitrary allocate/release
//! sequences.

use std::collections::HashSet;
use std::sync::Arc;

use bdp_pool::{CountingBackend, Pool, SlotHandle};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Allocate,
    /// Release the live object at this position (modulo the live count).
    Release(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Allocate),
        2 => any::<usize>().prop_map(Op::Release),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Live handles never alias and always read back what was stored.
    #[test]
    fn live_handles_never_alias(
        per_chunk in 1usize..8,
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let counter = Arc::new(CountingBackend::new());
        let mut pool: Pool<u64> = Pool::with_backend(per_chunk, counter.clone()).unwrap();
        let mut live: Vec<(SlotHandle, u64)> = Vec::new();
        let mut next_value = 0u64;

        for op in ops {
            match op {
                Op::Allocate => {
                    let h = pool.allocate(next_value).unwrap();
                    prop_assert!(live.iter().all(|(other, _)| *other != h));
                    live.push((h, next_value));
                    next_value += 1;
                }
                Op::Release(i) if !live.is_empty() => {
                    let (h, v) = live.swap_remove(i % live.len());
                    prop_assert_eq!(pool.release(h).unwrap(), v);
                }
                Op::Release(_) => {}
            }

            let distinct: HashSet<_> = live.iter().map(|(h, _)| *h).collect();
            prop_assert_eq!(distinct.len(), live.len());
            prop_assert_eq!(pool.live(), live.len());
            prop_assert!(pool.chunk_count() * per_chunk >= live.len());
            prop_assert_eq!(counter.live(), pool.chunk_count());
        }

        for (h, v) in &live {
            prop_assert_eq!(pool.get(*h), Some(v));
        }
        for (h, v) in live.drain(..) {
            prop_assert_eq!(pool.release(h).unwrap(), v);
        }
        prop_assert_eq!(pool.chunk_count(), 0);
        prop_assert!(counter.is_balanced());
    }

    /// A pool never holds a chunk with nothing allocated in it.
    #[test]
    fn no_idle_chunk_survives(
        per_chunk in 1usize..6,
        count in 1usize..40,
        order in prop::collection::vec(any::<usize>(), 40),
    ) {
        let mut pool: Pool<u32> = Pool::new(per_chunk).unwrap();
        let mut handles: Vec<_> = (0..count as u32).map(|v| pool.allocate(v).unwrap()).collect();

        for pick in order.into_iter().take(count) {
            let h = handles.swap_remove(pick % handles.len());
            pool.release(h).unwrap();
            // Minimum chunks needed is ceil(live / per_chunk); every chunk
            // must hold at least one object.
            prop_assert!(pool.chunk_count() <= pool.live());
        }
        prop_assert_eq!(pool.chunk_count(), 0);
    }

    /// Freed slots are reused before the pool grows.
    #[test]
    fn reuse_before_growth(per_chunk in 1usize..8, filled in 1usize..5, freed in 1usize..8) {
        let counter = Arc::new(CountingBackend::new());
        let mut pool: Pool<u32> = Pool::with_backend(per_chunk, counter.clone()).unwrap();
        let total = per_chunk * filled;
        let mut handles: Vec<_> = (0..total as u32).map(|v| pool.allocate(v).unwrap()).collect();
        let chunks_before = counter.allocations();

        // Free from the tail chunk's neighbours without emptying a whole chunk.
        let freed = freed.min(per_chunk.saturating_sub(1)).min(handles.len());
        let released: Vec<_> = handles.drain(..freed).collect();
        for h in &released {
            pool.release(*h).unwrap();
        }
        for v in 0..freed as u32 {
            let h = pool.allocate(v).unwrap();
            prop_assert!(released.contains(&h));
        }
        prop_assert_eq!(counter.allocations(), chunks_before);
    }
}

#[test]
fn counting_backend_sees_each_chunk_once() {
    let counter = Arc::new(CountingBackend::new());
    let mut pool: Pool<[u8; 24]> = Pool::with_backend(3, counter.clone()).unwrap();
    let handles: Vec<_> = (0..9).map(|i| pool.allocate([i; 24]).unwrap()).collect();
    assert_eq!(counter.allocations(), 3);
    for h in handles {
        pool.release(h).unwrap();
    }
    assert_eq!(counter.deallocations(), 3);
    assert!(counter.is_balanced());
}
