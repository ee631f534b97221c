// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bump allocation over a [`BackingStore`] with wraparound.
//!
//! The [`RingAllocator`] keeps a single cursor. Each request is placed at
//! the cursor, which then moves past it. When a request does not fit in
//! the space left before the end, the cursor goes back to zero first, so
//! an allocation is never split across the end of the buffer.
//!
//! ```text
//!  0                                           capacity
//!  ├──────────┬──────────────┬───────────────────┤
//!  │  a (100) │   b (200)    │      free         │
//!  └──────────┴──────────────┴───────────────────┘
//!                            ▲ cursor = 300
//! ```
//!
//! The allocator does not remember which ranges are still in use. After a
//! wraparound it may hand out a range that overlaps a live allocation; the
//! registry decides whether that is permitted.

use crate::{BackingStore, MemoryError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Single-cursor bump allocator that wraps to the start of its store.
pub struct RingAllocator {
    store: BackingStore,
    cursor: Mutex<usize>,
    wraparounds: AtomicU64,
}

impl RingAllocator {
    /// Creates an allocator over a fresh zeroed store of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_store(BackingStore::new(capacity))
    }

    /// Creates an allocator that takes ownership of an existing store.
    pub fn with_store(store: BackingStore) -> Self {
        Self {
            store,
            cursor: Mutex::new(0),
            wraparounds: AtomicU64::new(0),
        }
    }

    /// Reserves `size` bytes and returns their starting offset.
    ///
    /// Fails with [`MemoryError::AllocationTooLarge`] if `size` exceeds the
    /// capacity, whatever the cursor position.
    pub fn allocate(&self, size: usize) -> Result<usize, MemoryError> {
        self.allocate_if(size, |_| true)
    }

    /// Like [`allocate`](Self::allocate), but offers the candidate offset
    /// to `accept` while the cursor is locked.
    ///
    /// If `accept` returns `false` the cursor is left where it was and
    /// [`MemoryError::RegionOccupied`] is returned.
    pub fn allocate_if<F>(&self, size: usize, accept: F) -> Result<usize, MemoryError>
    where
        F: FnOnce(usize) -> bool,
    {
        let capacity = self.capacity();
        if size > capacity {
            return Err(MemoryError::AllocationTooLarge {
                requested: size,
                capacity,
            });
        }

        let mut cursor = self.cursor.lock();
        let wraps = *cursor + size > capacity;
        let offset = if wraps { 0 } else { *cursor };

        if !accept(offset) {
            return Err(MemoryError::RegionOccupied { offset, size });
        }

        if wraps {
            self.wraparounds.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(size, previous_cursor = *cursor, "ring cursor wrapped to 0");
        }
        *cursor = offset + size;
        Ok(offset)
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        *self.cursor.lock()
    }

    /// Total capacity of the underlying store.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Number of times the cursor has been reset to zero.
    pub fn wraparounds(&self) -> u64 {
        self.wraparounds.load(Ordering::Relaxed)
    }

    /// The store allocations are carved from.
    pub fn store(&self) -> &BackingStore {
        &self.store
    }
}

impl std::fmt::Debug for RingAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingAllocator")
            .field("capacity", &self.capacity())
            .field("cursor", &self.cursor())
            .field("wraparounds", &self.wraparounds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_offsets() {
        let ring = RingAllocator::new(1024);
        assert_eq!(ring.allocate(100).unwrap(), 0);
        assert_eq!(ring.allocate(200).unwrap(), 100);
        assert_eq!(ring.cursor(), 300);
        assert_eq!(ring.wraparounds(), 0);
    }

    #[test]
    fn test_wraps_instead_of_splitting() {
        let ring = RingAllocator::new(1024);
        ring.allocate(1000).unwrap();
        // 1000 + 100 > 1024: must restart at 0.
        assert_eq!(ring.allocate(100).unwrap(), 0);
        assert_eq!(ring.cursor(), 100);
        assert_eq!(ring.wraparounds(), 1);
    }

    #[test]
    fn test_exact_fit_does_not_wrap() {
        let ring = RingAllocator::new(1024);
        ring.allocate(1000).unwrap();
        assert_eq!(ring.allocate(24).unwrap(), 1000);
        assert_eq!(ring.cursor(), 1024);
        assert_eq!(ring.wraparounds(), 0);
        assert_eq!(ring.allocate(1).unwrap(), 0);
    }

    #[test]
    fn test_too_large() {
        let ring = RingAllocator::new(1024);
        assert_eq!(
            ring.allocate(2000),
            Err(MemoryError::AllocationTooLarge {
                requested: 2000,
                capacity: 1024
            })
        );
        assert_eq!(ring.cursor(), 0);
        assert_eq!(ring.allocate(1024).unwrap(), 0);
    }

    #[test]
    fn test_rejected_candidate_leaves_cursor() {
        let ring = RingAllocator::new(100);
        ring.allocate(60).unwrap();
        let result = ring.allocate_if(50, |offset| {
            assert_eq!(offset, 0);
            false
        });
        assert_eq!(result, Err(MemoryError::RegionOccupied { offset: 0, size: 50 }));
        assert_eq!(ring.cursor(), 60);
        assert_eq!(ring.wraparounds(), 0);
    }

    #[test]
    fn test_concurrent_allocations_never_overlap_before_wrap() {
        let ring = std::sync::Arc::new(RingAllocator::new(8 * 1000));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let ring = std::sync::Arc::clone(&ring);
                std::thread::spawn(move || {
                    (0..100).map(|_| ring.allocate(10).unwrap()).collect::<Vec<_>>()
                })
            })
            .collect();
        let mut offsets: Vec<usize> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();
        offsets.sort_unstable();
        let expected: Vec<usize> = (0..800).map(|i| i * 10).collect();
        assert_eq!(offsets, expected);
    }
}
