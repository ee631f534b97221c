// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-capacity, bounds-checked byte storage.
//!
//! [`BackingStore`] is the single pre-allocated buffer every allocation
//! lives in. It knows nothing about allocations: it copies bytes in and
//! out at an offset and refuses ranges that run past the end.
//!
//! # Thread Safety
//! Bytes are stored as `AtomicU8` with relaxed ordering, so the store is
//! `Sync` without a lock. Disjoint ranges can be read and written from
//! many threads at once. Overlapping writes (possible after ring
//! wraparound) interleave per byte, which is the documented
//! last-writer-wins behaviour, never undefined behaviour.

use crate::MemoryError;
use std::sync::atomic::{AtomicU8, Ordering};

/// One contiguous, zero-initialised byte buffer of fixed capacity.
pub struct BackingStore {
    bytes: Box<[AtomicU8]>,
}

impl BackingStore {
    /// Allocates a zeroed store of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        let bytes = (0..capacity).map(|_| AtomicU8::new(0)).collect();
        Self { bytes }
    }

    /// Total size of the store in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Copies `data` into the store starting at `offset`.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), MemoryError> {
        let slots = self.range(offset, data.len())?;
        for (slot, &byte) in slots.iter().zip(data) {
            slot.store(byte, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Returns a copy of `length` bytes starting at `offset`.
    pub fn read(&self, offset: usize, length: usize) -> Result<Vec<u8>, MemoryError> {
        let slots = self.range(offset, length)?;
        Ok(slots.iter().map(|slot| slot.load(Ordering::Relaxed)).collect())
    }

    fn range(&self, offset: usize, length: usize) -> Result<&[AtomicU8], MemoryError> {
        let capacity = self.capacity();
        match offset.checked_add(length) {
            Some(end) if end <= capacity => Ok(&self.bytes[offset..end]),
            _ => Err(MemoryError::OutOfBounds {
                offset,
                length,
                limit: capacity,
            }),
        }
    }
}

impl std::fmt::Debug for BackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackingStore")
            .field("capacity", &self.capacity())
            .finish()
    }
}
