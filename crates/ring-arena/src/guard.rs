// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! RAII wrapper that releases an allocation on drop.
//!
//! Handles are plain values, so nothing stops a caller from forgetting to
//! release one; the idle sweep eventually cleans up after them. An
//! [`AllocationGuard`] releases deterministically instead. Because
//! `release` is idempotent, a guard whose allocation was already
//! reclaimed drops without effect.

use crate::{AllocationRegistry, Handle, MemoryError};
use std::sync::Arc;

/// Owns one allocation in an [`AllocationRegistry`] and releases it when
/// dropped.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use ring_arena::{AllocationRegistry, ArenaConfig};
///
/// let registry = Arc::new(AllocationRegistry::new(ArenaConfig::with_limits(1024, 1024, 1000, 1000)).unwrap());
/// {
///     let guard = registry.allocate_guarded(64).unwrap();
///     guard.write(b"scoped").unwrap();
///     assert_eq!(registry.current_used(), 64);
/// }
/// assert_eq!(registry.current_used(), 0);
/// ```
pub struct AllocationGuard {
    registry: Arc<AllocationRegistry>,
    handle: Handle,
    /// Cleared by `into_handle`.
    armed: bool,
}

impl AllocationGuard {
    pub(crate) fn new(registry: Arc<AllocationRegistry>, handle: Handle) -> Self {
        Self {
            registry,
            handle,
            armed: true,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn write(&self, data: &[u8]) -> Result<(), MemoryError> {
        self.registry.write(self.handle, data)
    }

    pub fn write_at(&self, offset: usize, data: &[u8]) -> Result<(), MemoryError> {
        self.registry.write_at(self.handle, offset, data)
    }

    pub fn read(&self, length: usize) -> Result<Vec<u8>, MemoryError> {
        self.registry.read(self.handle, length)
    }

    pub fn read_at(&self, offset: usize, length: usize) -> Result<Vec<u8>, MemoryError> {
        self.registry.read_at(self.handle, offset, length)
    }

    pub fn access(&self) -> Result<(), MemoryError> {
        self.registry.access(self.handle)
    }

    /// Returns `true` while the allocation has not been reclaimed.
    pub fn is_live(&self) -> bool {
        self.registry.contains(self.handle)
    }

    /// Stops managing the allocation and returns its handle. The caller
    /// becomes responsible for releasing it.
    pub fn into_handle(mut self) -> Handle {
        self.armed = false;
        self.handle
    }
}

impl Drop for AllocationGuard {
    fn drop(&mut self) {
        if self.armed {
            self.registry.release(self.handle);
        }
    }
}

impl std::fmt::Debug for AllocationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationGuard")
            .field("handle", &self.handle)
            .field("armed", &self.armed)
            .finish()
    }
}
