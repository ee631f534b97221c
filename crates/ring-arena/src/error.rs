// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the arena.

use crate::Handle;

/// Errors that can occur while allocating, accessing or configuring the arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The requested allocation would push live usage past the budget.
    #[error("budget exceeded: requested {requested} bytes with {used} in use (budget: {budget})")]
    BudgetExceeded {
        requested: usize,
        used: usize,
        budget: usize,
    },

    /// The request is larger than the whole backing store.
    #[error("allocation too large: requested {requested} bytes, capacity is {capacity}")]
    AllocationTooLarge { requested: usize, capacity: usize },

    /// A read or write range falls outside the store or the allocation.
    #[error("out of bounds: {length} bytes at offset {offset} exceeds limit of {limit}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        limit: usize,
    },

    /// The handle was released, reclaimed, or never issued by this registry.
    #[error("unknown handle: {0}")]
    UnknownHandle(Handle),

    /// Attempted to allocate a zero-sized region.
    #[error("cannot allocate zero-sized region")]
    ZeroSizedAllocation,

    /// The next ring position overlaps a live allocation and the registry
    /// is configured to reject overlaps.
    #[error("region occupied: {size} bytes at offset {offset} overlap a live allocation")]
    RegionOccupied { offset: usize, size: usize },

    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MemoryError {
    /// Returns `true` if retrying later (after releases or reclamation)
    /// may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MemoryError::BudgetExceeded { .. }
                | MemoryError::RegionOccupied { .. }
                | MemoryError::UnknownHandle(_)
        )
    }
}
