// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # ring-arena
//!
//! A budget-enforced, idle-reclaiming allocator over one pre-allocated
//! byte buffer.
//!
//! # Key Components
//!
//! - [`BackingStore`] — fixed-capacity, bounds-checked byte storage.
//! - [`RingAllocator`] — bump allocation with wraparound over the store.
//! - [`AllocationRegistry`] — hands out [`Handle`]s, enforces the budget,
//!   tracks last-access times, and evicts idle entries.
//! - [`IdleReclaimer`] — a tokio task that sweeps the registry on a fixed
//!   period.
//! - [`AllocationGuard`] — an RAII wrapper that releases on drop.
//! - [`ArenaConfig`] — TOML-loadable limits and timings.
//!
//! # Ownership Model
//!
//! ```text
//! Arc<AllocationRegistry> ◄─── shared by callers and the IdleReclaimer
//!       │ owns
//!       ▼
//!   RingAllocator  (cursor)
//!       │ owns
//!       ▼
//!   BackingStore   (Box<[AtomicU8]>, freed once with the registry)
//! ```
//!
//! Handles are `Copy` identifiers. They own nothing: the registry decides
//! when an allocation ends, either on `release` or when the sweep finds it
//! idle for longer than the threshold.
//!
//! # Wraparound
//! The ring does not track live ranges, so after wrapping it may place a
//! new allocation over an old one that is still live. With the default
//! [`OverlapPolicy::Permit`] that is allowed and the last writer wins.
//! [`OverlapPolicy::Reject`] refuses such requests with
//! [`MemoryError::RegionOccupied`] instead.
//!
//! # Example
//! ```
//! use ring_arena::{AllocationRegistry, ArenaConfig, MemoryError};
//!
//! let registry = AllocationRegistry::new(ArenaConfig::with_limits(1024, 1024, 30_000, 30_000)).unwrap();
//!
//! let a = registry.allocate(600).unwrap();
//! assert!(matches!(registry.allocate(500), Err(MemoryError::BudgetExceeded { .. })));
//!
//! registry.release(a);
//! let b = registry.allocate(500).unwrap();
//! registry.write(b, b"hello").unwrap();
//! assert_eq!(registry.read(b, 5).unwrap(), b"hello");
//! ```

mod clock;
mod config;
mod error;
mod guard;
mod reclaimer;
mod registry;
mod ring;
mod size;
mod stats;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ArenaConfig, OverlapPolicy};
pub use error::MemoryError;
pub use guard::AllocationGuard;
pub use reclaimer::{IdleReclaimer, ReclaimerHandle};
pub use registry::{AllocationInfo, AllocationRegistry, Handle, SweepReport};
pub use ring::RingAllocator;
pub use size::ByteSize;
pub use stats::ArenaStats;
pub use store::BackingStore;
