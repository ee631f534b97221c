// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Budget-enforcing allocation registry with idle tracking.
//!
//! The [`AllocationRegistry`] is the entry point of the crate. It:
//!
//! 1. Enforces a hard ceiling on live bytes. Requests that would exceed it
//!    return `Err(BudgetExceeded)`.
//! 2. Places allocations in a [`RingAllocator`] and remembers where each
//!    one lives under an opaque [`Handle`].
//! 3. Stamps every allocation with its last access time so the idle sweep
//!    ([`reclaim_idle`](AllocationRegistry::reclaim_idle)) can evict what
//!    nobody touched for longer than the idle threshold.
//!
//! # Locking
//! One `RwLock` guards the handle map. Allocation, release and eviction
//! take it exclusively, so the budget check, the cursor advance and the
//! usage counter update form one linearizable step. Reads, writes and
//! `access` take it shared and refresh the idle clock through atomics.
//! The ring's cursor lock is only ever taken while the map lock is held.

use crate::{
    AllocationGuard, ArenaConfig, ArenaStats, Clock, MemoryError, OverlapPolicy, RingAllocator,
    SystemClock,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Opaque identifier of one live allocation.
///
/// Handles are never reused by a registry: once released or reclaimed, a
/// handle resolves to [`MemoryError::UnknownHandle`] forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Handle(u64);

impl Handle {
    /// Rebuilds a handle from its raw value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value behind the handle.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata of a live allocation.
struct Entry {
    offset: usize,
    size: usize,
    created_at_ms: u64,
    last_accessed_ms: AtomicU64,
    /// Bumped on every touch; lets the sweep detect refreshes that land
    /// between its snapshot and its removal.
    generation: AtomicU64,
}

impl Entry {
    fn new(offset: usize, size: usize, now_ms: u64) -> Self {
        Self {
            offset,
            size,
            created_at_ms: now_ms,
            last_accessed_ms: AtomicU64::new(now_ms),
            generation: AtomicU64::new(0),
        }
    }

    fn touch(&self, now_ms: u64) {
        self.last_accessed_ms.fetch_max(now_ms, Ordering::AcqRel);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Translates a range relative to the allocation into a store offset.
    fn resolve(&self, offset: usize, length: usize) -> Result<usize, MemoryError> {
        match offset.checked_add(length) {
            Some(end) if end <= self.size => Ok(self.offset + offset),
            _ => Err(MemoryError::OutOfBounds {
                offset,
                length,
                limit: self.size,
            }),
        }
    }

    fn overlaps(&self, offset: usize, size: usize) -> bool {
        offset < self.offset + self.size && self.offset < offset + size
    }

    fn info(&self, handle: Handle) -> AllocationInfo {
        AllocationInfo {
            handle,
            offset: self.offset,
            size: self.size,
            created_at_ms: self.created_at_ms,
            last_accessed_ms: self.last_accessed_ms.load(Ordering::Acquire),
        }
    }
}

/// A point-in-time copy of one allocation's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AllocationInfo {
    pub handle: Handle,
    /// Start of the allocation inside the backing store.
    pub offset: usize,
    pub size: usize,
    /// Clock reading when the allocation was granted.
    pub created_at_ms: u64,
    /// Clock reading of the most recent access, read or write.
    pub last_accessed_ms: u64,
}

/// Outcome of one idle sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepReport {
    /// Entries present when the sweep started.
    pub scanned: usize,
    /// Entries evicted.
    pub reclaimed: usize,
    /// Bytes returned to the budget.
    pub reclaimed_bytes: usize,
    /// Idle candidates left in place because they were refreshed during
    /// the sweep or their metadata was inconsistent.
    pub skipped: usize,
}

/// Tracks allocations in a ring-allocated store under a global budget.
///
/// # Example
/// ```
/// use ring_arena::{AllocationRegistry, ArenaConfig};
///
/// let registry = AllocationRegistry::new(ArenaConfig::with_limits(1024, 1024, 30_000, 30_000)).unwrap();
///
/// let h = registry.allocate(100).unwrap();
/// registry.write(h, b"ABC").unwrap();
/// assert_eq!(registry.read(h, 3).unwrap(), b"ABC");
/// assert_eq!(registry.current_used(), 100);
///
/// registry.release(h);
/// assert_eq!(registry.current_used(), 0);
/// ```
pub struct AllocationRegistry {
    ring: RingAllocator,
    entries: RwLock<HashMap<Handle, Entry>>,
    next_handle: AtomicU64,
    /// Sum of live sizes. Only written while `entries` is held exclusively.
    total_used: AtomicUsize,
    max_budget: usize,
    idle_threshold_ms: u64,
    overlap_policy: OverlapPolicy,
    clock: Arc<dyn Clock>,
    stats: Mutex<ArenaStats>,
    config: ArenaConfig,
}

impl AllocationRegistry {
    /// Creates a registry using wall-clock time.
    pub fn new(config: ArenaConfig) -> Result<Self, MemoryError> {
        Self::with_clock(config, SystemClock::new())
    }

    /// Creates a registry that reads time from `clock`.
    pub fn with_clock<C: Clock + 'static>(config: ArenaConfig, clock: C) -> Result<Self, MemoryError> {
        let (capacity, max_budget) = config.validate()?;
        tracing::debug!(
            %capacity,
            %max_budget,
            idle_threshold_ms = config.idle_threshold_ms,
            policy = ?config.overlap_policy,
            "allocation registry created"
        );
        Ok(Self {
            ring: RingAllocator::new(capacity.as_bytes()),
            entries: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            total_used: AtomicUsize::new(0),
            max_budget: max_budget.as_bytes(),
            idle_threshold_ms: config.idle_threshold_ms,
            overlap_policy: config.overlap_policy,
            clock: Arc::new(clock),
            stats: Mutex::new(ArenaStats::default()),
            config,
        })
    }

    /// Reserves `size` bytes and returns a handle to them.
    ///
    /// Fails with `ZeroSizedAllocation`, `AllocationTooLarge` (larger than
    /// the store), `BudgetExceeded` (would pass the ceiling) or, under
    /// [`OverlapPolicy::Reject`], `RegionOccupied`.
    pub fn allocate(&self, size: usize) -> Result<Handle, MemoryError> {
        let result = self.try_allocate(size);
        if let Err(e) = &result {
            self.stats.lock().record_rejection(e);
            tracing::debug!(size, error = %e, "allocation refused");
        }
        result
    }

    fn try_allocate(&self, size: usize) -> Result<Handle, MemoryError> {
        if size == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        let capacity = self.ring.capacity();
        if size > capacity {
            return Err(MemoryError::AllocationTooLarge {
                requested: size,
                capacity,
            });
        }

        let mut entries = self.entries.write();
        let used = self.total_used.load(Ordering::Acquire);
        if used + size > self.max_budget {
            return Err(MemoryError::BudgetExceeded {
                requested: size,
                used,
                budget: self.max_budget,
            });
        }

        let offset = match self.overlap_policy {
            OverlapPolicy::Permit => self.ring.allocate(size)?,
            OverlapPolicy::Reject => self.ring.allocate_if(size, |candidate| {
                !entries.values().any(|e| e.overlaps(candidate, size))
            })?,
        };

        let handle = Handle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        entries.insert(handle, Entry::new(offset, size, self.clock.now_millis()));
        let used_after = used + size;
        self.total_used.store(used_after, Ordering::Release);
        self.stats.lock().record_allocation(size, used_after);
        drop(entries);

        tracing::debug!(%handle, offset, size, used = used_after, "allocated");
        Ok(handle)
    }

    /// Like [`allocate`](Self::allocate), but wraps the handle in a guard
    /// that releases it when dropped.
    pub fn allocate_guarded(self: &Arc<Self>, size: usize) -> Result<AllocationGuard, MemoryError> {
        let handle = self.allocate(size)?;
        Ok(AllocationGuard::new(Arc::clone(self), handle))
    }

    /// Marks the allocation as used now, postponing its idle eviction.
    pub fn access(&self, handle: Handle) -> Result<(), MemoryError> {
        self.with_entry(handle, |_| Ok(()))
    }

    /// Copies `data` to the start of the allocation.
    pub fn write(&self, handle: Handle, data: &[u8]) -> Result<(), MemoryError> {
        self.write_at(handle, 0, data)
    }

    /// Copies `data` into the allocation starting `offset` bytes in.
    pub fn write_at(&self, handle: Handle, offset: usize, data: &[u8]) -> Result<(), MemoryError> {
        self.with_entry(handle, |entry| {
            let start = entry.resolve(offset, data.len())?;
            self.ring.store().write(start, data)
        })
    }

    /// Returns a copy of the first `length` bytes of the allocation.
    pub fn read(&self, handle: Handle, length: usize) -> Result<Vec<u8>, MemoryError> {
        self.read_at(handle, 0, length)
    }

    /// Returns a copy of `length` bytes starting `offset` bytes in.
    pub fn read_at(&self, handle: Handle, offset: usize, length: usize) -> Result<Vec<u8>, MemoryError> {
        self.with_entry(handle, |entry| {
            let start = entry.resolve(offset, length)?;
            self.ring.store().read(start, length)
        })
    }

    /// Runs `f` on the entry under the shared lock and refreshes its idle
    /// clock if `f` succeeds.
    fn with_entry<T, F>(&self, handle: Handle, f: F) -> Result<T, MemoryError>
    where
        F: FnOnce(&Entry) -> Result<T, MemoryError>,
    {
        let entries = self.entries.read();
        let entry = entries
            .get(&handle)
            .ok_or(MemoryError::UnknownHandle(handle))?;
        let value = f(entry)?;
        entry.touch(self.clock.now_millis());
        Ok(value)
    }

    /// Removes the allocation and returns its bytes to the budget.
    ///
    /// Never fails. Returns `true` if this call removed the entry and
    /// `false` if it was already released or reclaimed.
    pub fn release(&self, handle: Handle) -> bool {
        let mut entries = self.entries.write();
        let Some(entry) = entries.remove(&handle) else {
            tracing::trace!(%handle, "release of untracked handle ignored");
            return false;
        };
        let used_after = match self.debit(entry.size) {
            Some(used) => used,
            None => {
                tracing::error!(
                    %handle,
                    size = entry.size,
                    used = self.current_used(),
                    "released allocation larger than tracked usage; clamping to zero"
                );
                self.total_used.store(0, Ordering::Release);
                0
            }
        };
        self.stats.lock().record_release();
        drop(entries);

        tracing::debug!(%handle, size = entry.size, used = used_after, "released");
        true
    }

    /// Evicts every allocation idle for longer than the threshold.
    ///
    /// Candidates are picked from a shared-lock snapshot, then removed
    /// under the exclusive lock only if they were not touched in between.
    /// An entry whose size exceeds the tracked usage is logged and left in
    /// place; the sweep carries on with the rest.
    pub fn reclaim_idle(&self) -> SweepReport {
        let now = self.clock.now_millis();
        let mut report = SweepReport::default();

        let candidates: Vec<(Handle, u64, u64)> = {
            let entries = self.entries.read();
            report.scanned = entries.len();
            entries
                .iter()
                .filter_map(|(handle, entry)| {
                    let generation = entry.generation.load(Ordering::Acquire);
                    let last = entry.last_accessed_ms.load(Ordering::Acquire);
                    (now.saturating_sub(last) > self.idle_threshold_ms)
                        .then_some((*handle, generation, last))
                })
                .collect()
        };

        if !candidates.is_empty() {
            let mut entries = self.entries.write();
            for (handle, generation, last) in candidates {
                let Some(entry) = entries.get(&handle) else {
                    // Released after the snapshot.
                    continue;
                };
                if entry.generation.load(Ordering::Acquire) != generation {
                    report.skipped += 1;
                    continue;
                }
                let size = entry.size;
                if self.debit(size).is_none() {
                    tracing::error!(
                        %handle,
                        size,
                        used = self.current_used(),
                        "idle eviction skipped: size exceeds tracked usage"
                    );
                    report.skipped += 1;
                    continue;
                }
                entries.remove(&handle);
                report.reclaimed += 1;
                report.reclaimed_bytes += size;
                tracing::debug!(%handle, size, idle_ms = now.saturating_sub(last), "reclaimed idle allocation");
            }
        }

        self.stats
            .lock()
            .record_sweep(report.reclaimed, report.reclaimed_bytes);
        if report.reclaimed > 0 {
            tracing::info!(
                reclaimed = report.reclaimed,
                bytes = report.reclaimed_bytes,
                used = self.current_used(),
                "idle sweep reclaimed allocations"
            );
        }
        report
    }

    /// Subtracts `size` from the usage counter. Caller holds the map lock
    /// exclusively. Returns `None`, leaving the counter alone, on underflow.
    fn debit(&self, size: usize) -> Option<usize> {
        let used = self.total_used.load(Ordering::Acquire).checked_sub(size)?;
        self.total_used.store(used, Ordering::Release);
        Some(used)
    }

    /// Bytes held by live allocations. A lock-free snapshot that may be
    /// stale by the time it is read.
    pub fn current_used(&self) -> usize {
        self.total_used.load(Ordering::Acquire)
    }

    /// Number of live allocations.
    pub fn tracked_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Bytes that can still be allocated before hitting the budget.
    pub fn available(&self) -> usize {
        self.max_budget.saturating_sub(self.current_used())
    }

    /// Ceiling on bytes simultaneously allocated.
    pub fn max_budget(&self) -> usize {
        self.max_budget
    }

    /// Size of the backing store.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Age past which an untouched allocation is reclaimed.
    pub fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.idle_threshold_ms)
    }

    /// The configuration this registry was built from.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The time source used to stamp accesses.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Returns `true` if `handle` names a live allocation.
    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.read().contains_key(&handle)
    }

    /// Metadata of one allocation. Does not count as an access.
    pub fn info(&self, handle: Handle) -> Result<AllocationInfo, MemoryError> {
        self.entries
            .read()
            .get(&handle)
            .map(|entry| entry.info(handle))
            .ok_or(MemoryError::UnknownHandle(handle))
    }

    /// Metadata of every live allocation, ordered by offset.
    pub fn allocations(&self) -> Vec<AllocationInfo> {
        let mut all: Vec<AllocationInfo> = self
            .entries
            .read()
            .iter()
            .map(|(handle, entry)| entry.info(*handle))
            .collect();
        all.sort_by_key(|info| (info.offset, info.handle));
        all
    }

    /// Returns a snapshot of the cumulative statistics.
    pub fn stats(&self) -> ArenaStats {
        let mut stats = self.stats.lock().clone();
        stats.wraparounds = self.ring.wraparounds();
        stats
    }
}

impl fmt::Debug for AllocationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationRegistry")
            .field("capacity", &self.capacity())
            .field("max_budget", &self.max_budget)
            .field("current_used", &self.current_used())
            .field("tracked_count", &self.tracked_count())
            .field("overlap_policy", &self.overlap_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    fn registry(capacity: usize, budget: usize) -> (AllocationRegistry, ManualClock) {
        let clock = ManualClock::new(0);
        let config = ArenaConfig::with_limits(capacity, budget, 30_000, 30_000);
        let registry = AllocationRegistry::with_clock(config, clock.clone()).unwrap();
        (registry, clock)
    }

    #[test]
    fn test_reference_scenario() {
        let (r, _) = registry(1024, 1024);

        let h1 = r.allocate(100).unwrap();
        let h2 = r.allocate(200).unwrap();
        assert_eq!(r.info(h1).unwrap().offset, 0);
        assert_eq!(r.info(h2).unwrap().offset, 100);

        r.write(h1, b"ABC").unwrap();
        assert_eq!(r.read(h1, 3).unwrap(), b"ABC");

        assert_eq!(r.current_used(), 300);
        assert!(r.release(h1));
        assert_eq!(r.current_used(), 200);

        let h3 = r.allocate(100).unwrap();
        assert_ne!(h3, h1);
        assert_eq!(r.current_used(), 300);
        assert_eq!(r.tracked_count(), 2);
    }

    #[test]
    fn test_allocation_too_large() {
        let (r, _) = registry(1024, 1024);
        assert_eq!(
            r.allocate(2000),
            Err(MemoryError::AllocationTooLarge {
                requested: 2000,
                capacity: 1024
            })
        );
        assert_eq!(r.stats().oversize_rejections, 1);
    }

    #[test]
    fn test_budget_exceeded() {
        let (r, _) = registry(1024, 1024);
        r.allocate(600).unwrap();
        assert_eq!(
            r.allocate(500),
            Err(MemoryError::BudgetExceeded {
                requested: 500,
                used: 600,
                budget: 1024
            })
        );
        assert_eq!(r.current_used(), 600);
        assert_eq!(r.tracked_count(), 1);
    }

    #[test]
    fn test_budget_below_capacity() {
        let (r, _) = registry(1024, 256);
        r.allocate(200).unwrap();
        assert!(matches!(r.allocate(100), Err(MemoryError::BudgetExceeded { .. })));
        assert_eq!(r.available(), 56);
    }

    #[test]
    fn test_zero_sized() {
        let (r, _) = registry(1024, 1024);
        assert_eq!(r.allocate(0), Err(MemoryError::ZeroSizedAllocation));
    }

    #[test]
    fn test_double_release_debits_once() {
        let (r, _) = registry(1024, 1024);
        let h = r.allocate(100).unwrap();
        let _other = r.allocate(50).unwrap();
        assert!(r.release(h));
        assert!(!r.release(h));
        assert_eq!(r.current_used(), 50);
        assert_eq!(r.stats().releases, 1);
    }

    #[test]
    fn test_release_frees_budget_at_ceiling() {
        let (r, _) = registry(1024, 1024);
        let h = r.allocate(1024).unwrap();
        assert!(r.allocate(1).is_err());
        r.release(h);
        r.allocate(1024).unwrap();
    }

    #[test]
    fn test_unknown_handle() {
        let (r, _) = registry(1024, 1024);
        let h = r.allocate(10).unwrap();
        r.release(h);
        assert_eq!(r.access(h), Err(MemoryError::UnknownHandle(h)));
        assert_eq!(r.write(h, b"x"), Err(MemoryError::UnknownHandle(h)));
        assert_eq!(r.read(h, 1), Err(MemoryError::UnknownHandle(h)));
        assert!(r.info(h).is_err());
        assert!(!r.contains(h));
    }

    #[test]
    fn test_bounds_are_per_allocation() {
        let (r, _) = registry(1024, 1024);
        let h = r.allocate(4).unwrap();
        assert_eq!(
            r.write(h, b"12345"),
            Err(MemoryError::OutOfBounds {
                offset: 0,
                length: 5,
                limit: 4
            })
        );
        assert!(r.read(h, 5).is_err());
        assert!(r.read_at(h, 3, 2).is_err());
        r.write_at(h, 2, b"zz").unwrap();
        assert_eq!(r.read(h, 4).unwrap(), [0, 0, b'z', b'z']);
    }

    #[test]
    fn test_read_write_and_access_refresh_idle_clock() {
        let (r, clock) = registry(1024, 1024);
        let h = r.allocate(8).unwrap();
        assert_eq!(r.info(h).unwrap().last_accessed_ms, 0);

        clock.advance(10);
        r.access(h).unwrap();
        assert_eq!(r.info(h).unwrap().last_accessed_ms, 10);

        clock.advance(10);
        r.write(h, b"a").unwrap();
        assert_eq!(r.info(h).unwrap().last_accessed_ms, 20);

        clock.advance(10);
        r.read(h, 1).unwrap();
        let info = r.info(h).unwrap();
        assert_eq!(info.last_accessed_ms, 30);
        assert_eq!(info.created_at_ms, 0);
    }

    #[test]
    fn test_failed_write_does_not_refresh() {
        let (r, clock) = registry(1024, 1024);
        let h = r.allocate(2).unwrap();
        clock.advance(10);
        assert!(r.write(h, b"too long").is_err());
        assert_eq!(r.info(h).unwrap().last_accessed_ms, 0);
    }

    #[test]
    fn test_reclaim_idle() {
        let (r, clock) = registry(1024, 1024);
        let idle = r.allocate(100).unwrap();
        let busy = r.allocate(200).unwrap();

        clock.advance(20_000);
        r.access(busy).unwrap();

        // At exactly the threshold nothing is idle yet.
        clock.advance(10_000);
        assert_eq!(r.reclaim_idle().reclaimed, 0);

        clock.advance(1);
        let report = r.reclaim_idle();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.reclaimed, 1);
        assert_eq!(report.reclaimed_bytes, 100);
        assert!(!r.contains(idle));
        assert!(r.contains(busy));
        assert_eq!(r.current_used(), 200);

        // Releasing a reclaimed handle is a no-op.
        assert!(!r.release(idle));
        assert_eq!(r.current_used(), 200);

        let stats = r.stats();
        assert_eq!(stats.reclaimed, 1);
        assert_eq!(stats.reclaimed_bytes, 100);
        assert_eq!(stats.sweeps, 2);
    }

    #[test]
    fn test_sweep_on_empty_registry() {
        let (r, _) = registry(1024, 1024);
        assert_eq!(r.reclaim_idle(), SweepReport::default());
    }

    #[test]
    fn test_wraparound_aliases_live_allocation_when_permitted() {
        let (r, _) = registry(1024, 1024);
        let old = r.allocate(600).unwrap();
        let mid = r.allocate(300).unwrap();
        r.release(mid);
        r.write(old, b"old!").unwrap();

        // 900 + 200 > 1024: the cursor wraps onto `old`.
        let new = r.allocate(200).unwrap();
        assert_eq!(r.info(new).unwrap().offset, 0);
        r.write(new, b"new!").unwrap();
        assert_eq!(r.read(old, 4).unwrap(), b"new!");
        assert_eq!(r.stats().wraparounds, 1);
    }

    #[test]
    fn test_wraparound_rejected_under_reject_policy() {
        let clock = ManualClock::new(0);
        let config = ArenaConfig::with_limits(1024, 1024, 30_000, 30_000)
            .overlap_policy(OverlapPolicy::Reject);
        let r = AllocationRegistry::with_clock(config, clock).unwrap();

        let old = r.allocate(600).unwrap();
        let mid = r.allocate(300).unwrap();
        r.release(mid);

        assert_eq!(
            r.allocate(200),
            Err(MemoryError::RegionOccupied { offset: 0, size: 200 })
        );
        // The cursor stayed at 900, so a small request still fits at the end.
        assert_eq!(r.info(r.allocate(100).unwrap()).unwrap().offset, 900);

        r.release(old);
        assert_eq!(r.info(r.allocate(200).unwrap()).unwrap().offset, 0);
        assert_eq!(r.stats().overlap_rejections, 1);
    }

    #[test]
    fn test_reject_policy_catches_forward_overlap() {
        let clock = ManualClock::new(0);
        let config = ArenaConfig::with_limits(1024, 1024, 30_000, 30_000)
            .overlap_policy(OverlapPolicy::Reject);
        let r = AllocationRegistry::with_clock(config, clock).unwrap();

        let head = r.allocate(400).unwrap();
        let _tail = r.allocate(500).unwrap();
        r.release(head);

        // Wraps into the space `head` left; `_tail` still lives at 400..900.
        assert_eq!(r.info(r.allocate(200).unwrap()).unwrap().offset, 0);

        // 200..500 runs into `_tail` without wrapping.
        assert_eq!(
            r.allocate(300),
            Err(MemoryError::RegionOccupied {
                offset: 200,
                size: 300
            })
        );
        assert_eq!(r.info(r.allocate(200).unwrap()).unwrap().offset, 200);
        assert_eq!(r.stats().wraparounds, 1);
        assert_eq!(r.stats().overlap_rejections, 1);
    }

    #[test]
    fn test_inconsistent_usage_is_skipped_by_sweep_and_clamped_by_release() {
        let (r, clock) = registry(1024, 1024);
        let large = r.allocate(100).unwrap();
        let small = r.allocate(30).unwrap();

        // Tracked usage below `large`'s size.
        r.total_used.store(50, Ordering::Release);
        clock.advance(30_001);

        let report = r.reclaim_idle();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.reclaimed, 1);
        assert_eq!(report.reclaimed_bytes, 30);
        assert!(r.contains(large));
        assert!(!r.contains(small));
        assert_eq!(r.current_used(), 20);

        assert!(r.release(large));
        assert!(!r.contains(large));
        assert_eq!(r.current_used(), 0);
        assert_eq!(r.tracked_count(), 0);
    }

    #[test]
    fn test_allocations_sorted_by_offset() {
        let (r, _) = registry(1024, 1024);
        let a = r.allocate(10).unwrap();
        let b = r.allocate(20).unwrap();
        let all = r.allocations();
        assert_eq!(all.len(), 2);
        assert_eq!((all[0].handle, all[0].offset), (a, 0));
        assert_eq!((all[1].handle, all[1].offset), (b, 10));
    }

    #[test]
    fn test_stats_peak() {
        let (r, _) = registry(1024, 1024);
        let a = r.allocate(300).unwrap();
        let b = r.allocate(200).unwrap();
        r.release(a);
        r.release(b);
        let stats = r.stats();
        assert_eq!(stats.peak_used_bytes, 500);
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.cumulative_allocated_bytes, 500);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ArenaConfig::with_limits(100, 200, 1, 1);
        assert!(matches!(
            AllocationRegistry::new(config),
            Err(MemoryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_debug_format() {
        let (r, _) = registry(1024, 512);
        let debug = format!("{r:?}");
        assert!(debug.contains("AllocationRegistry"));
        assert!(debug.contains("max_budget: 512"));
    }
}
