// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Cumulative registry statistics.
//!
//! [`ArenaStats`] counts what happened to allocations over the lifetime of
//! a registry: how many were granted or refused, and how they ended
//! (explicit release or idle reclamation).

/// Cumulative counters for one [`AllocationRegistry`](crate::AllocationRegistry).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArenaStats {
    /// Allocations granted.
    pub allocations: u64,
    /// Requests refused because the budget was exhausted.
    pub budget_rejections: u64,
    /// Requests refused because they exceeded the store capacity.
    pub oversize_rejections: u64,
    /// Requests refused because the ring position overlapped a live entry.
    pub overlap_rejections: u64,
    /// Entries removed by an explicit release.
    pub releases: u64,
    /// Entries removed by the idle sweep.
    pub reclaimed: u64,
    /// Bytes returned to the budget by the idle sweep.
    pub reclaimed_bytes: u64,
    /// Completed sweeps.
    pub sweeps: u64,
    /// Times the ring cursor went back to offset zero.
    pub wraparounds: u64,
    /// Highest observed live usage in bytes.
    pub peak_used_bytes: usize,
    /// Total bytes ever granted.
    pub cumulative_allocated_bytes: u64,
}

impl ArenaStats {
    pub(crate) fn record_allocation(&mut self, size: usize, used_after: usize) {
        self.allocations += 1;
        self.cumulative_allocated_bytes += size as u64;
        self.peak_used_bytes = self.peak_used_bytes.max(used_after);
    }

    pub(crate) fn record_rejection(&mut self, error: &crate::MemoryError) {
        use crate::MemoryError;
        match error {
            MemoryError::BudgetExceeded { .. } => self.budget_rejections += 1,
            MemoryError::AllocationTooLarge { .. } => self.oversize_rejections += 1,
            MemoryError::RegionOccupied { .. } => self.overlap_rejections += 1,
            _ => {}
        }
    }

    pub(crate) fn record_release(&mut self) {
        self.releases += 1;
    }

    pub(crate) fn record_sweep(&mut self, reclaimed: usize, reclaimed_bytes: usize) {
        self.sweeps += 1;
        self.reclaimed += reclaimed as u64;
        self.reclaimed_bytes += reclaimed_bytes as u64;
    }

    /// Allocation requests that were refused, for any reason.
    pub fn total_rejections(&self) -> u64 {
        self.budget_rejections + self.oversize_rejections + self.overlap_rejections
    }

    /// Returns a one-line human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Allocations: {} granted, {} rejected ({} budget, {} oversize, {} overlap); \
             {} released, {} reclaimed ({} B) over {} sweeps; {} wraparounds, peak {} B",
            self.allocations,
            self.total_rejections(),
            self.budget_rejections,
            self.oversize_rejections,
            self.overlap_rejections,
            self.releases,
            self.reclaimed,
            self.reclaimed_bytes,
            self.sweeps,
            self.wraparounds,
            self.peak_used_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryError;

    #[test]
    fn test_default() {
        let s = ArenaStats::default();
        assert_eq!(s.allocations, 0);
        assert_eq!(s.total_rejections(), 0);
    }

    #[test]
    fn test_peak_does_not_decrease() {
        let mut s = ArenaStats::default();
        s.record_allocation(100, 100);
        s.record_allocation(200, 300);
        s.record_allocation(50, 150);
        assert_eq!(s.peak_used_bytes, 300);
        assert_eq!(s.cumulative_allocated_bytes, 350);
    }

    #[test]
    fn test_rejections_by_kind() {
        let mut s = ArenaStats::default();
        s.record_rejection(&MemoryError::BudgetExceeded {
            requested: 1,
            used: 1,
            budget: 1,
        });
        s.record_rejection(&MemoryError::AllocationTooLarge {
            requested: 2,
            capacity: 1,
        });
        s.record_rejection(&MemoryError::ZeroSizedAllocation);
        assert_eq!(s.budget_rejections, 1);
        assert_eq!(s.oversize_rejections, 1);
        assert_eq!(s.total_rejections(), 2);
    }

    #[test]
    fn test_summary() {
        let mut s = ArenaStats::default();
        s.record_allocation(100, 100);
        s.record_release();
        s.record_sweep(2, 300);
        let summary = s.summary();
        assert!(summary.contains("1 granted"));
        assert!(summary.contains("2 reclaimed (300 B) over 1 sweeps"));
    }

    #[test]
    fn test_serialises_to_json() {
        let mut s = ArenaStats::default();
        s.record_allocation(64, 64);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["allocations"], 1);
        assert_eq!(json["peak_used_bytes"], 64);
    }
}
