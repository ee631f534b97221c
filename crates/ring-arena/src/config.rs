// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! capacity = "100M"
//! max_budget = "100M"
//! idle_threshold_ms = 30000
//! sweep_interval_ms = 30000
//! overlap_policy = "permit"
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use crate::{ByteSize, MemoryError};
use std::path::Path;
use std::time::Duration;

/// What the registry does when the ring hands out a range that overlaps a
/// live allocation (only possible after wraparound).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Grant the range anyway. The older allocation's bytes may be
    /// overwritten; callers own that risk.
    #[default]
    Permit,
    /// Refuse the request with [`MemoryError::RegionOccupied`] and leave
    /// the cursor where it was.
    Reject,
}

/// Configuration for an [`AllocationRegistry`](crate::AllocationRegistry).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Size of the backing store (human-readable, e.g. `"100M"`).
    pub capacity: String,
    /// Ceiling on bytes simultaneously allocated. Must not exceed `capacity`.
    pub max_budget: String,
    /// Allocations idle for longer than this are reclaimed.
    pub idle_threshold_ms: u64,
    /// Period of the background idle sweep.
    pub sweep_interval_ms: u64,
    /// Handling of ranges that alias a live allocation after wraparound.
    pub overlap_policy: OverlapPolicy,
}

impl ArenaConfig {
    /// Builds a config from raw byte counts and millisecond timings.
    pub fn with_limits(
        capacity_bytes: usize,
        max_budget_bytes: usize,
        idle_threshold_ms: u64,
        sweep_interval_ms: u64,
    ) -> Self {
        Self {
            capacity: capacity_bytes.to_string(),
            max_budget: max_budget_bytes.to_string(),
            idle_threshold_ms,
            sweep_interval_ms,
            overlap_policy: OverlapPolicy::Permit,
        }
    }

    /// Returns the config with a different overlap policy.
    pub fn overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, MemoryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MemoryError::InvalidConfig(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, MemoryError> {
        toml::from_str(toml_str)
            .map_err(|e| MemoryError::InvalidConfig(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, MemoryError> {
        toml::to_string_pretty(self)
            .map_err(|e| MemoryError::InvalidConfig(format!("TOML serialise error: {e}")))
    }

    /// Parses the capacity string.
    pub fn parse_capacity(&self) -> Result<ByteSize, MemoryError> {
        ByteSize::parse(&self.capacity)
            .map_err(|e| MemoryError::InvalidConfig(format!("invalid capacity: {e}")))
    }

    /// Parses the budget string.
    pub fn parse_max_budget(&self) -> Result<ByteSize, MemoryError> {
        ByteSize::parse(&self.max_budget)
            .map_err(|e| MemoryError::InvalidConfig(format!("invalid max_budget: {e}")))
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_millis(self.idle_threshold_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Checks every setting and returns the parsed `(capacity, max_budget)`.
    pub fn validate(&self) -> Result<(ByteSize, ByteSize), MemoryError> {
        let capacity = self.parse_capacity()?;
        let max_budget = self.parse_max_budget()?;
        if max_budget > capacity {
            return Err(MemoryError::InvalidConfig(format!(
                "max_budget ({max_budget}) exceeds capacity ({capacity})"
            )));
        }
        if self.sweep_interval_ms == 0 {
            return Err(MemoryError::InvalidConfig(
                "sweep_interval_ms must be non-zero".into(),
            ));
        }
        Ok((capacity, max_budget))
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            capacity: "100M".to_string(),
            max_budget: "100M".to_string(),
            idle_threshold_ms: 30_000,
            sweep_interval_ms: 30_000,
            overlap_policy: OverlapPolicy::Permit,
        }
    }
}
