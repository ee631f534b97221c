// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Human-readable byte quantities.
//!
//! A [`ByteSize`] is used for the arena's capacity and budget settings so
//! configuration files can say `"100M"` instead of `104857600`.

use crate::MemoryError;
use std::fmt;

const KB: usize = 1024;
const MB: usize = KB * 1024;
const GB: usize = MB * 1024;

/// Longest suffix first so `"MB"` is not read as a `"B"` count.
const SUFFIXES: [(&str, usize); 7] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
    ("B", 1),
];

/// A byte count with human-readable parsing and display.
///
/// # Parsing
/// Supports binary suffixes, case-insensitive:
/// - `"512M"` or `"512MB"` → 512 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"2048K"` or `"2048KB"` → 2048 × 1024 bytes
/// - `"1024"` or `"1024B"` → raw byte count
///
/// # Examples
/// ```
/// use ring_arena::ByteSize;
///
/// let s = ByteSize::from_mb(100);
/// assert_eq!(s.as_bytes(), 100 * 1024 * 1024);
///
/// let s = ByteSize::parse("1K").unwrap();
/// assert_eq!(s.as_bytes(), 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ByteSize {
    bytes: usize,
}

impl ByteSize {
    /// Creates a size from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a size from kilobytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KB }
    }

    /// Creates a size from megabytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    /// Returns the size in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the size in megabytes (truncated).
    pub fn as_mb(&self) -> usize {
        self.bytes / MB
    }

    /// Parses a human-readable size string. Zero is rejected.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MemoryError::InvalidConfig("empty size string".into()));
        }

        let upper = s.to_ascii_uppercase();
        let (num_str, multiplier) = SUFFIXES
            .iter()
            .find_map(|&(suffix, unit)| {
                upper
                    .strip_suffix(suffix)
                    .map(|rest| (&s[..rest.len()], unit))
            })
            .unwrap_or((s, 1));

        let value: usize = num_str.trim().parse().map_err(|_| {
            MemoryError::InvalidConfig(format!(
                "invalid size '{s}': expected a number with an optional K, M or G suffix"
            ))
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| MemoryError::InvalidConfig(format!("size overflow: '{s}'")))?;

        if bytes == 0 {
            return Err(MemoryError::InvalidConfig(format!("size must be non-zero: '{s}'")));
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            b if b >= GB && b % GB == 0 => write!(f, "{}G", b / GB),
            b if b >= MB && b % MB == 0 => write!(f, "{}M", b / MB),
            b if b >= KB && b % KB == 0 => write!(f, "{}K", b / KB),
            b => write!(f, "{b}"),
        }
    }
}
