// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared setup.

pub mod config;
pub mod demo;

use crate::ConfigOverrides;
use ring_arena::{ArenaConfig, OverlapPolicy};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the config file (or defaults) and applies command-line overrides.
pub fn resolve_config(path: Option<&Path>, overrides: ConfigOverrides) -> anyhow::Result<ArenaConfig> {
    let mut config = match path {
        Some(p) => ArenaConfig::from_file(p)?,
        None => ArenaConfig::default(),
    };

    if let Some(capacity) = overrides.capacity {
        config.capacity = capacity;
    }
    if let Some(budget) = overrides.budget {
        config.max_budget = budget;
    }
    if let Some(idle) = overrides.idle_ms {
        config.idle_threshold_ms = idle;
    }
    if let Some(sweep) = overrides.sweep_ms {
        config.sweep_interval_ms = sweep;
    }
    if overrides.reject_overlap {
        config.overlap_policy = OverlapPolicy::Reject;
    }

    config.validate()?;
    Ok(config)
}
