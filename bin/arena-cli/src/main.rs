// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # arena
//!
//! Command-line driver for the ring-arena allocator.
//!
//! ## Usage
//! ```bash
//! # Replay the allocate/access/release/reclaim scenario with scaled timings
//! arena demo --idle-ms 3000 --sweep-ms 3000 --duration-ms 9000
//!
//! # Print the effective configuration
//! arena --config arena.toml config
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arena",
    about = "Budget-enforced ring allocator with idle reclamation",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (CLI overrides take precedence).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the configuration file or defaults.
#[derive(clap::Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Backing store size (e.g., "100M").
    #[arg(long)]
    capacity: Option<String>,

    /// Ceiling on live allocated bytes (e.g., "100M").
    #[arg(short = 'b', long)]
    budget: Option<String>,

    /// Idle time after which an allocation is reclaimed, in milliseconds.
    #[arg(long)]
    idle_ms: Option<u64>,

    /// Period of the idle sweep, in milliseconds.
    #[arg(long)]
    sweep_ms: Option<u64>,

    /// Reject allocations that would overlap a live one after wraparound.
    #[arg(long)]
    reject_overlap: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run two workers against a shared registry while a monitor reports usage.
    Demo {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// How long to run before printing the final state, in milliseconds.
        #[arg(long, default_value_t = 90_000)]
        duration_ms: u64,

        /// Period of the usage monitor, in milliseconds.
        #[arg(long, default_value_t = 5_000)]
        monitor_ms: u64,
    },

    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Demo {
            overrides,
            duration_ms,
            monitor_ms,
        } => {
            let config = commands::resolve_config(cli.config.as_deref(), overrides)?;
            commands::demo::execute(config, duration_ms, monitor_ms).await
        }
        Commands::Config { overrides } => {
            let config = commands::resolve_config(cli.config.as_deref(), overrides)?;
            commands::config::execute(&config)
        }
    }
}
