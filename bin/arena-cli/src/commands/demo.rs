// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `arena demo` command: two workers share one registry.
//!
//! ```text
//! worker 1: allocate 1M + 2M ─ wait ─ access 1M ─ release 1M   (2M abandoned)
//! worker 2: allocate 3M ─ (wait, access) × 3                   (3M abandoned)
//! monitor:  print usage every --monitor-ms
//! reclaimer: evicts the abandoned buffers once they pass --idle-ms
//! ```
//!
//! Worker pauses are fixed fractions of `--duration-ms`, so shrinking the
//! run together with `--idle-ms` and `--sweep-ms` replays the same story
//! faster.

use ring_arena::{AllocationRegistry, ArenaConfig, IdleReclaimer};
use std::sync::Arc;
use std::time::Duration;

const MB: usize = 1024 * 1024;

pub async fn execute(config: ArenaConfig, duration_ms: u64, monitor_ms: u64) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             arena · Idle Reclamation Demo            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let registry = Arc::new(AllocationRegistry::new(config)?);
    let cfg = registry.config();
    println!("  Config:");
    println!("   Capacity:   {}", cfg.capacity);
    println!("   Budget:     {}", cfg.max_budget);
    println!("   Idle after: {} ms", cfg.idle_threshold_ms);
    println!("   Sweep:      every {} ms", cfg.sweep_interval_ms);
    println!("   Overlaps:   {:?}", cfg.overlap_policy);
    println!();

    tracing::info!(duration_ms, monitor_ms, "demo starting");
    let reclaimer = IdleReclaimer::from_config(Arc::clone(&registry)).spawn();

    // One pause unit is 1 s of a 90 s run.
    let pause = Duration::from_millis((duration_ms / 90).max(1));

    let worker1 = tokio::spawn(worker_one(Arc::clone(&registry), pause * 2));
    let worker2 = tokio::spawn(worker_two(Arc::clone(&registry), pause * 5));
    let monitor = tokio::spawn(monitor(
        Arc::clone(&registry),
        Duration::from_millis(monitor_ms.max(1)),
    ));

    tokio::time::sleep(Duration::from_millis(duration_ms)).await;

    for (name, worker) in [("worker 1", worker1), ("worker 2", worker2)] {
        match worker.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => println!("  {name} failed: {e}"),
            Err(e) => println!("  {name} panicked: {e}"),
        }
    }
    monitor.abort();
    reclaimer.shutdown().await;

    println!();
    println!("  Final memory usage:   {} MB", registry.current_used() / MB);
    println!("  Final tracked count:  {}", registry.tracked_count());
    println!();
    println!("{}", registry.stats().summary());
    Ok(())
}

async fn worker_one(registry: Arc<AllocationRegistry>, pause: Duration) -> anyhow::Result<()> {
    let first = registry.allocate(MB)?;
    let _second = registry.allocate(2 * MB)?;
    println!(
        "  Worker 1 allocated 1 MB + 2 MB, usage: {} MB",
        registry.current_used() / MB
    );

    tokio::time::sleep(pause).await;
    registry.access(first)?;
    println!("  Worker 1 accessed its 1 MB buffer");

    registry.release(first);
    println!(
        "  Worker 1 released its 1 MB buffer, usage: {} MB",
        registry.current_used() / MB
    );
    // The 2 MB buffer is left for the reclaimer.
    Ok(())
}

async fn worker_two(registry: Arc<AllocationRegistry>, pause: Duration) -> anyhow::Result<()> {
    let buffer = registry.allocate(3 * MB)?;
    println!(
        "  Worker 2 allocated 3 MB, usage: {} MB",
        registry.current_used() / MB
    );

    for round in 1..=3 {
        tokio::time::sleep(pause).await;
        match registry.access(buffer) {
            Ok(()) => println!("  Worker 2 accessed its 3 MB buffer, round {round}"),
            Err(e) => {
                println!("  Worker 2 lost its buffer: {e}");
                break;
            }
        }
    }
    Ok(())
}

async fn monitor(registry: Arc<AllocationRegistry>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        println!(
            "  [monitor] usage: {} MB, tracked: {}",
            registry.current_used() / MB,
            registry.tracked_count()
        );
    }
}
