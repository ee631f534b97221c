// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Periodic background eviction of idle allocations.
//!
//! ```text
//!   allocate ──► Active ──access/read/write──► Active
//!                  │                              │
//!          release │                 idle > limit │ (next tick)
//!                  ▼                              ▼
//!              Released                       Reclaimed
//! ```
//!
//! The [`IdleReclaimer`] runs [`AllocationRegistry::reclaim_idle`] on a
//! fixed tokio interval. Each sweep is synchronous inside the task, so a
//! shutdown request is only observed between sweeps and never leaves the
//! budget half-updated.

use crate::{AllocationRegistry, MemoryError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Sweeps a registry for idle allocations at a fixed period.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ring_arena::{AllocationRegistry, ArenaConfig, IdleReclaimer};
///
/// # async fn example() -> Result<(), ring_arena::MemoryError> {
/// let registry = Arc::new(AllocationRegistry::new(ArenaConfig::default())?);
/// let reclaimer = IdleReclaimer::from_config(Arc::clone(&registry)).spawn();
///
/// let h = registry.allocate(1024)?;
/// registry.write(h, b"payload")?;
/// // Left alone for 30 s, `h` is reclaimed by a later sweep.
///
/// reclaimer.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct IdleReclaimer {
    registry: Arc<AllocationRegistry>,
    interval: Duration,
}

impl IdleReclaimer {
    /// Creates a reclaimer sweeping every `interval`.
    ///
    /// Fails with [`MemoryError::InvalidConfig`] if `interval` is zero.
    pub fn new(registry: Arc<AllocationRegistry>, interval: Duration) -> Result<Self, MemoryError> {
        if interval.is_zero() {
            return Err(MemoryError::InvalidConfig(
                "sweep interval must be non-zero".into(),
            ));
        }
        Ok(Self { registry, interval })
    }

    /// Creates a reclaimer using the registry's configured sweep interval.
    ///
    /// The registry validated its config on construction, so the interval
    /// is already known to be non-zero.
    pub fn from_config(registry: Arc<AllocationRegistry>) -> Self {
        let interval = registry.config().sweep_interval();
        Self { registry, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts the sweep loop on the current tokio runtime.
    ///
    /// The first sweep happens one interval after the call.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn spawn(self) -> ReclaimerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            idle_threshold_ms = self.registry.idle_threshold().as_millis() as u64,
            "idle reclaimer started"
        );
        let task = tokio::spawn(run(self.registry, self.interval, shutdown_rx));
        ReclaimerHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

async fn run(registry: Arc<AllocationRegistry>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = registry.reclaim_idle();
                tracing::trace!(
                    scanned = report.scanned,
                    reclaimed = report.reclaimed,
                    skipped = report.skipped,
                    "idle sweep finished"
                );
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("idle reclaimer stopped");
}

/// Controls a running [`IdleReclaimer`].
///
/// Dropping the handle asks the loop to stop without waiting for it.
#[derive(Debug)]
pub struct ReclaimerHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ReclaimerHandle {
    /// Stops the loop after any in-flight sweep and waits for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("idle reclaimer task failed: {e}");
            }
        }
    }

    /// Returns `true` once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ReclaimerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
