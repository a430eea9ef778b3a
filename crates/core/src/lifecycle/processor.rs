//! Background loop draining the queue into the priority cache.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::coordinator::{ProcessOutcome, TicketLifecycle};
use super::error::LifecycleError;

/// Upper bound on messages handled per tick, so shutdown stays responsive.
const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub processed: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorStatus {
    pub running: bool,
    pub processed_total: u64,
    pub discarded_total: u64,
}

/// Drain until the queue is idle or `max` messages were handled.
///
/// Stops at the first error; messages already handled stay handled.
pub async fn drain(
    lifecycle: &TicketLifecycle,
    max: usize,
) -> Result<DrainReport, LifecycleError> {
    let mut report = DrainReport::default();
    for _ in 0..max {
        match lifecycle.process_pending().await? {
            ProcessOutcome::Idle => break,
            ProcessOutcome::Processed { .. } => report.processed += 1,
            ProcessOutcome::Discarded { .. } => report.discarded += 1,
        }
    }
    Ok(report)
}

/// Polls the queue on an interval and calls `process_pending` until idle.
pub struct TicketProcessor {
    lifecycle: Arc<TicketLifecycle>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    processed_total: Arc<AtomicU64>,
    discarded_total: Arc<AtomicU64>,
    shutdown_tx: broadcast::Sender<()>,
}

impl TicketProcessor {
    pub fn new(lifecycle: Arc<TicketLifecycle>, poll_interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            lifecycle,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            processed_total: Arc::new(AtomicU64::new(0)),
            discarded_total: Arc::new(AtomicU64::new(0)),
            shutdown_tx,
        }
    }

    /// Start the poll loop (spawns a background task).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Ticket processor already running");
            return;
        }
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "Starting ticket processor"
        );
        self.spawn_poll_loop();
    }

    /// Signal the loop to stop after its current tick.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Ticket processor not running");
            return;
        }
        info!("Stopping ticket processor");
        let _ = self.shutdown_tx.send(());
    }

    pub fn status(&self) -> ProcessorStatus {
        ProcessorStatus {
            running: self.running.load(Ordering::Relaxed),
            processed_total: self.processed_total.load(Ordering::Relaxed),
            discarded_total: self.discarded_total.load(Ordering::Relaxed),
        }
    }

    fn spawn_poll_loop(&self) {
        let lifecycle = Arc::clone(&self.lifecycle);
        let running = Arc::clone(&self.running);
        let processed_total = Arc::clone(&self.processed_total);
        let discarded_total = Arc::clone(&self.discarded_total);
        let poll_interval = self.poll_interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Processor loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Processor loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(poll_interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        match drain(&lifecycle, MAX_BATCH).await {
                            Ok(report) => {
                                if report.processed + report.discarded > 0 {
                                    debug!(
                                        processed = report.processed,
                                        discarded = report.discarded,
                                        "Drained queue"
                                    );
                                }
                                processed_total.fetch_add(report.processed as u64, Ordering::Relaxed);
                                discarded_total.fetch_add(report.discarded as u64, Ordering::Relaxed);
                            }
                            Err(e) => warn!("Processing error, retrying next tick: {}", e),
                        }
                    }
                }
            }
            info!("Processor loop stopped");
        });
    }
}
