//! Reconciliation sweep for attachments stuck in `processing`.
//!
//! Scheduled work must complete durably: a crashed worker, a lost queue
//! send, or a failed terminal write all leave a row in `processing` with
//! nothing coming to finish it. The sweep periodically re-queues such rows,
//! and fails outright the ones that have exhausted their retry budget.

use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use parley_core::defaults::{EXTRACT_MAX_RETRIES, STUCK_THRESHOLD_SECS, SWEEP_INTERVAL_SECS};
use parley_core::{AttachmentRepository, Error, Result};
use parley_db::Database;

use crate::handler::ExtractionJob;
use crate::worker::ExtractionQueue;

/// Configuration for the reconciliation sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Seconds between sweeps.
    pub interval_secs: u64,
    /// Age past which a `processing` attachment counts as stuck.
    pub stuck_threshold_secs: u64,
    /// Re-queue attempts before giving up on an attachment.
    pub max_retries: i32,
    /// Whether the sweep runs at all.
    pub enabled: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: SWEEP_INTERVAL_SECS,
            stuck_threshold_secs: STUCK_THRESHOLD_SECS,
            max_retries: EXTRACT_MAX_RETRIES,
            enabled: true,
        }
    }
}

impl SweepConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `EXTRACT_SWEEP_ENABLED` | `true` | Enable/disable the sweep |
    /// | `EXTRACT_SWEEP_INTERVAL_SECS` | `60` | Seconds between sweeps |
    /// | `EXTRACT_STUCK_THRESHOLD_SECS` | `600` | Stuck age threshold |
    /// | `EXTRACT_MAX_RETRIES` | `3` | Retry budget per attachment |
    pub fn from_env() -> Self {
        let enabled = std::env::var("EXTRACT_SWEEP_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let interval_secs = std::env::var("EXTRACT_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(SWEEP_INTERVAL_SECS)
            .max(1);

        let stuck_threshold_secs = std::env::var("EXTRACT_STUCK_THRESHOLD_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(STUCK_THRESHOLD_SECS)
            .max(1);

        let max_retries = std::env::var("EXTRACT_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(EXTRACT_MAX_RETRIES)
            .max(0);

        Self {
            interval_secs,
            stuck_threshold_secs,
            max_retries,
            enabled,
        }
    }
}

/// What the sweep does with one stuck attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Put it back on the queue for another attempt.
    Requeue,
    /// Retry budget exhausted — record a terminal failure.
    Fail,
}

/// Decide the action for a stuck attachment given its updated retry count.
pub fn sweep_action(retry_count: i32, max_retries: i32) -> SweepAction {
    if retry_count > max_retries {
        SweepAction::Fail
    } else {
        SweepAction::Requeue
    }
}

/// Handle for stopping a running sweep.
pub struct SweepHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl SweepHandle {
    /// Signal the sweep to stop.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))
    }
}

/// One pass over the stuck rows. Separated from the loop for testability.
pub async fn run_sweep_once(
    db: &Database,
    queue: &ExtractionQueue,
    config: &SweepConfig,
) -> Result<usize> {
    let stuck = db
        .attachments
        .stuck_processing(config.stuck_threshold_secs)
        .await?;

    if stuck.is_empty() {
        return Ok(0);
    }

    info!(
        subsystem = "extract",
        component = "sweep",
        count = stuck.len(),
        "Found stuck attachments"
    );

    let mut requeued = 0;
    for attachment in stuck {
        let retries = db.attachments.bump_retry(attachment.id).await?;
        match sweep_action(retries, config.max_retries) {
            SweepAction::Fail => {
                warn!(
                    attachment_id = %attachment.id,
                    retries,
                    "Attachment exhausted its retry budget, failing it"
                );
                db.attachments
                    .mark_failed(
                        attachment.id,
                        &format!("Extraction did not complete after {} attempts", retries),
                    )
                    .await?;
            }
            SweepAction::Requeue => {
                debug!(attachment_id = %attachment.id, retries, "Re-queueing stuck attachment");
                queue
                    .submit(ExtractionJob {
                        attachment_id: attachment.id,
                    })
                    .await?;
                requeued += 1;
            }
        }
    }

    Ok(requeued)
}

/// Start the periodic sweep.
pub fn start_sweep(db: Database, queue: ExtractionQueue, config: SweepConfig) -> SweepHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

    tokio::spawn(async move {
        if !config.enabled {
            info!("Reconciliation sweep is disabled, not starting");
            return;
        }

        info!(
            interval_secs = config.interval_secs,
            stuck_threshold_secs = config.stuck_threshold_secs,
            max_retries = config.max_retries,
            "Reconciliation sweep started"
        );

        let mut ticker = interval(Duration::from_secs(config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it so a fresh boot does
        // not re-queue rows the workers are about to pick up anyway.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => {
                    if let Err(e) = run_sweep_once(&db, &queue, &config).await {
                        warn!(error = %e, "Reconciliation sweep pass failed");
                    }
                }
            }
        }

        info!("Reconciliation sweep stopped");
    });

    SweepHandle { shutdown_tx }
}
