//! Bounded worker pool over an in-process extraction queue.
//!
//! Extraction is scheduled by the upload path and executed here, off the
//! request cycle. Concurrency is bounded by a semaphore so a burst of
//! uploads queues instead of fanning out unbounded background tasks.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Semaphore};
use tracing::{debug, error, info};
use uuid::Uuid;

use parley_core::defaults::{
    EXTRACT_MAX_WORKERS, EXTRACT_QUEUE_CAPACITY, WORKER_EVENT_CAPACITY,
};
use parley_core::{AttachmentStatus, Error, Result};

use crate::handler::{ExtractionJob, JobHandler, JobResult};

/// Configuration for the extraction worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum number of concurrently running extraction jobs.
    pub max_workers: usize,
    /// Capacity of the in-process job queue.
    pub queue_capacity: usize,
    /// Whether to enable job processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_workers: EXTRACT_MAX_WORKERS,
            queue_capacity: EXTRACT_QUEUE_CAPACITY,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `EXTRACT_WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `EXTRACT_MAX_WORKERS` | `4` | Max concurrent extraction jobs |
    /// | `EXTRACT_QUEUE_CAPACITY` | `64` | In-process queue capacity |
    pub fn from_env() -> Self {
        let enabled = std::env::var("EXTRACT_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_workers = std::env::var("EXTRACT_MAX_WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(EXTRACT_MAX_WORKERS)
            .max(1);

        let queue_capacity = std::env::var("EXTRACT_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(EXTRACT_QUEUE_CAPACITY)
            .max(1);

        Self {
            max_workers,
            queue_capacity,
            enabled,
        }
    }

    /// Set maximum concurrent workers.
    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    /// Set queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the worker pool.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Worker pool started.
    WorkerStarted,
    /// Worker pool stopped.
    WorkerStopped,
    /// A job began executing.
    JobStarted { attachment_id: Uuid },
    /// A job drove its attachment to a terminal state.
    JobTerminal {
        attachment_id: Uuid,
        status: AttachmentStatus,
    },
    /// A job errored without reaching a terminal state.
    JobErrored {
        attachment_id: Uuid,
        error: String,
    },
}

/// Submission side of the extraction queue.
#[derive(Clone)]
pub struct ExtractionQueue {
    tx: mpsc::Sender<ExtractionJob>,
}

impl ExtractionQueue {
    /// Enqueue a job, waiting if the queue is full.
    pub async fn submit(&self, job: ExtractionJob) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|_| Error::Internal("Extraction queue is closed".into()))
    }
}

/// Handle for controlling a running worker pool.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the pool to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Worker pool draining the extraction queue through a job handler.
pub struct WorkerPool {
    handler: Arc<dyn JobHandler>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(handler: Arc<dyn JobHandler>, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(WORKER_EVENT_CAPACITY);
        Self {
            handler,
            config,
            event_tx,
        }
    }

    /// Start the pool, returning the queue and a control handle.
    pub fn start(self) -> (ExtractionQueue, WorkerHandle) {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(rx, shutdown_rx).await;
        });

        (
            ExtractionQueue { tx },
            WorkerHandle {
                shutdown_tx,
                event_rx,
            },
        )
    }

    /// Pool loop: claim a concurrency permit, pull the next job, execute it
    /// on a spawned task. Only sleeps inside channel awaits.
    async fn run(
        self,
        mut rx: mpsc::Receiver<ExtractionJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        if !self.config.enabled {
            info!("Extraction worker pool is disabled, not starting");
            return;
        }

        info!(
            max_workers = self.config.max_workers,
            queue_capacity = self.config.queue_capacity,
            "Extraction worker pool started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));

        loop {
            // Wait for a free worker slot before pulling work, so the queue
            // provides the backpressure.
            let permit = tokio::select! {
                _ = shutdown_rx.recv() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let job = tokio::select! {
                _ = shutdown_rx.recv() => break,
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let handler = self.handler.clone();
            let event_tx = self.event_tx.clone();
            tokio::spawn(async move {
                let attachment_id = job.attachment_id;
                debug!(attachment_id = %attachment_id, "Extraction job started");
                let _ = event_tx.send(WorkerEvent::JobStarted { attachment_id });

                match handler.execute(job).await {
                    JobResult::Terminal(status) => {
                        debug!(attachment_id = %attachment_id, status = %status, "Extraction job terminal");
                        let _ = event_tx.send(WorkerEvent::JobTerminal {
                            attachment_id,
                            status,
                        });
                    }
                    JobResult::Errored(error) => {
                        error!(attachment_id = %attachment_id, error = %error, "Extraction job errored");
                        let _ = event_tx.send(WorkerEvent::JobErrored {
                            attachment_id,
                            error,
                        });
                    }
                }
                drop(permit);
            });
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Extraction worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Handler that records its own peak concurrency.
    struct CountingHandler {
        current: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl CountingHandler {
        fn new(delay: Duration) -> Self {
            Self {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn execute(&self, job: ExtractionJob) -> JobResult {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            let _ = job;
            JobResult::Terminal(AttachmentStatus::Completed)
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_workers, EXTRACT_MAX_WORKERS);
        assert_eq!(config.queue_capacity, EXTRACT_QUEUE_CAPACITY);
        assert!(config.enabled);
    }

    #[test]
    fn test_config_builders_clamp_to_one() {
        let config = WorkerConfig::default()
            .with_max_workers(0)
            .with_queue_capacity(0);
        assert_eq!(config.max_workers, 1);
        assert_eq!(config.queue_capacity, 1);
    }

    #[tokio::test]
    async fn test_pool_respects_max_workers() {
        let handler = Arc::new(CountingHandler::new(Duration::from_millis(50)));
        let pool = WorkerPool::new(
            handler.clone(),
            WorkerConfig::default().with_max_workers(2),
        );
        let (queue, handle) = pool.start();

        let mut events = handle.events();
        for _ in 0..6 {
            queue
                .submit(ExtractionJob {
                    attachment_id: Uuid::now_v7(),
                })
                .await
                .unwrap();
        }

        // Wait for all six terminal events
        let mut terminal = 0;
        while terminal < 6 {
            match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
                Ok(Ok(WorkerEvent::JobTerminal { .. })) => terminal += 1,
                Ok(Ok(_)) => {}
                other => panic!("event stream ended early: {:?}", other),
            }
        }

        assert!(handler.peak.load(Ordering::SeqCst) <= 2);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_pool_start_and_shutdown_events() {
        let handler = Arc::new(CountingHandler::new(Duration::from_millis(1)));
        let pool = WorkerPool::new(handler, WorkerConfig::default());
        let (_queue, handle) = pool.start();

        let mut events = handle.events();
        match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
            Ok(Ok(WorkerEvent::WorkerStarted)) => {}
            other => panic!("expected WorkerStarted: {:?}", other),
        }

        handle.shutdown().await.unwrap();
        loop {
            match tokio::time::timeout(Duration::from_secs(1), events.recv()).await {
                Ok(Ok(WorkerEvent::WorkerStopped)) => break,
                Ok(Ok(_)) => {}
                other => panic!("expected WorkerStopped: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_disabled_pool_closes_queue() {
        let handler = Arc::new(CountingHandler::new(Duration::from_millis(1)));
        let pool = WorkerPool::new(handler, WorkerConfig::default().with_enabled(false));
        let (queue, _handle) = pool.start();

        // Give the disabled pool a moment to drop the receiver
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = queue
            .submit(ExtractionJob {
                attachment_id: Uuid::now_v7(),
            })
            .await;
        assert!(result.is_err());
    }
}
