// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Buffered, fire-and-forget audit event store.
//!
//! Producers enqueue with `try_send` and never block: a full buffer drops
//! the event and increments an observable counter. A background worker
//! drains the buffer on a batch-size or flush-interval trigger, retries
//! durable writes boundedly, and falls back to the DLQ so events are
//! delayed rather than lost. Audit failures never propagate to callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use courier_core::metrics;

use crate::backend::{AuditBackend, AuditDlq};
use crate::error::AuditError;
use crate::event::AuditEvent;

/// Buffering and flush policy for the store.
#[derive(Debug, Clone, Copy)]
pub struct AuditStoreConfig {
    /// Capacity of the in-memory buffer; submissions beyond it are dropped.
    pub buffer_size: usize,
    /// Batch size that triggers an immediate flush.
    pub batch_size: usize,
    /// Interval at which a partial batch is flushed anyway.
    pub flush_interval: Duration,
    /// Bounded retries for a failing durable write before the DLQ fallback.
    pub write_retries: u32,
    /// Base delay between durable-write retries (multiplied by attempt).
    pub write_retry_delay: Duration,
    /// Bound on the synchronous drain performed by [`BufferedAuditStore::close`].
    pub shutdown_timeout: Duration,
}

impl Default for AuditStoreConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            batch_size: 32,
            flush_interval: Duration::from_secs(5),
            write_retries: 3,
            write_retry_delay: Duration::from_millis(500),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// The buffered audit store. Constructed once at process start; flushed and
/// drained by [`close`](Self::close) on every graceful exit path.
pub struct BufferedAuditStore {
    tx: mpsc::Sender<AuditEvent>,
    dropped: AtomicU64,
    closing: AtomicBool,
    shutdown: CancellationToken,
    shutdown_timeout: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BufferedAuditStore {
    /// Creates the store and spawns its background flush worker.
    pub fn new(
        backend: Arc<dyn AuditBackend>,
        dlq: Arc<dyn AuditDlq>,
        config: AuditStoreConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.buffer_size.max(1));
        let shutdown = CancellationToken::new();

        let worker = tokio::spawn(flush_worker(
            rx,
            backend,
            dlq,
            config,
            shutdown.clone(),
        ));

        Self {
            tx,
            dropped: AtomicU64::new(0),
            closing: AtomicBool::new(false),
            shutdown,
            shutdown_timeout: config.shutdown_timeout,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueues an event for eventual durable persistence.
    ///
    /// O(1) and non-blocking by construction: when the buffer is full or the
    /// store is closing, the event is dropped, counted, and logged. The
    /// caller is the delivery path and must never be failed or suspended by
    /// audit backpressure, so there is deliberately no error to return.
    pub fn submit(&self, event: AuditEvent) {
        if self.closing.load(Ordering::Acquire) {
            self.count_drop(&event, "store closing");
            return;
        }

        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.count_drop(&event, "buffer full");
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.count_drop(&event, "worker stopped");
            }
        }
    }

    /// Number of events dropped at the buffer since construction.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops accepting submissions, synchronously drains buffered events
    /// within the shutdown timeout, and stops the worker.
    pub async fn close(&self) -> Result<(), AuditError> {
        self.closing.store(true, Ordering::Release);
        self.shutdown.cancel();

        let handle = self.worker.lock().await.take();
        let Some(handle) = handle else {
            return Ok(());
        };

        info!("draining audit store");
        match tokio::time::timeout(self.shutdown_timeout, handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(join_err)) => {
                error!(error = %join_err, "audit flush worker panicked");
                Ok(())
            }
            Err(_) => {
                warn!(timeout = ?self.shutdown_timeout, "audit drain timed out");
                Err(AuditError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }

    fn count_drop(&self, event: &AuditEvent, reason: &str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::record_audit_drop();
        warn!(
            event_type = %event.event_type,
            correlation_id = %event.correlation_id,
            reason,
            "audit event dropped"
        );
    }
}

/// Background task draining the buffer into the durable backend.
async fn flush_worker(
    mut rx: mpsc::Receiver<AuditEvent>,
    backend: Arc<dyn AuditBackend>,
    dlq: Arc<dyn AuditDlq>,
    config: AuditStoreConfig,
    shutdown: CancellationToken,
) {
    let mut batch: Vec<AuditEvent> = Vec::with_capacity(config.batch_size);
    let mut interval = tokio::time::interval(config.flush_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                // Drain whatever is already buffered, then flush and stop.
                while let Ok(event) = rx.try_recv() {
                    batch.push(event);
                    if batch.len() >= config.batch_size {
                        flush(&backend, &dlq, &config, &mut batch).await;
                    }
                }
                flush(&backend, &dlq, &config, &mut batch).await;
                debug!("audit flush worker stopped");
                return;
            }
            received = rx.recv() => {
                match received {
                    Some(event) => {
                        batch.push(event);
                        if batch.len() >= config.batch_size {
                            flush(&backend, &dlq, &config, &mut batch).await;
                        }
                    }
                    None => {
                        flush(&backend, &dlq, &config, &mut batch).await;
                        debug!("audit submit side closed, worker stopping");
                        return;
                    }
                }
            }
            _ = interval.tick() => {
                if !batch.is_empty() {
                    flush(&backend, &dlq, &config, &mut batch).await;
                }
            }
        }
    }
}

/// Writes `batch` durably, retrying boundedly and falling back to the DLQ.
///
/// The batch is always cleared: events either reached the backend, reached
/// the DLQ, or were logged and discarded (the documented five-nines target,
/// not an absolute guarantee).
async fn flush(
    backend: &Arc<dyn AuditBackend>,
    dlq: &Arc<dyn AuditDlq>,
    config: &AuditStoreConfig,
    batch: &mut Vec<AuditEvent>,
) {
    if batch.is_empty() {
        return;
    }

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match backend.write_batch(batch).await {
            Ok(()) => {
                debug!(events = batch.len(), "audit batch persisted");
                batch.clear();
                return;
            }
            Err(err) if attempt <= config.write_retries => {
                warn!(attempt, error = %err, "audit batch write failed, retrying");
                tokio::time::sleep(config.write_retry_delay * attempt).await;
            }
            Err(err) => {
                warn!(
                    events = batch.len(),
                    error = %err,
                    "audit backend unavailable, falling back to DLQ"
                );
                metrics::record_audit_flush_failure();
                for event in batch.drain(..) {
                    match dlq.append(&event).await {
                        Ok(()) => metrics::record_audit_dlq_write(),
                        Err(dlq_err) => {
                            metrics::record_audit_dlq_failure();
                            error!(
                                event_type = %event.event_type,
                                correlation_id = %event.correlation_id,
                                error = %dlq_err,
                                "audit event lost: DLQ append failed"
                            );
                        }
                    }
                }
                return;
            }
        }
    }
}
