// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work-queue dispatcher: the runnable stand-in for an external
//! watch/requeue mechanism.
//!
//! Reconciles are single-flight per resource id: a resource is never
//! reconciled by two workers at once. Ids submitted while their resource is
//! in flight are parked and re-queued when the running reconcile finishes.
//! Transient reconcile errors and explicit requeue-after results are fed
//! back into the queue on a timer.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use courier_core::error::CourierError;
use courier_core::types::ResourceId;
use courier_reconciler::Reconciler;

/// The dispatcher's view of a reconciler. Object-safe so tests can script
/// reconcile outcomes.
#[async_trait]
pub trait Reconcile: Send + Sync {
    async fn reconcile(&self, id: &ResourceId) -> Result<Option<Duration>, CourierError>;
}

#[async_trait]
impl Reconcile for Reconciler {
    async fn reconcile(&self, id: &ResourceId) -> Result<Option<Duration>, CourierError> {
        Reconciler::reconcile(self, id).await
    }
}

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Concurrent reconcile workers.
    pub workers: usize,
    /// Capacity of the submission queue.
    pub queue_capacity: usize,
    /// Backoff before requeueing a reconcile that failed transiently.
    pub error_requeue: Duration,
    /// Bound on the in-flight drain at shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
            error_requeue: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Cloneable submission handle for the dispatcher's queue.
#[derive(Clone)]
pub struct WorkQueue {
    tx: mpsc::Sender<ResourceId>,
}

impl WorkQueue {
    /// Queue a resource for reconciliation. Quietly dropped once the
    /// dispatcher has stopped.
    pub async fn submit(&self, id: ResourceId) {
        if self.tx.send(id).await.is_err() {
            debug!("dispatcher stopped, submission dropped");
        }
    }
}

/// Single-flight work-queue dispatcher.
pub struct Dispatcher {
    reconciler: Arc<dyn Reconcile>,
    config: DispatcherConfig,
    tx: mpsc::Sender<ResourceId>,
    rx: mpsc::Receiver<ResourceId>,
}

impl Dispatcher {
    pub fn new(reconciler: Arc<dyn Reconcile>, config: DispatcherConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            reconciler,
            config,
            tx,
            rx,
        }
    }

    /// A submission handle usable from intake tasks.
    pub fn queue(&self) -> WorkQueue {
        WorkQueue {
            tx: self.tx.clone(),
        }
    }

    /// Run until `cancel` fires, then drain in-flight reconciles within the
    /// shutdown timeout.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ready: VecDeque<ResourceId> = VecDeque::new();
        let mut in_flight: HashSet<ResourceId> = HashSet::new();
        let mut parked: HashSet<ResourceId> = HashSet::new();
        let mut tasks: JoinSet<(ResourceId, Result<Option<Duration>, CourierError>)> =
            JoinSet::new();

        info!(workers = self.config.workers, "dispatcher started");

        loop {
            while in_flight.len() < self.config.workers {
                let Some(id) = ready.pop_front() else { break };
                in_flight.insert(id.clone());
                let reconciler = Arc::clone(&self.reconciler);
                tasks.spawn(async move {
                    let result = reconciler.reconcile(&id).await;
                    (id, result)
                });
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                submitted = self.rx.recv() => {
                    match submitted {
                        Some(id) if in_flight.contains(&id) => {
                            // Re-run after the current reconcile finishes;
                            // never two at once for the same resource.
                            parked.insert(id);
                        }
                        Some(id) => {
                            if !ready.contains(&id) {
                                ready.push_back(id);
                            }
                        }
                        None => break,
                    }
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    match joined {
                        Ok((id, result)) => {
                            in_flight.remove(&id);
                            if parked.remove(&id) && !ready.contains(&id) {
                                ready.push_back(id.clone());
                            }
                            self.handle_result(id, result, &cancel);
                        }
                        Err(join_err) => {
                            error!(error = %join_err, "reconcile task failed to join");
                        }
                    }
                }
            }
        }

        self.drain(tasks).await;
        info!("dispatcher stopped");
    }

    fn handle_result(
        &self,
        id: ResourceId,
        result: Result<Option<Duration>, CourierError>,
        cancel: &CancellationToken,
    ) {
        let delay = match result {
            Ok(None) => return,
            Ok(Some(delay)) => {
                debug!(resource = %id, ?delay, "reconcile requested requeue");
                delay
            }
            Err(err) => {
                warn!(resource = %id, error = %err, "reconcile failed, requeueing");
                self.config.error_requeue
            }
        };

        let tx = self.tx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(id).await;
                }
                _ = cancel.cancelled() => {}
            }
        });
    }

    async fn drain(
        &self,
        mut tasks: JoinSet<(ResourceId, Result<Option<Duration>, CourierError>)>,
    ) {
        if tasks.is_empty() {
            return;
        }
        info!(in_flight = tasks.len(), "draining in-flight reconciles");
        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                timeout = ?self.config.shutdown_timeout,
                "reconcile drain timed out, aborting remaining tasks"
            );
            tasks.abort_all();
        }
    }
}
