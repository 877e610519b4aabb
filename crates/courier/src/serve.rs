// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Wires the full controller from configuration: delivery channels, retry
//! handler with per-channel circuit breakers, buffered audit store with DLQ
//! fallback, reconciler, and the work-queue dispatcher fed by the spool
//! intake. Supports graceful shutdown via signal handlers: the dispatcher
//! drains in-flight reconciles, then the audit store flushes its buffer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use courier_audit::{
    AuditBackend, AuditDlq, AuditError, AuditEvent, AuditStoreConfig, BufferedAuditStore, FileDlq,
    HttpAuditBackend,
};
use courier_channels::{ConsoleChannel, FileChannel, WebhookChannel};
use courier_config::model::CourierConfig;
use courier_core::error::CourierError;
use courier_core::metrics;
use courier_delivery::DeliveryOrchestrator;
use courier_reconciler::{Reconciler, ReconcilerConfig};
use courier_resilience::{BreakerConfig, BreakerRegistry, RetryHandler, RetryPolicy};

use crate::dispatcher::{Dispatcher, DispatcherConfig};
use crate::intake::{self, IntakeConfig};
use crate::shutdown;
use crate::store::SpoolStore;

/// Backend used when no audit endpoint is configured: every event goes
/// straight to the DLQ file, skipping the retry path.
struct DlqOnlyBackend {
    dlq: Arc<FileDlq>,
}

#[async_trait]
impl AuditBackend for DlqOnlyBackend {
    async fn write_batch(&self, events: &[AuditEvent]) -> Result<(), AuditError> {
        for event in events {
            self.dlq.append(event).await?;
        }
        Ok(())
    }
}

/// Runs the `courier serve` command.
///
/// Returns once a shutdown signal has been handled and both the dispatcher
/// and the audit store have drained.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.controller.log_level);
    metrics::register_metrics();

    info!("starting courier serve");

    let handler = build_retry_handler(&config);
    let dlq = Arc::new(FileDlq::new(&config.audit.dlq_path));
    let audit = Arc::new(build_audit_store(&config, dlq));

    let mut orchestrator = DeliveryOrchestrator::new(handler, Arc::clone(&audit));
    register_channels(&config, &mut orchestrator)?;
    let orchestrator = Arc::new(orchestrator);

    let store = Arc::new(SpoolStore::new());
    let store_handle: Arc<dyn courier_core::traits::ResourceStore> = store.clone();
    let reconciler = Arc::new(Reconciler::new(
        store_handle,
        orchestrator,
        Arc::clone(&audit),
        ReconcilerConfig {
            max_conflict_reruns: config.controller.max_conflict_reruns,
        },
    ));

    let dispatcher = Dispatcher::new(
        reconciler,
        DispatcherConfig {
            workers: config.controller.workers,
            queue_capacity: config.controller.queue_capacity,
            error_requeue: Duration::from_secs(config.controller.error_requeue_secs),
            shutdown_timeout: Duration::from_secs(config.controller.shutdown_timeout_secs),
        },
    );
    let queue = dispatcher.queue();

    let cancel = shutdown::install_signal_handler();

    let intake_task = match config.intake.spool_path.as_ref() {
        Some(spool) => {
            let intake_config = IntakeConfig {
                spool_path: PathBuf::from(spool),
                poll_interval: Duration::from_secs(config.intake.poll_interval_secs),
            };
            Some(tokio::spawn(intake::run_intake(
                intake_config,
                Arc::clone(&store),
                queue,
                cancel.clone(),
            )))
        }
        None => {
            warn!("no spool path configured, intake disabled");
            None
        }
    };

    // Runs until the signal handler cancels, then drains in-flight work.
    dispatcher.run(cancel).await;

    if let Some(task) = intake_task {
        if let Err(e) = task.await {
            warn!(error = %e, "intake task did not exit cleanly");
        }
    }

    if let Err(e) = audit.close().await {
        warn!(error = %e, "audit store did not drain cleanly at shutdown");
    }

    info!("courier serve shutdown complete");
    Ok(())
}

fn build_retry_handler(config: &CourierConfig) -> Arc<RetryHandler> {
    let policy = RetryPolicy {
        max_attempts: config.retry.max_attempts,
        initial_delay: Duration::from_millis(config.retry.initial_delay_ms),
        multiplier: config.retry.multiplier,
        max_delay: Duration::from_millis(config.retry.max_delay_ms),
        attempt_timeout: Duration::from_secs(config.retry.attempt_timeout_secs),
    };
    let breakers = Arc::new(BreakerRegistry::new(BreakerConfig {
        failure_threshold: config.breaker.failure_threshold,
        reset_timeout: Duration::from_secs(config.breaker.reset_timeout_secs),
    }));
    info!(
        max_attempts = policy.max_attempts,
        failure_threshold = config.breaker.failure_threshold,
        "retry handler initialized"
    );
    Arc::new(RetryHandler::new(policy, breakers))
}

fn build_audit_store(config: &CourierConfig, dlq: Arc<FileDlq>) -> BufferedAuditStore {
    let backend: Arc<dyn AuditBackend> = match config.audit.endpoint.as_ref() {
        Some(endpoint) => {
            info!(endpoint = endpoint.as_str(), "audit backend: http");
            Arc::new(HttpAuditBackend::new(Client::new(), endpoint))
        }
        None => {
            info!(dlq = config.audit.dlq_path.as_str(), "audit backend: dlq file only");
            Arc::new(DlqOnlyBackend {
                dlq: Arc::clone(&dlq),
            })
        }
    };

    BufferedAuditStore::new(
        backend,
        dlq,
        AuditStoreConfig {
            buffer_size: config.audit.buffer_size,
            batch_size: config.audit.batch_size,
            flush_interval: Duration::from_secs(config.audit.flush_interval_secs),
            write_retries: config.audit.write_retries,
            write_retry_delay: Duration::from_millis(config.audit.write_retry_delay_ms),
            shutdown_timeout: Duration::from_secs(config.audit.shutdown_timeout_secs),
        },
    )
}

/// Registers every enabled delivery channel with the orchestrator.
///
/// Validation has already checked that enabled channels carry their required
/// settings, so a missing URL or path here is an internal error.
fn register_channels(
    config: &CourierConfig,
    orchestrator: &mut DeliveryOrchestrator,
) -> Result<(), CourierError> {
    if config.console.enabled {
        orchestrator.register(Arc::new(ConsoleChannel::new()));
        info!("console channel registered");
    } else {
        debug!("console channel disabled by configuration");
    }

    if config.webhook.enabled {
        let url = config
            .webhook
            .url
            .as_ref()
            .ok_or_else(|| CourierError::Internal("webhook enabled without url".into()))?;
        orchestrator.register(Arc::new(WebhookChannel::new("webhook", Client::new(), url)));
        info!(url = url.as_str(), "webhook channel registered");
    }

    if config.file.enabled {
        let path = config
            .file
            .path
            .as_ref()
            .ok_or_else(|| CourierError::Internal("file channel enabled without path".into()))?;
        orchestrator.register(Arc::new(FileChannel::new("file", path)));
        info!(path = path.as_str(), "file channel registered");
    }

    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use std::collections::BTreeMap;

    use courier_core::types::{
        ChannelOutcome, NotificationRequest, NotificationSpec, NotificationStatus, Priority,
        ResourceMeta,
    };

    fn event() -> AuditEvent {
        let request = NotificationRequest {
            meta: ResourceMeta {
                name: "req-1".into(),
                namespace: "default".into(),
                generation: 1,
                resource_version: 1,
                created_at: Utc::now(),
            },
            spec: NotificationSpec {
                notification_type: "alert".into(),
                priority: Priority::Normal,
                subject: "s".into(),
                body: "b".into(),
                channels: vec!["console".into()],
                recipients: BTreeMap::new(),
                correlation_id: None,
                retention_days: 30,
            },
            status: NotificationStatus::default(),
        };
        let outcome = ChannelOutcome::success("console", 1, Duration::from_millis(5));
        courier_audit::delivery_event(&request, &outcome).unwrap()
    }

    #[tokio::test]
    async fn dlq_only_backend_writes_every_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dlq.jsonl");
        let backend = DlqOnlyBackend {
            dlq: Arc::new(FileDlq::new(&path)),
        };

        backend.write_batch(&[event(), event()]).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn channels_register_from_config() {
        let toml = r#"
            [webhook]
            enabled = true
            url = "https://audit.example.com/hook"

            [file]
            enabled = true
            path = "/tmp/courier-out.jsonl"
        "#;
        let config = courier_config::load_and_validate_str(toml).unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let handler = build_retry_handler(&config);
            let dlq = Arc::new(FileDlq::new("unused-dlq.jsonl"));
            let audit = Arc::new(build_audit_store(&config, dlq));

            let mut orchestrator = DeliveryOrchestrator::new(handler, Arc::clone(&audit));
            register_channels(&config, &mut orchestrator).unwrap();

            assert!(orchestrator.has_channel("console"));
            assert!(orchestrator.has_channel("webhook"));
            assert!(orchestrator.has_channel("file"));

            audit.close().await.unwrap();
        });
    }
}
