// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spool-directory intake.
//!
//! Polls a directory for `*.json` notification requests, registers them in
//! the [`SpoolStore`](crate::store::SpoolStore), and submits their ids to the
//! dispatcher. Accepted files are renamed to `<name>.accepted`, malformed
//! ones to `<name>.rejected`, so a file is picked up at most once.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use courier_core::types::{
    NotificationRequest, NotificationSpec, NotificationStatus, ResourceMeta,
};

use crate::dispatcher::WorkQueue;
use crate::store::SpoolStore;

/// On-disk shape of a spool file. Metadata beyond the name is assigned at
/// intake time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SpoolFile {
    name: String,
    #[serde(default = "default_namespace")]
    namespace: String,
    spec: NotificationSpec,
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Spool intake settings.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub spool_path: PathBuf,
    pub poll_interval: Duration,
}

/// Poll the spool directory until `cancel` fires.
pub async fn run_intake(
    config: IntakeConfig,
    store: Arc<SpoolStore>,
    queue: WorkQueue,
    cancel: CancellationToken,
) {
    info!(spool = %config.spool_path.display(), "spool intake started");
    loop {
        scan_spool(&config.spool_path, &store, &queue).await;
        tokio::select! {
            _ = tokio::time::sleep(config.poll_interval) => {}
            _ = cancel.cancelled() => break,
        }
    }
    info!("spool intake stopped");
}

/// One pass over the spool directory.
async fn scan_spool(spool: &Path, store: &SpoolStore, queue: &WorkQueue) {
    let mut entries = match tokio::fs::read_dir(spool).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(spool = %spool.display(), error = %e, "failed to read spool directory");
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match ingest_file(&path, store, queue).await {
            Ok(true) => mark(&path, "accepted").await,
            Ok(false) => {
                // Redelivered file for a request we already hold.
                debug!(file = %path.display(), "duplicate spool file ignored");
                mark(&path, "accepted").await;
            }
            Err(reason) => {
                warn!(file = %path.display(), error = %reason, "rejecting spool file");
                mark(&path, "rejected").await;
            }
        }
    }
}

async fn ingest_file(
    path: &Path,
    store: &SpoolStore,
    queue: &WorkQueue,
) -> Result<bool, String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| e.to_string())?;
    let file: SpoolFile = serde_json::from_str(&raw).map_err(|e| e.to_string())?;

    let request = NotificationRequest {
        meta: ResourceMeta {
            name: file.name,
            namespace: file.namespace,
            generation: 1,
            resource_version: 0,
            created_at: Utc::now(),
        },
        spec: file.spec,
        status: NotificationStatus::default(),
    };
    let id = request.id();

    let inserted = store.insert(request).await;
    if inserted {
        info!(resource = %id, "accepted notification request");
        queue.submit(id).await;
    }
    Ok(inserted)
}

/// Rename a processed spool file so it is not picked up again.
async fn mark(path: &Path, suffix: &str) {
    let mut renamed = path.as_os_str().to_os_string();
    renamed.push(".");
    renamed.push(suffix);
    if let Err(e) = tokio::fs::rename(path, &renamed).await {
        warn!(file = %path.display(), error = %e, "failed to rename spool file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dispatcher::{Dispatcher, DispatcherConfig, Reconcile};

    use async_trait::async_trait;
    use courier_core::error::CourierError;
    use courier_core::traits::ResourceStore;
    use courier_core::types::ResourceId;

    struct NoopReconciler;

    #[async_trait]
    impl Reconcile for NoopReconciler {
        async fn reconcile(&self, _id: &ResourceId) -> Result<Option<Duration>, CourierError> {
            Ok(None)
        }
    }

    fn queue() -> WorkQueue {
        Dispatcher::new(Arc::new(NoopReconciler), DispatcherConfig::default()).queue()
    }

    #[tokio::test]
    async fn valid_spool_file_is_accepted_and_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("req-1.json");
        std::fs::write(
            &file,
            r#"{
                "name": "req-1",
                "spec": {
                    "notificationType": "alert",
                    "subject": "Disk almost full",
                    "body": "volume /data at 92%",
                    "channels": ["console"]
                }
            }"#,
        )
        .unwrap();

        let store = Arc::new(SpoolStore::new());
        scan_spool(dir.path(), &store, &queue()).await;

        let stored = store
            .get(&ResourceId::new("default", "req-1"))
            .await
            .unwrap();
        assert_eq!(stored.spec.subject, "Disk almost full");
        assert_eq!(stored.meta.resource_version, 1);
        assert!(!file.exists());
        assert!(dir.path().join("req-1.json.accepted").exists());
    }

    #[tokio::test]
    async fn malformed_spool_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "{ not json").unwrap();

        let store = Arc::new(SpoolStore::new());
        scan_spool(dir.path(), &store, &queue()).await;

        assert!(!file.exists());
        assert!(dir.path().join("bad.json.rejected").exists());
    }

    #[tokio::test]
    async fn redelivered_file_does_not_reset_existing_request() {
        let dir = tempfile::tempdir().unwrap();
        let contents = r#"{
            "name": "req-1",
            "spec": {
                "notificationType": "alert",
                "subject": "s",
                "body": "b",
                "channels": ["console"]
            }
        }"#;
        std::fs::write(dir.path().join("a.json"), contents).unwrap();

        let store = Arc::new(SpoolStore::new());
        let q = queue();
        scan_spool(dir.path(), &store, &q).await;

        // Advance the stored request past intake state, then redeliver.
        let id = ResourceId::new("default", "req-1");
        let mut advanced = store.get(&id).await.unwrap();
        advanced.status.successful_deliveries = 1;
        store.update_status(&advanced).await.unwrap();

        std::fs::write(dir.path().join("b.json"), contents).unwrap();
        scan_spool(dir.path(), &store, &q).await;

        let stored = store.get(&id).await.unwrap();
        assert_eq!(stored.status.successful_deliveries, 1);
        assert!(dir.path().join("b.json.accepted").exists());
    }

    #[tokio::test]
    async fn non_json_files_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "not a request").unwrap();

        let store = Arc::new(SpoolStore::new());
        scan_spool(dir.path(), &store, &queue()).await;

        assert!(file.exists());
    }
}
