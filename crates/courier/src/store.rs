// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process resource store backing the spool intake.
//!
//! The external watch/storage mechanism is a boundary collaborator; this
//! store is the minimal implementation that makes the binary runnable on
//! its own. It keeps the same optimistic-concurrency contract an external
//! store would: status writes against a stale `resource_version` conflict.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::CourierError;
use courier_core::traits::ResourceStore;
use courier_core::types::{NotificationRequest, ResourceId};

/// Process-local `ResourceStore` fed by the spool intake.
pub struct SpoolStore {
    resources: Mutex<HashMap<ResourceId, NotificationRequest>>,
}

impl SpoolStore {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a request unless one with the same id already exists.
    ///
    /// Returns whether the request was inserted. Redelivered spool files
    /// must not reset the status of a request already being processed.
    pub async fn insert(&self, mut resource: NotificationRequest) -> bool {
        let mut resources = self.resources.lock().await;
        let id = resource.id();
        if resources.contains_key(&id) {
            return false;
        }
        resource.meta.resource_version = 1;
        resources.insert(id, resource);
        true
    }
}

impl Default for SpoolStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceStore for SpoolStore {
    async fn get(&self, id: &ResourceId) -> Result<NotificationRequest, CourierError> {
        self.resources
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CourierError::NotFound {
                namespace: id.namespace.clone(),
                name: id.name.clone(),
            })
    }

    async fn update_status(
        &self,
        resource: &NotificationRequest,
    ) -> Result<NotificationRequest, CourierError> {
        let mut resources = self.resources.lock().await;

        let id = resource.id();
        let stored = resources
            .get_mut(&id)
            .ok_or_else(|| CourierError::NotFound {
                namespace: id.namespace.clone(),
                name: id.name.clone(),
            })?;

        if stored.meta.resource_version != resource.meta.resource_version {
            return Err(CourierError::Conflict {
                namespace: id.namespace.clone(),
                name: id.name.clone(),
            });
        }

        stored.status = resource.status.clone();
        stored.meta.resource_version += 1;
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use courier_core::types::{
        NotificationSpec, NotificationStatus, Phase, Priority, ResourceMeta,
    };

    fn request(name: &str) -> NotificationRequest {
        NotificationRequest {
            meta: ResourceMeta {
                name: name.into(),
                namespace: "default".into(),
                generation: 1,
                resource_version: 0,
                created_at: chrono::Utc::now(),
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
        }
    }

    #[tokio::test]
    async fn insert_is_first_writer_wins() {
        let store = SpoolStore::new();
        assert!(store.insert(request("req-1")).await);
        assert!(!store.insert(request("req-1")).await);
    }

    #[tokio::test]
    async fn stale_status_write_conflicts() {
        let store = SpoolStore::new();
        store.insert(request("req-1")).await;

        let id = ResourceId::new("default", "req-1");
        let stale = store.get(&id).await.unwrap();

        let mut winner = stale.clone();
        winner.status.phase = Phase::Delivering;
        store.update_status(&winner).await.unwrap();

        let err = store.update_status(&stale).await.unwrap_err();
        assert!(matches!(err, CourierError::Conflict { .. }));
    }
}
