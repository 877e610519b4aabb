// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory resource store with optimistic-concurrency semantics.
//!
//! Mirrors the external store's contract: `update_status` rejects writes
//! made against a stale `resource_version`, and a conflict can be injected
//! once to exercise the reconciler's re-run path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::CourierError;
use courier_core::traits::ResourceStore;
use courier_core::types::{NotificationRequest, ResourceId};

/// In-memory `ResourceStore` for tests.
pub struct InMemoryStore {
    resources: Mutex<HashMap<ResourceId, NotificationRequest>>,
    /// Number of upcoming `update_status` calls to reject with a conflict.
    inject_conflicts: AtomicU32,
    update_calls: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
            inject_conflicts: AtomicU32::new(0),
            update_calls: AtomicU32::new(0),
        }
    }

    /// Insert or replace a resource, assigning it version 1.
    pub async fn put(&self, mut resource: NotificationRequest) {
        resource.meta.resource_version = 1;
        self.resources
            .lock()
            .await
            .insert(resource.id(), resource);
    }

    /// Remove a resource, simulating deletion by the owner.
    pub async fn delete(&self, id: &ResourceId) {
        self.resources.lock().await.remove(id);
    }

    /// Reject the next `n` status updates with a conflict. The stored
    /// version still advances, so the conflict looks like a concurrent
    /// writer and the re-fetched resource carries a fresh version.
    pub fn inject_conflicts(&self, n: u32) {
        self.inject_conflicts.store(n, Ordering::SeqCst);
    }

    /// Number of `update_status` calls observed.
    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Current stored copy, for assertions.
    pub async fn current(&self, id: &ResourceId) -> Option<NotificationRequest> {
        self.resources.lock().await.get(id).cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
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
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut resources = self.resources.lock().await;

        let id = resource.id();
        let stored = resources.get_mut(&id).ok_or_else(|| CourierError::NotFound {
            namespace: id.namespace.clone(),
            name: id.name.clone(),
        })?;

        let injected = self
            .inject_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected || stored.meta.resource_version != resource.meta.resource_version {
            // Bump the version so the retry sees a fresh resource.
            stored.meta.resource_version += 1;
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
