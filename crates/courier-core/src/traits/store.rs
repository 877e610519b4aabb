// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resource store trait with optimistic-concurrency semantics.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{NotificationRequest, ResourceId};

/// Storage backing the declarative notification resources.
///
/// The watch mechanism that triggers reconciles lives behind the same
/// boundary; Courier only consumes this read/write surface.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetches a request by identity.
    ///
    /// Returns [`CourierError::NotFound`] when the resource has been deleted;
    /// the reconciler treats that as cancellation, not as a failure.
    async fn get(&self, id: &ResourceId) -> Result<NotificationRequest, CourierError>;

    /// Writes the status sub-object of `resource` and returns the stored
    /// copy with its new resource version.
    ///
    /// Returns [`CourierError::Conflict`] when `resource.meta.resource_version`
    /// is stale; the reconciler recovers by re-running the whole reconcile.
    async fn update_status(
        &self,
        resource: &NotificationRequest,
    ) -> Result<NotificationRequest, CourierError>;
}
