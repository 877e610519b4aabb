// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait boundaries for the durable audit backend and the DLQ transport.

use async_trait::async_trait;

use crate::error::AuditError;
use crate::event::AuditEvent;

/// The durable audit backend, reachable over a request/response protocol.
#[async_trait]
pub trait AuditBackend: Send + Sync {
    /// Persists a batch of events. All-or-nothing from the store's point of
    /// view: a failure sends the whole batch down the retry/DLQ path.
    async fn write_batch(&self, events: &[AuditEvent]) -> Result<(), AuditError>;
}

/// Last-resort durable sink used when the primary backend persistently fails.
#[async_trait]
pub trait AuditDlq: Send + Sync {
    /// Appends one event to the dead-letter log.
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditError>;
}
