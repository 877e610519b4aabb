// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording and failing audit backends/DLQs for tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_audit::backend::{AuditBackend, AuditDlq};
use courier_audit::error::AuditError;
use courier_audit::event::AuditEvent;

/// Audit backend that records every persisted event.
pub struct RecordingAuditBackend {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditBackend {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Every event persisted so far, in arrival order.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }

    /// Events filtered by `event_type`.
    pub async fn events_of_type(&self, event_type: &str) -> Vec<AuditEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }
}

impl Default for RecordingAuditBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditBackend for RecordingAuditBackend {
    async fn write_batch(&self, events: &[AuditEvent]) -> Result<(), AuditError> {
        self.events.lock().await.extend_from_slice(events);
        Ok(())
    }
}

/// Audit backend that rejects every write, simulating an unreachable
/// durable store.
pub struct FailingAuditBackend;

#[async_trait]
impl AuditBackend for FailingAuditBackend {
    async fn write_batch(&self, _events: &[AuditEvent]) -> Result<(), AuditError> {
        Err(AuditError::backend(std::io::Error::other(
            "audit backend unreachable",
        )))
    }
}

/// DLQ that records appended events.
pub struct RecordingDlq {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingDlq {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

impl Default for RecordingDlq {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditDlq for RecordingDlq {
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// DLQ that rejects every append.
pub struct FailingDlq;

#[async_trait]
impl AuditDlq for FailingDlq {
    async fn append(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::dlq(std::io::Error::other("dlq unreachable")))
    }
}
