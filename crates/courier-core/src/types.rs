// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types for the Courier notification controller.
//!
//! `NotificationRequest` is the declarative unit of work: an immutable spec
//! plus a mutable status sub-object. Only the status is ever written back to
//! the resource store.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::DeliveryErrorKind;

/// Identity of a notification request in the resource store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub namespace: String,
    pub name: String,
}

impl ResourceId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Immutable identity and versioning metadata of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    pub name: String,
    pub namespace: String,
    /// Bumped by the store whenever the spec changes. Delivery attempts are
    /// deduplicated per (generation, channel).
    pub generation: i64,
    /// Optimistic-concurrency token; the store rejects status writes made
    /// against a stale version.
    pub resource_version: u64,
    pub created_at: DateTime<Utc>,
}

impl ResourceMeta {
    pub fn id(&self) -> ResourceId {
        ResourceId::new(self.namespace.clone(), self.name.clone())
    }
}

/// Delivery priority of a notification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Immutable specification of a notification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSpec {
    /// Free-form type tag (e.g. "alert", "digest").
    pub notification_type: String,
    #[serde(default)]
    pub priority: Priority,
    pub subject: String,
    pub body: String,
    /// Target channel identifiers. Each must have a registered delivery service.
    pub channels: Vec<String>,
    /// Recipients keyed by channel identifier.
    #[serde(default)]
    pub recipients: BTreeMap<String, Vec<String>>,
    /// Correlation identifier propagated into audit events. Falls back to
    /// the request name when unset.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Audit retention period in days.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 {
    90
}

/// Lifecycle phase of a notification request.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum Phase {
    /// Created, not yet picked up.
    #[default]
    Pending,
    /// Delivery fan-out is in progress (checkpoint persisted before dispatch).
    Delivering,
    /// Every requested channel succeeded.
    Sent,
    /// At least one channel succeeded and at least one failed.
    PartiallySent,
    /// Every requested channel failed, or the spec was malformed.
    Failed,
}

impl Phase {
    /// Terminal phases make further reconciliation a no-op.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::PartiallySent | Self::Failed)
    }
}

/// Per-channel attempt record, keyed by (generation, channel).
///
/// These records are what make a full reconcile re-run after a write
/// conflict delivery-idempotent: a channel with a record for the current
/// generation is never dispatched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAttemptStatus {
    pub channel: String,
    pub generation: i64,
    pub attempts: u32,
    pub succeeded: bool,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// Mutable status sub-object of a notification request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStatus {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub channel_attempts: Vec<ChannelAttemptStatus>,
    #[serde(default)]
    pub successful_deliveries: u32,
    #[serde(default)]
    pub first_attempt_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Set once the acknowledgment audit event has been emitted, so a
    /// re-reconcile never emits it twice.
    #[serde(default)]
    pub audited_acknowledgment: bool,
    /// Set once the escalation audit event has been emitted.
    #[serde(default)]
    pub audited_escalation: bool,
}

impl NotificationStatus {
    /// The attempt record for `channel` at `generation`, if one exists.
    pub fn attempt(&self, channel: &str, generation: i64) -> Option<&ChannelAttemptStatus> {
        self.channel_attempts
            .iter()
            .find(|a| a.channel == channel && a.generation == generation)
    }

    /// Insert or replace the attempt record for (generation, channel).
    pub fn upsert_attempt(&mut self, record: ChannelAttemptStatus) {
        match self
            .channel_attempts
            .iter_mut()
            .find(|a| a.channel == record.channel && a.generation == record.generation)
        {
            Some(existing) => *existing = record,
            None => self.channel_attempts.push(record),
        }
    }
}

/// A notification request resource: identity, immutable spec, mutable status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub meta: ResourceMeta,
    pub spec: NotificationSpec,
    #[serde(default)]
    pub status: NotificationStatus,
}

impl NotificationRequest {
    pub fn id(&self) -> ResourceId {
        self.meta.id()
    }

    /// The correlation id for audit events: the spec's correlation id when
    /// set and non-empty, otherwise the request's own name.
    pub fn correlation_id(&self) -> &str {
        match self.spec.correlation_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.meta.name,
        }
    }
}

/// The message handed to a delivery service, sanitized and with recipients
/// resolved for one channel.
#[derive(Debug, Clone)]
pub struct OutboundNotification {
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub notification_type: String,
    pub recipients: Vec<String>,
}

/// The result of one channel's delivery, produced by the retry handler and
/// owned by a single orchestrator invocation.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    pub channel: String,
    pub success: bool,
    /// Classification of the final failure, if any.
    pub error_kind: Option<DeliveryErrorKind>,
    /// Human-readable detail of the final failure, if any.
    pub error: Option<String>,
    /// Number of delivery attempts made (0 for a circuit-open rejection).
    pub attempts: u32,
    pub duration: Duration,
}

impl ChannelOutcome {
    /// A successful outcome after `attempts` attempts.
    pub fn success(channel: impl Into<String>, attempts: u32, duration: Duration) -> Self {
        Self {
            channel: channel.into(),
            success: true,
            error_kind: None,
            error: None,
            attempts,
            duration,
        }
    }

    /// A failed outcome carrying the final error classification.
    pub fn failure(
        channel: impl Into<String>,
        kind: DeliveryErrorKind,
        error: impl Into<String>,
        attempts: u32,
        duration: Duration,
    ) -> Self {
        Self {
            channel: channel.into(),
            success: false,
            error_kind: Some(kind),
            error: Some(error.into()),
            attempts,
            duration,
        }
    }
}
