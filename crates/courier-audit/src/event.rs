// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit event model and pure construction helpers.
//!
//! Construction never performs I/O and fails only on contract violations
//! (empty channel, empty request name). The correlation-id fallback to the
//! request name is deliberate: correlation ids must never be empty, and a
//! request without one correlates to itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courier_core::types::{ChannelOutcome, NotificationRequest};

use crate::error::AuditError;

/// Domain segment of every Courier event type.
const EVENT_DOMAIN: &str = "notification";

/// Actor identity recorded on controller-emitted events.
const ACTOR: &str = "courier-controller";

/// Success/failure outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// An immutable audit record.
///
/// Invariants: `event_type` always has the three-segment
/// `<domain>.<category>.<action>` shape, and `correlation_id` is never empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    pub event_type: String,
    pub category: String,
    pub action: String,
    pub outcome: AuditOutcome,
    pub actor: String,
    pub resource_type: String,
    pub resource_id: String,
    pub correlation_id: String,
    pub namespace: String,
    pub payload: serde_json::Value,
    pub retention_days: u32,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Whether `event_type` matches the `<domain>.<category>.<action>` shape.
    pub fn has_valid_event_type(&self) -> bool {
        let segments: Vec<&str> = self.event_type.split('.').collect();
        segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
    }
}

fn base_event(
    request: &NotificationRequest,
    category: &str,
    action: &str,
    outcome: AuditOutcome,
    payload: serde_json::Value,
) -> Result<AuditEvent, AuditError> {
    if request.meta.name.is_empty() {
        return Err(AuditError::Contract("request name is empty".into()));
    }

    Ok(AuditEvent {
        id: Uuid::new_v4(),
        event_type: format!("{EVENT_DOMAIN}.{category}.{action}"),
        category: category.to_string(),
        action: action.to_string(),
        outcome,
        actor: ACTOR.to_string(),
        resource_type: "NotificationRequest".to_string(),
        resource_id: request.meta.name.clone(),
        correlation_id: request.correlation_id().to_string(),
        namespace: request.meta.namespace.clone(),
        payload,
        retention_days: request.spec.retention_days,
        created_at: Utc::now(),
    })
}

/// Event for one channel's delivery outcome.
///
/// Errors only on contract violations; these are programmer errors, not
/// runtime faults.
pub fn delivery_event(
    request: &NotificationRequest,
    outcome: &ChannelOutcome,
) -> Result<AuditEvent, AuditError> {
    if outcome.channel.is_empty() {
        return Err(AuditError::Contract("channel name is empty".into()));
    }

    let (action, audit_outcome) = if outcome.success {
        ("sent", AuditOutcome::Success)
    } else {
        ("failed", AuditOutcome::Failure)
    };

    let payload = serde_json::json!({
        "channel": outcome.channel,
        "attempts": outcome.attempts,
        "durationMs": outcome.duration.as_millis() as u64,
        "error": outcome.error,
        "errorKind": outcome.error_kind.map(|k| k.to_string()),
        "priority": request.spec.priority,
        "notificationType": request.spec.notification_type,
    });

    base_event(request, "delivery", action, audit_outcome, payload)
}

/// Event emitted once when a request reaches a terminal phase with at
/// least one successful delivery. Guarded by `status.audited_acknowledgment`.
pub fn acknowledgment_event(request: &NotificationRequest) -> Result<AuditEvent, AuditError> {
    let payload = serde_json::json!({
        "phase": request.status.phase,
        "successfulDeliveries": request.status.successful_deliveries,
        "channels": request.spec.channels,
    });
    base_event(
        request,
        "lifecycle",
        "acknowledged",
        AuditOutcome::Success,
        payload,
    )
}

/// Event emitted once when a request fails on every channel. Guarded by
/// `status.audited_escalation`.
pub fn escalation_event(request: &NotificationRequest) -> Result<AuditEvent, AuditError> {
    let failures: Vec<serde_json::Value> = request
        .status
        .channel_attempts
        .iter()
        .filter(|a| !a.succeeded)
        .map(|a| {
            serde_json::json!({
                "channel": a.channel,
                "attempts": a.attempts,
                "lastError": a.last_error,
            })
        })
        .collect();

    let payload = serde_json::json!({
        "phase": request.status.phase,
        "priority": request.spec.priority,
        "failures": failures,
    });
    base_event(
        request,
        "lifecycle",
        "escalated",
        AuditOutcome::Failure,
        payload,
    )
}
