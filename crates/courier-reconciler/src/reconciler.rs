// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reconcile state machine.
//!
//! One reconcile run takes a request from its stored state to a terminal
//! phase: fetch, terminal short-circuit, spec validation, in-memory
//! sanitization, delivery fan-out for channels not yet attempted at the
//! current generation, aggregation, and a status write. A write conflict
//! re-runs the whole reconcile rather than just the write; the per-channel
//! attempt records keyed by (generation, channel), held in memory across
//! re-runs until a write lands, make the re-run safe against duplicate
//! delivery.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use courier_audit::event::{acknowledgment_event, escalation_event};
use courier_audit::store::BufferedAuditStore;
use courier_core::error::CourierError;
use courier_core::metrics;
use courier_core::traits::ResourceStore;
use courier_core::types::{
    ChannelAttemptStatus, NotificationRequest, OutboundNotification, Phase, ResourceId,
};
use courier_delivery::DeliveryOrchestrator;
use courier_sanitize::sanitize;

/// Bounds on the reconcile loop itself.
#[derive(Debug, Clone, Copy)]
pub struct ReconcilerConfig {
    /// Full re-runs allowed after a status write conflict before the
    /// conflict propagates to the caller's backoff.
    pub max_conflict_reruns: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_conflict_reruns: 3,
        }
    }
}

/// Drives one notification request to a terminal phase.
pub struct Reconciler {
    store: Arc<dyn ResourceStore>,
    orchestrator: Arc<DeliveryOrchestrator>,
    audit: Arc<BufferedAuditStore>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        orchestrator: Arc<DeliveryOrchestrator>,
        audit: Arc<BufferedAuditStore>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            audit,
            config,
        }
    }

    /// Reconcile the request identified by `id`.
    ///
    /// `Ok(None)` means done (or nothing to do); `Ok(Some(d))` asks the
    /// dispatcher to requeue after `d`. A deleted resource is treated as a
    /// cancellation, not an error. Transient store errors propagate for the
    /// caller's backoff; a status write conflict triggers a bounded full
    /// re-run instead.
    pub async fn reconcile(&self, id: &ResourceId) -> Result<Option<Duration>, CourierError> {
        let mut runs = 0u32;
        // Outcomes gathered in this invocation survive a conflicted status
        // write: each re-run merges them into the re-fetched status, so a
        // channel delivered once is never dispatched again.
        let mut attempted: Vec<ChannelAttemptStatus> = Vec::new();
        loop {
            runs += 1;
            match self.run_once(id, &mut attempted).await {
                Ok(requeue) => return Ok(requeue),
                Err(CourierError::Conflict { .. }) if runs <= self.config.max_conflict_reruns => {
                    debug!(resource = %id, run = runs, "status write conflict, re-running reconcile");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn run_once(
        &self,
        id: &ResourceId,
        attempted: &mut Vec<ChannelAttemptStatus>,
    ) -> Result<Option<Duration>, CourierError> {
        let mut request = match self.store.get(id).await {
            Ok(request) => request,
            Err(CourierError::NotFound { .. }) => {
                debug!(resource = %id, "resource absent, treating as cancellation");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        if request.status.phase.is_terminal() {
            debug!(resource = %id, phase = %request.status.phase, "already terminal, nothing to do");
            return Ok(None);
        }

        if let Err(reason) = validate_spec(&request) {
            return self.fail_permanently(request, &reason).await;
        }

        // Sanitized copies live only in working memory; the persisted spec
        // is never rewritten. Re-sanitizing on every reconcile is fine
        // since the sanitizer is pure and idempotent.
        let subject = sanitize(&request.spec.subject);
        let body = sanitize(&request.spec.body);
        if subject.was_modified() || body.was_modified() {
            info!(
                resource = %id,
                subject_actions = subject.actions.len(),
                body_actions = body.actions.len(),
                "sensitive content redacted before delivery"
            );
        }
        let message = OutboundNotification {
            subject: subject.text,
            body: body.text,
            priority: request.spec.priority,
            notification_type: request.spec.notification_type.clone(),
            recipients: Vec::new(),
        };

        let generation = request.meta.generation;
        // Records from an earlier run whose status write conflicted; the
        // re-fetched resource does not have them yet.
        for record in attempted.iter() {
            if record.generation == generation
                && request.status.attempt(&record.channel, generation).is_none()
            {
                request.status.upsert_attempt(record.clone());
            }
        }
        let pending: Vec<String> = request
            .spec
            .channels
            .iter()
            .filter(|c| request.status.attempt(c, generation).is_none())
            .cloned()
            .collect();
        let skipped = request.spec.channels.len() - pending.len();
        if skipped > 0 {
            debug!(resource = %id, skipped, "channels already attempted at this generation");
        }

        if !pending.is_empty() {
            // Checkpoint the fan-out so a crash mid-delivery is observable.
            request.status.phase = Phase::Delivering;
            if request.status.first_attempt_at.is_none() {
                request.status.first_attempt_at = Some(Utc::now());
            }
            request = match self.store.update_status(&request).await {
                Ok(updated) => updated,
                Err(CourierError::NotFound { .. }) => {
                    debug!(resource = %id, "resource deleted before fan-out");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            };

            let outcomes = self
                .orchestrator
                .deliver(&request, &message, &pending)
                .await;
            for outcome in &outcomes {
                let record = ChannelAttemptStatus {
                    channel: outcome.channel.clone(),
                    generation,
                    attempts: outcome.attempts,
                    succeeded: outcome.success,
                    last_error: outcome.error.clone(),
                };
                request.status.upsert_attempt(record.clone());
                match attempted
                    .iter_mut()
                    .find(|a| a.channel == record.channel && a.generation == record.generation)
                {
                    Some(existing) => *existing = record,
                    None => attempted.push(record),
                }
            }
        }

        self.finalize(request).await
    }

    /// Aggregate the attempt records into a terminal phase, persist, and
    /// emit the one-shot lifecycle audit events.
    async fn finalize(
        &self,
        mut request: NotificationRequest,
    ) -> Result<Option<Duration>, CourierError> {
        let generation = request.meta.generation;
        let succeeded = request
            .spec
            .channels
            .iter()
            .filter(|c| {
                request
                    .status
                    .attempt(c, generation)
                    .is_some_and(|a| a.succeeded)
            })
            .count();
        let total = request.spec.channels.len();

        request.status.phase = if succeeded == total {
            Phase::Sent
        } else if succeeded > 0 {
            Phase::PartiallySent
        } else {
            Phase::Failed
        };
        request.status.successful_deliveries = succeeded as u32;
        request.status.completed_at = Some(Utc::now());

        let emit_acknowledgment = succeeded > 0 && !request.status.audited_acknowledgment;
        let emit_escalation =
            request.status.phase == Phase::Failed && !request.status.audited_escalation;
        request.status.audited_acknowledgment |= emit_acknowledgment;
        request.status.audited_escalation |= emit_escalation;

        match request.status.phase {
            Phase::Sent => info!(
                resource = %request.id(),
                channels = total,
                "notification delivered on all channels"
            ),
            Phase::PartiallySent => warn!(
                resource = %request.id(),
                succeeded,
                failed = total - succeeded,
                "notification delivered on some channels only"
            ),
            _ => warn!(resource = %request.id(), "notification failed on all channels"),
        }

        let persisted = match self.store.update_status(&request).await {
            Ok(updated) => updated,
            Err(CourierError::NotFound { .. }) => {
                // Deleted while delivering; the results are discarded.
                debug!(resource = %request.id(), "resource deleted mid-delivery, discarding results");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        metrics::record_reconcile(&persisted.status.phase.to_string());

        // Lifecycle events go out only after the guard flags are durable,
        // so a conflict-driven re-run cannot emit them twice.
        if emit_acknowledgment {
            self.submit_lifecycle(acknowledgment_event(&persisted));
        }
        if emit_escalation {
            self.submit_lifecycle(escalation_event(&persisted));
        }

        Ok(None)
    }

    /// Terminal `Failed` for a malformed spec; never retried.
    async fn fail_permanently(
        &self,
        mut request: NotificationRequest,
        reason: &str,
    ) -> Result<Option<Duration>, CourierError> {
        warn!(resource = %request.id(), reason, "spec invalid, failing permanently");

        request.status.phase = Phase::Failed;
        request.status.completed_at = Some(Utc::now());
        let emit_escalation = !request.status.audited_escalation;
        request.status.audited_escalation = true;

        let persisted = match self.store.update_status(&request).await {
            Ok(updated) => updated,
            Err(CourierError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        metrics::record_reconcile("invalid_spec");

        if emit_escalation {
            self.submit_lifecycle(escalation_event(&persisted));
        }
        Ok(None)
    }

    fn submit_lifecycle(
        &self,
        event: Result<courier_audit::AuditEvent, courier_audit::AuditError>,
    ) {
        match event {
            Ok(event) => self.audit.submit(event),
            Err(err) => error!(error = %err, "lifecycle audit event construction failed"),
        }
    }
}

/// A spec is malformed when a required field is missing. Malformed specs
/// fail permanently; retrying cannot fix them.
fn validate_spec(request: &NotificationRequest) -> Result<(), String> {
    if request.spec.subject.trim().is_empty() {
        return Err("subject is empty".into());
    }
    if request.spec.body.trim().is_empty() {
        return Err("body is empty".into());
    }
    if request.spec.channels.is_empty() {
        return Err("no channels requested".into());
    }
    if request.spec.channels.iter().any(|c| c.trim().is_empty()) {
        return Err("channel identifier is empty".into());
    }
    Ok(())
}
