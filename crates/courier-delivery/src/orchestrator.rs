// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery orchestrator: fans one notification out to all requested
//! channels concurrently and reports per-channel outcomes.
//!
//! Channels race independently; a failing channel never aborts its
//! siblings, and partial success is a valid result, not a defect. Every
//! outcome produces exactly one audit event, submitted fire-and-forget so
//! audit backpressure cannot touch the delivery path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use courier_audit::event::delivery_event;
use courier_audit::store::BufferedAuditStore;
use courier_core::error::DeliveryErrorKind;
use courier_core::traits::DeliveryService;
use courier_core::types::{ChannelOutcome, NotificationRequest, OutboundNotification};
use courier_resilience::RetryHandler;

/// Fans deliveries out to registered channels through the retry handler.
pub struct DeliveryOrchestrator {
    services: HashMap<String, Arc<dyn DeliveryService>>,
    handler: Arc<RetryHandler>,
    audit: Arc<BufferedAuditStore>,
}

impl DeliveryOrchestrator {
    pub fn new(handler: Arc<RetryHandler>, audit: Arc<BufferedAuditStore>) -> Self {
        Self {
            services: HashMap::new(),
            handler,
            audit,
        }
    }

    /// Register a channel under its own identifier.
    pub fn register(&mut self, service: Arc<dyn DeliveryService>) {
        let name = service.name().to_string();
        debug!(channel = %name, "delivery channel registered");
        self.services.insert(name, service);
    }

    /// Whether a channel identifier has a registered service.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.services.contains_key(channel)
    }

    /// Deliver `message` to every channel in `channels`, concurrently, and
    /// wait for all of them. Always returns one outcome per requested
    /// channel; an unregistered channel yields a permanent failure outcome.
    pub async fn deliver(
        &self,
        request: &NotificationRequest,
        message: &OutboundNotification,
        channels: &[String],
    ) -> Vec<ChannelOutcome> {
        let mut outcomes = Vec::with_capacity(channels.len());
        let mut dispatched: Vec<&String> = Vec::with_capacity(channels.len());
        let mut tasks: JoinSet<ChannelOutcome> = JoinSet::new();

        for channel in channels {
            let Some(service) = self.services.get(channel) else {
                warn!(channel = %channel, "no delivery service registered for channel");
                outcomes.push(ChannelOutcome::failure(
                    channel,
                    DeliveryErrorKind::UnknownChannel,
                    format!("no delivery service registered for '{channel}'"),
                    0,
                    Duration::ZERO,
                ));
                continue;
            };

            let service = Arc::clone(service);
            let handler = Arc::clone(&self.handler);
            let mut msg = message.clone();
            msg.recipients = request
                .spec
                .recipients
                .get(channel)
                .cloned()
                .unwrap_or_default();

            dispatched.push(channel);
            tasks.spawn(async move { handler.call(service.as_ref(), &msg).await });
        }

        // Every channel gets a fair attempt; nothing is cancelled when a
        // sibling fails.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_err) => {
                    error!(error = %join_err, "channel delivery task failed to join");
                }
            }
        }

        // A panicked task is a bug in the service impl and produced no
        // outcome; synthesize a permanent failure so the channel still gets
        // an attempt record and an audit event.
        for channel in dispatched {
            if !outcomes.iter().any(|o| &o.channel == channel) {
                outcomes.push(ChannelOutcome::failure(
                    channel,
                    DeliveryErrorKind::TaskFailure,
                    "delivery task panicked",
                    0,
                    Duration::ZERO,
                ));
            }
        }

        for outcome in &outcomes {
            self.audit_outcome(request, outcome);
        }

        outcomes
    }

    /// Construct and submit the audit event for one outcome without
    /// waiting for persistence.
    fn audit_outcome(&self, request: &NotificationRequest, outcome: &ChannelOutcome) {
        match delivery_event(request, outcome) {
            Ok(event) => self.audit.submit(event),
            Err(err) => {
                // Contract violation: a programmer error, not a runtime fault.
                error!(channel = %outcome.channel, error = %err, "audit event construction failed");
            }
        }
    }
}
