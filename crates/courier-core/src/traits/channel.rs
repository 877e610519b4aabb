// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery service trait for notification channel transports.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::OutboundNotification;

/// A single notification channel (console, chat webhook, file, ...).
///
/// New channels are added by implementing this trait and registering the
/// implementation with the orchestrator under its channel identifier; the
/// orchestrator never branches on channel type.
#[async_trait]
pub trait DeliveryService: Send + Sync {
    /// The channel identifier this service answers to.
    fn name(&self) -> &str;

    /// Delivers one notification. Implementations classify their failures
    /// via [`DeliveryError::kind`] so the retry handler can distinguish
    /// transient from permanent errors.
    async fn deliver(&self, msg: &OutboundNotification) -> Result<(), DeliveryError>;
}
