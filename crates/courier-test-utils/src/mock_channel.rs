// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery service for deterministic testing.
//!
//! `MockDeliveryService` implements `DeliveryService` with a scripted
//! failure sequence and captures every delivered message for assertion.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::{DeliveryError, DeliveryErrorKind};
use courier_core::traits::DeliveryService;
use courier_core::types::OutboundNotification;

/// How the mock behaves on each delivery call.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Every call succeeds.
    Healthy,
    /// The first `n` calls fail with the given kind, then calls succeed.
    FailFirst(u32, DeliveryErrorKind),
    /// Every call fails with the given kind.
    AlwaysFail(DeliveryErrorKind),
}

/// A scriptable delivery channel for tests.
pub struct MockDeliveryService {
    name: String,
    behavior: MockBehavior,
    calls: AtomicU32,
    delivered: Arc<Mutex<Vec<OutboundNotification>>>,
}

impl MockDeliveryService {
    pub fn new(name: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            calls: AtomicU32::new(0),
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An always-healthy channel.
    pub fn healthy(name: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::Healthy)
    }

    /// A channel that fails every call with a permanent client error.
    pub fn permanently_failing(name: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::AlwaysFail(DeliveryErrorKind::ClientError))
    }

    /// A channel that fails every call with a TLS certificate error.
    pub fn tls_failing(name: impl Into<String>) -> Self {
        Self::new(
            name,
            MockBehavior::AlwaysFail(DeliveryErrorKind::TlsCertificate),
        )
    }

    /// Number of delivery attempts the mock has received.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages that were successfully delivered.
    pub async fn delivered(&self) -> Vec<OutboundNotification> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl DeliveryService for MockDeliveryService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, msg: &OutboundNotification) -> Result<(), DeliveryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        let fail_kind = match self.behavior {
            MockBehavior::Healthy => None,
            MockBehavior::FailFirst(n, kind) if call < n => Some(kind),
            MockBehavior::FailFirst(..) => None,
            MockBehavior::AlwaysFail(kind) => Some(kind),
        };

        match fail_kind {
            Some(kind) => Err(DeliveryError::new(kind, "scripted mock failure")),
            None => {
                self.delivered.lock().await.push(msg.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::types::Priority;

    fn msg() -> OutboundNotification {
        OutboundNotification {
            subject: "s".into(),
            body: "b".into(),
            priority: Priority::Normal,
            notification_type: "alert".into(),
            recipients: vec![],
        }
    }

    #[tokio::test]
    async fn healthy_mock_captures_deliveries() {
        let mock = MockDeliveryService::healthy("chat");
        mock.deliver(&msg()).await.unwrap();
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.delivered().await.len(), 1);
    }

    #[tokio::test]
    async fn fail_first_recovers_after_n_calls() {
        let mock = MockDeliveryService::new(
            "chat",
            MockBehavior::FailFirst(2, DeliveryErrorKind::ServerError),
        );
        assert!(mock.deliver(&msg()).await.is_err());
        assert!(mock.deliver(&msg()).await.is_err());
        assert!(mock.deliver(&msg()).await.is_ok());
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn always_fail_never_delivers() {
        let mock = MockDeliveryService::permanently_failing("chat");
        let err = mock.deliver(&msg()).await.unwrap_err();
        assert_eq!(err.kind, DeliveryErrorKind::ClientError);
        assert!(mock.delivered().await.is_empty());
    }
}
