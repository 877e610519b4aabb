// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console delivery channel: writes notifications to stdout.
//!
//! Mostly useful for local development and as the always-healthy channel in
//! multi-channel setups.

use async_trait::async_trait;

use courier_core::error::DeliveryError;
use courier_core::traits::DeliveryService;
use courier_core::types::OutboundNotification;

/// Delivers notifications to stdout.
pub struct ConsoleChannel {
    name: String,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self {
            name: "console".to_string(),
        }
    }

    /// A console channel registered under a custom identifier.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryService for ConsoleChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, msg: &OutboundNotification) -> Result<(), DeliveryError> {
        println!("[{}] {}: {}", msg.priority, msg.subject, msg.body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::types::Priority;

    #[tokio::test]
    async fn always_succeeds() {
        let channel = ConsoleChannel::new();
        let msg = OutboundNotification {
            subject: "build green".into(),
            body: "all 3 pipelines passed".into(),
            priority: Priority::Low,
            notification_type: "digest".into(),
            recipients: vec![],
        };
        assert!(channel.deliver(&msg).await.is_ok());
        assert_eq!(channel.name(), "console");
    }

    #[test]
    fn named_constructor_sets_identifier() {
        assert_eq!(ConsoleChannel::named("stdout-2").name(), "stdout-2");
    }
}
