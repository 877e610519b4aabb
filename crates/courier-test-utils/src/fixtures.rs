// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for notification request fixtures.

use std::collections::BTreeMap;

use chrono::Utc;

use courier_core::types::{
    NotificationRequest, NotificationSpec, NotificationStatus, Priority, ResourceMeta,
};

/// Builder for `NotificationRequest` test fixtures.
pub struct RequestBuilder {
    name: String,
    namespace: String,
    channels: Vec<String>,
    subject: String,
    body: String,
    priority: Priority,
    correlation_id: Option<String>,
    recipients: BTreeMap<String, Vec<String>>,
}

impl RequestBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: "default".to_string(),
            channels: vec!["console".to_string()],
            subject: "test subject".to_string(),
            body: "test body".to_string(),
            priority: Priority::Normal,
            correlation_id: None,
            recipients: BTreeMap::new(),
        }
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn channels(mut self, channels: &[&str]) -> Self {
        self.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.correlation_id = Some(id.to_string());
        self
    }

    pub fn recipients(mut self, channel: &str, recipients: &[&str]) -> Self {
        self.recipients.insert(
            channel.to_string(),
            recipients.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    pub fn build(self) -> NotificationRequest {
        NotificationRequest {
            meta: ResourceMeta {
                name: self.name,
                namespace: self.namespace,
                generation: 1,
                resource_version: 1,
                created_at: Utc::now(),
            },
            spec: NotificationSpec {
                notification_type: "alert".to_string(),
                priority: self.priority,
                subject: self.subject,
                body: self.body,
                channels: self.channels,
                recipients: self.recipients,
                correlation_id: self.correlation_id,
                retention_days: 30,
            },
            status: NotificationStatus::default(),
        }
    }
}

/// A request targeting the given channels with defaults everywhere else.
pub fn request_for_channels(name: &str, channels: &[&str]) -> NotificationRequest {
    RequestBuilder::new(name).channels(channels).build()
}
