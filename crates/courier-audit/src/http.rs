// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of the durable audit backend.
//!
//! Posts event batches as JSON to a single endpoint. Non-2xx responses are
//! backend failures; the buffered store owns retry and DLQ fallback.

use async_trait::async_trait;
use reqwest::Client;

use crate::backend::AuditBackend;
use crate::error::AuditError;
use crate::event::AuditEvent;

/// Audit backend speaking `POST <endpoint>` with a JSON array body.
pub struct HttpAuditBackend {
    client: Client,
    endpoint: String,
}

impl HttpAuditBackend {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AuditBackend for HttpAuditBackend {
    async fn write_batch(&self, events: &[AuditEvent]) -> Result<(), AuditError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(events)
            .send()
            .await
            .map_err(AuditError::backend)?;

        response
            .error_for_status()
            .map_err(AuditError::backend)?;
        Ok(())
    }
}
