// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File delivery channel: appends notifications to a local JSONL file.
//!
//! Intended for tests and air-gapped setups where a tailing process picks
//! the messages up.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use courier_core::error::{DeliveryError, DeliveryErrorKind};
use courier_core::traits::DeliveryService;
use courier_core::types::OutboundNotification;

/// Appends one JSON line per delivered notification.
pub struct FileChannel {
    name: String,
    path: PathBuf,
}

impl FileChannel {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl DeliveryService for FileChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, msg: &OutboundNotification) -> Result<(), DeliveryError> {
        let mut line = serde_json::to_vec(&serde_json::json!({
            "subject": msg.subject,
            "body": msg.body,
            "priority": msg.priority.to_string(),
            "notificationType": msg.notification_type,
            "recipients": msg.recipients,
        }))
        .map_err(|e| {
            DeliveryError::new(DeliveryErrorKind::MalformedPayload, e.to_string()).with_source(e)
        })?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_error)?;
        file.write_all(&line).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        Ok(())
    }
}

fn io_error(err: std::io::Error) -> DeliveryError {
    // Local filesystem trouble is transient from the retry handler's view.
    DeliveryError::new(DeliveryErrorKind::ConnectionRefused, err.to_string()).with_source(err)
}
