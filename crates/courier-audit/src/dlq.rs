// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed dead-letter queue: an append-only JSONL log.
//!
//! This is the last-resort persistence path; an operator replays it into
//! the durable backend once that backend recovers.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::backend::AuditDlq;
use crate::error::AuditError;
use crate::event::AuditEvent;

/// Appends one JSON line per event to a local file.
pub struct FileDlq {
    path: PathBuf,
}

impl FileDlq {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AuditDlq for FileDlq {
    async fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(event).map_err(AuditError::dlq)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(AuditError::dlq)?;
        file.write_all(&line).await.map_err(AuditError::dlq)?;
        file.flush().await.map_err(AuditError::dlq)?;
        Ok(())
    }
}
