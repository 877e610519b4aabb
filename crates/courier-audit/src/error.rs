// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types internal to the audit subsystem.
//!
//! None of these ever reach the delivery path: the buffered store absorbs
//! them, counts them, and logs them.

use thiserror::Error;

/// Errors raised inside the audit subsystem.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Pure-construction contract violation (empty channel, empty request name).
    #[error("audit contract violation: {0}")]
    Contract(String),

    /// The durable backend rejected or failed a batch write.
    #[error("audit backend write failed: {source}")]
    Backend {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The dead-letter queue append failed.
    #[error("audit DLQ append failed: {source}")]
    Dlq {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The store's shutdown drain did not finish within its timeout.
    #[error("audit store shutdown timed out after {0:?}")]
    ShutdownTimeout(std::time::Duration),
}

impl AuditError {
    pub fn backend(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            source: Box::new(source),
        }
    }

    pub fn dlq(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Dlq {
            source: Box::new(source),
        }
    }
}
