// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Asynchronous audit subsystem for the Courier notification controller.
//!
//! Split into pure event construction ([`event`]) and buffered persistence
//! ([`store`]). The store is fire-and-forget with at-least-once delivery to
//! the durable backend and a DLQ fallback; its failures are absorbed,
//! counted, and logged, never surfaced to the delivery path.

pub mod backend;
pub mod dlq;
pub mod error;
pub mod event;
pub mod http;
pub mod store;

pub use backend::{AuditBackend, AuditDlq};
pub use dlq::FileDlq;
pub use error::AuditError;
pub use event::{AuditEvent, AuditOutcome, acknowledgment_event, delivery_event, escalation_event};
pub use http::HttpAuditBackend;
pub use store::{AuditStoreConfig, BufferedAuditStore};
