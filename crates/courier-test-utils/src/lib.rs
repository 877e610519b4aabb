// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for Courier integration tests.
//!
//! Scriptable delivery channels, an in-memory resource store with
//! optimistic concurrency and conflict injection, recording/failing audit
//! sinks, and request fixture builders.

pub mod fixtures;
pub mod mock_audit;
pub mod mock_channel;
pub mod mock_store;

pub use fixtures::{RequestBuilder, request_for_channels};
pub use mock_audit::{FailingAuditBackend, FailingDlq, RecordingAuditBackend, RecordingDlq};
pub use mock_channel::{MockBehavior, MockDeliveryService};
pub use mock_store::InMemoryStore;
