// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent multi-channel delivery for Courier.

pub mod orchestrator;

pub use orchestrator::DeliveryOrchestrator;
