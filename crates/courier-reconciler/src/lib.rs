// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation state machine for Courier notification requests.

pub mod reconciler;

pub use reconciler::{Reconciler, ReconcilerConfig};
