// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete delivery channel implementations.
//!
//! Each channel implements [`courier_core::DeliveryService`] and is selected
//! at orchestration time by channel identifier. Adding a channel means
//! adding an implementation here and registering it; the orchestrator never
//! learns concrete types.

pub mod console;
pub mod file;
pub mod webhook;

pub use console::ConsoleChannel;
pub use file::FileChannel;
pub use webhook::WebhookChannel;
