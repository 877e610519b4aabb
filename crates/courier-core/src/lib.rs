// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier notification controller.
//!
//! This crate provides the shared types, the error taxonomy, and the trait
//! definitions at Courier's external seams (delivery channels and the
//! resource store). Every other workspace crate builds on top of it.

pub mod error;
pub mod metrics;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CourierError, DeliveryError, DeliveryErrorKind};
pub use types::{
    ChannelAttemptStatus, ChannelOutcome, NotificationRequest, NotificationSpec,
    NotificationStatus, OutboundNotification, Phase, Priority, ResourceId, ResourceMeta,
};

// Re-export the seam traits at crate root.
pub use traits::{DeliveryService, ResourceStore};
