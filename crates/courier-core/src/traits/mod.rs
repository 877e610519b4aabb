// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at Courier's external seams.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod channel;
pub mod store;

// Re-export all traits at the traits module level for convenience.
pub use channel::DeliveryService;
pub use store::ResourceStore;
