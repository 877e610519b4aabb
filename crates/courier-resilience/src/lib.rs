// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breaker and retry primitives for the Courier notification
//! controller.
//!
//! The [`RetryHandler`] wraps a single channel delivery call with a
//! per-attempt timeout, exponential backoff for retryable failures, and a
//! per-channel circuit breaker held in an injected [`BreakerRegistry`].

pub mod breaker;
pub mod retry;

pub use breaker::{BreakerConfig, BreakerRegistry, CircuitState};
pub use retry::{RetryHandler, RetryPolicy};
