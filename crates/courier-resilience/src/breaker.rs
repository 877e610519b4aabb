// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel circuit breaker registry.
//!
//! Breaker state is process-wide and shared across all reconciles, keyed by
//! channel identifier. The registry is an injected instance rather than a
//! package-level singleton so tests get isolation from a fresh registry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use courier_core::metrics;

/// Breaker state for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected without a network attempt.
    Open,
    /// One probe call is allowed; its result decides the next state.
    HalfOpen,
}

/// Breaker tuning shared by every channel in a registry.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Consecutive failures that trip the breaker.
    pub failure_threshold: u32,
    /// Cooldown before an open breaker lets a probe through.
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerEntry {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
}

impl BreakerEntry {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
        }
    }
}

/// Registry of per-channel breakers, created lazily on first use.
///
/// Entries are never removed; the channel set is fixed at configuration
/// time, which bounds the map.
#[derive(Debug)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    channels: Mutex<HashMap<String, BreakerEntry>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a call to `channel` may proceed.
    ///
    /// An open breaker whose reset timeout has elapsed transitions to
    /// [`CircuitState::HalfOpen`] and admits the call as a probe.
    pub fn try_acquire(&self, channel: &str) -> bool {
        let mut channels = self.channels.lock().expect("breaker registry poisoned");
        let entry = channels
            .entry(channel.to_string())
            .or_insert_with(BreakerEntry::new);

        match entry.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = entry
                    .last_failure_at
                    .is_some_and(|at| at.elapsed() >= self.config.reset_timeout);
                if cooled_down {
                    debug!(channel, "breaker half-open, admitting probe call");
                    entry.state = CircuitState::HalfOpen;
                    true
                } else {
                    metrics::record_breaker_rejection(channel);
                    false
                }
            }
        }
    }

    /// Record a successful delivery: resets the failure counter and closes
    /// a half-open breaker.
    pub fn record_success(&self, channel: &str) {
        let mut channels = self.channels.lock().expect("breaker registry poisoned");
        let entry = channels
            .entry(channel.to_string())
            .or_insert_with(BreakerEntry::new);

        if entry.state == CircuitState::HalfOpen {
            debug!(channel, "probe succeeded, closing breaker");
        }
        entry.state = CircuitState::Closed;
        entry.consecutive_failures = 0;
    }

    /// Record a failed delivery attempt. Crossing the threshold, or failing
    /// the half-open probe, opens the breaker.
    pub fn record_failure(&self, channel: &str) {
        let mut channels = self.channels.lock().expect("breaker registry poisoned");
        let entry = channels
            .entry(channel.to_string())
            .or_insert_with(BreakerEntry::new);

        entry.consecutive_failures += 1;
        entry.last_failure_at = Some(Instant::now());

        let should_open = entry.state == CircuitState::HalfOpen
            || entry.consecutive_failures >= self.config.failure_threshold;

        if should_open && entry.state != CircuitState::Open {
            warn!(
                channel,
                failures = entry.consecutive_failures,
                "breaker opened"
            );
            metrics::record_breaker_open(channel);
            entry.state = CircuitState::Open;
        }
    }

    /// Current state of a channel's breaker (Closed if never used).
    pub fn state(&self, channel: &str) -> CircuitState {
        self.channels
            .lock()
            .expect("breaker registry poisoned")
            .get(channel)
            .map(|e| e.state)
            .unwrap_or(CircuitState::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(threshold: u32, reset: Duration) -> BreakerRegistry {
        BreakerRegistry::new(BreakerConfig {
            failure_threshold: threshold,
            reset_timeout: reset,
        })
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let reg = registry(3, Duration::from_secs(30));
        for _ in 0..2 {
            reg.record_failure("chat");
        }
        assert_eq!(reg.state("chat"), CircuitState::Closed);

        reg.record_failure("chat");
        assert_eq!(reg.state("chat"), CircuitState::Open);
        assert!(!reg.try_acquire("chat"));
    }

    #[tokio::test]
    async fn success_resets_failure_counter() {
        let reg = registry(3, Duration::from_secs(30));
        reg.record_failure("chat");
        reg.record_failure("chat");
        reg.record_success("chat");

        // Two more failures stay under the threshold again.
        reg.record_failure("chat");
        reg.record_failure("chat");
        assert_eq!(reg.state("chat"), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_after_reset_timeout_then_closes_on_success() {
        let reg = registry(1, Duration::from_secs(10));
        reg.record_failure("chat");
        assert_eq!(reg.state("chat"), CircuitState::Open);
        assert!(!reg.try_acquire("chat"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(reg.try_acquire("chat"));
        assert_eq!(reg.state("chat"), CircuitState::HalfOpen);

        reg.record_success("chat");
        assert_eq!(reg.state("chat"), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_probe_failure_reopens() {
        let reg = registry(1, Duration::from_secs(10));
        reg.record_failure("chat");

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(reg.try_acquire("chat"));

        reg.record_failure("chat");
        assert_eq!(reg.state("chat"), CircuitState::Open);
        assert!(!reg.try_acquire("chat"));
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let reg = registry(1, Duration::from_secs(30));
        reg.record_failure("chat");
        assert_eq!(reg.state("chat"), CircuitState::Open);
        assert_eq!(reg.state("console"), CircuitState::Closed);
        assert!(reg.try_acquire("console"));
    }
}
