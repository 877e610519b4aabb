// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry handler wrapping one channel delivery call.
//!
//! The handler owns the retry/abandon decision: retryable failures back off
//! exponentially up to the attempt budget, permanent failures abandon
//! immediately, and an open breaker rejects the call before any network
//! attempt is made.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use courier_core::error::{DeliveryError, DeliveryErrorKind};
use courier_core::metrics;
use courier_core::traits::DeliveryService;
use courier_core::types::{ChannelOutcome, OutboundNotification};

use crate::breaker::BreakerRegistry;

/// Backoff and attempt budget for channel deliveries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum delivery attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt.
    pub multiplier: f64,
    /// Upper bound on the computed delay.
    pub max_delay: Duration,
    /// Timeout applied to each individual attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// The backoff delay after the given 1-based failed attempt.
    ///
    /// Non-decreasing in `attempt` and capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Wraps delivery calls with retry, per-attempt timeout, and breaker checks.
pub struct RetryHandler {
    policy: RetryPolicy,
    breakers: Arc<BreakerRegistry>,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy, breakers: Arc<BreakerRegistry>) -> Self {
        Self { policy, breakers }
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    /// Deliver `msg` through `service`, retrying per policy.
    ///
    /// Always produces a [`ChannelOutcome`]; a channel failure is a valid
    /// result here, never an error that propagates to the orchestrator.
    pub async fn call(
        &self,
        service: &dyn DeliveryService,
        msg: &OutboundNotification,
    ) -> ChannelOutcome {
        let channel = service.name().to_string();
        let started = Instant::now();

        if !self.breakers.try_acquire(&channel) {
            debug!(channel, "breaker open, rejecting without attempt");
            return ChannelOutcome::failure(
                &channel,
                DeliveryErrorKind::CircuitOpen,
                "circuit breaker open, delivery not attempted",
                0,
                started.elapsed(),
            );
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = self.attempt(service, msg).await;

            match result {
                Ok(()) => {
                    self.breakers.record_success(&channel);
                    let elapsed = started.elapsed();
                    metrics::record_delivery(&channel, true);
                    metrics::record_delivery_latency(&channel, elapsed.as_secs_f64());
                    return ChannelOutcome::success(&channel, attempt, elapsed);
                }
                Err(err) => {
                    self.breakers.record_failure(&channel);

                    let exhausted = attempt >= self.policy.max_attempts;
                    if !err.is_retryable() || exhausted {
                        if err.is_retryable() {
                            warn!(channel, attempts = attempt, error = %err, "retry budget exhausted");
                        } else {
                            warn!(channel, error = %err, "permanent delivery failure, not retrying");
                        }
                        let elapsed = started.elapsed();
                        metrics::record_delivery(&channel, false);
                        metrics::record_delivery_latency(&channel, elapsed.as_secs_f64());
                        return ChannelOutcome::failure(
                            &channel,
                            err.kind,
                            err.to_string(),
                            attempt,
                            elapsed,
                        );
                    }

                    let delay = self.policy.delay_for(attempt);
                    debug!(channel, attempt, ?delay, error = %err, "delivery failed, backing off");
                    metrics::record_retry(&channel);
                    tokio::time::sleep(delay).await;

                    // The breaker may have been opened by this channel's own
                    // failures mid-loop; honor it before the next attempt.
                    if !self.breakers.try_acquire(&channel) {
                        let elapsed = started.elapsed();
                        metrics::record_delivery(&channel, false);
                        return ChannelOutcome::failure(
                            &channel,
                            DeliveryErrorKind::CircuitOpen,
                            "circuit breaker opened during retries",
                            attempt,
                            elapsed,
                        );
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        service: &dyn DeliveryService,
        msg: &OutboundNotification,
    ) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.policy.attempt_timeout, service.deliver(msg)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::new(
                DeliveryErrorKind::Timeout,
                format!("attempt exceeded {:?}", self.policy.attempt_timeout),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::{BreakerConfig, CircuitState};

    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    fn msg() -> OutboundNotification {
        OutboundNotification {
            subject: "s".into(),
            body: "b".into(),
            priority: Default::default(),
            notification_type: "alert".into(),
            recipients: vec![],
        }
    }

    fn handler(policy: RetryPolicy) -> RetryHandler {
        RetryHandler::new(policy, Arc::new(BreakerRegistry::new(BreakerConfig::default())))
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            multiplier: 2.0,
            max_delay: Duration::from_millis(4),
            attempt_timeout: Duration::from_secs(1),
        }
    }

    /// Fails with the scripted error kind `n` times, then succeeds.
    struct FailNTimes {
        name: String,
        remaining: AtomicU32,
        kind: DeliveryErrorKind,
        calls: AtomicU32,
    }

    impl FailNTimes {
        fn new(name: &str, n: u32, kind: DeliveryErrorKind) -> Self {
            Self {
                name: name.to_string(),
                remaining: AtomicU32::new(n),
                kind,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeliveryService for FailNTimes {
        fn name(&self) -> &str {
            &self.name
        }

        async fn deliver(&self, _msg: &OutboundNotification) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prev = self.remaining.load(Ordering::SeqCst);
            if prev == 0 {
                return Ok(());
            }
            self.remaining.store(prev - 1, Ordering::SeqCst);
            Err(DeliveryError::new(self.kind, "scripted failure"))
        }
    }

    #[test]
    fn backoff_is_monotone_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(1),
        };

        let mut prev = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= prev, "delay must be non-decreasing");
            assert!(delay <= policy.max_delay, "delay must be capped");
            prev = delay;
        }
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(10), Duration::from_secs(2));
    }

    proptest::proptest! {
        #[test]
        fn backoff_monotone_for_any_policy(
            initial_ms in 1u64..5_000,
            multiplier in 1.0f64..8.0,
            max_ms in 1u64..60_000,
        ) {
            let policy = RetryPolicy {
                max_attempts: 10,
                initial_delay: Duration::from_millis(initial_ms),
                multiplier,
                max_delay: Duration::from_millis(max_ms),
                attempt_timeout: Duration::from_secs(1),
            };
            let mut prev = Duration::ZERO;
            for attempt in 1..=16 {
                let delay = policy.delay_for(attempt);
                proptest::prop_assert!(delay >= prev);
                proptest::prop_assert!(delay <= policy.max_delay.max(policy.initial_delay));
                prev = delay;
            }
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let service = FailNTimes::new("chat", 2, DeliveryErrorKind::ServerError);
        let handler = handler(fast_policy(5));

        let outcome = handler.call(&service, &msg()).await;
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn exhausts_retry_budget_on_persistent_transient_failure() {
        let service = FailNTimes::new("chat", 100, DeliveryErrorKind::Timeout);
        let handler = handler(fast_policy(3));

        let outcome = handler.call(&service, &msg()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Timeout));
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_never_retried() {
        let service = FailNTimes::new("chat", 100, DeliveryErrorKind::ClientError);
        let handler = handler(fast_policy(5));

        let outcome = handler.call(&service, &msg()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn tls_failure_is_never_retried() {
        let service = FailNTimes::new("chat", 100, DeliveryErrorKind::TlsCertificate);
        let handler = handler(fast_policy(5));

        let outcome = handler.call(&service, &msg()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::TlsCertificate));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn open_breaker_rejects_without_network_attempt() {
        let breakers = Arc::new(BreakerRegistry::new(BreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(60),
        }));
        breakers.record_failure("chat");
        assert_eq!(breakers.state("chat"), CircuitState::Open);

        let handler = RetryHandler::new(fast_policy(3), breakers);
        let service = FailNTimes::new("chat", 0, DeliveryErrorKind::ServerError);

        let outcome = handler.call(&service, &msg()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::CircuitOpen));
        assert_eq!(service.calls(), 0, "no network attempt may be made");
    }

    #[tokio::test]
    async fn failures_trip_breaker_across_calls() {
        let breakers = Arc::new(BreakerRegistry::new(BreakerConfig {
            failure_threshold: 2,
            reset_timeout: Duration::from_secs(60),
        }));
        let handler = RetryHandler::new(fast_policy(1), Arc::clone(&breakers));
        let service = FailNTimes::new("chat", 100, DeliveryErrorKind::ServerError);

        let _ = handler.call(&service, &msg()).await;
        let _ = handler.call(&service, &msg()).await;
        assert_eq!(breakers.state("chat"), CircuitState::Open);

        let outcome = handler.call(&service, &msg()).await;
        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::CircuitOpen));
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn per_attempt_timeout_is_classified_as_timeout() {
        struct Hangs;

        #[async_trait]
        impl DeliveryService for Hangs {
            fn name(&self) -> &str {
                "slow"
            }

            async fn deliver(&self, _msg: &OutboundNotification) -> Result<(), DeliveryError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let policy = RetryPolicy {
            max_attempts: 1,
            attempt_timeout: Duration::from_millis(20),
            ..fast_policy(1)
        };
        let handler = handler(policy);

        let outcome = handler.call(&Hangs, &msg()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(DeliveryErrorKind::Timeout));
    }
}
