// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier controller.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Controller loop and logging settings.
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Delivery retry and backoff settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Per-channel circuit breaker settings.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Audit subsystem settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Console delivery channel settings.
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Webhook delivery channel settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// File delivery channel settings.
    #[serde(default)]
    pub file: FileConfig,

    /// Spool-directory request intake settings.
    #[serde(default)]
    pub intake: IntakeConfig,
}

/// Controller loop and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Capacity of the reconcile work queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Concurrent reconcile workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Backoff before requeueing a reconcile that failed transiently,
    /// in seconds.
    #[serde(default = "default_error_requeue_secs")]
    pub error_requeue_secs: u64,

    /// Full reconcile re-runs allowed after a status write conflict.
    #[serde(default = "default_max_conflict_reruns")]
    pub max_conflict_reruns: u32,

    /// Bound on the graceful drain at shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
            error_requeue_secs: default_error_requeue_secs(),
            max_conflict_reruns: default_max_conflict_reruns(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_workers() -> usize {
    4
}

fn default_error_requeue_secs() -> u64 {
    10
}

fn default_max_conflict_reruns() -> u32 {
    3
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

/// Delivery retry and backoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum delivery attempts per channel, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff multiplier applied after each failed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound on the computed backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Timeout applied to each individual delivery attempt, in seconds.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_attempt_timeout_secs() -> u64 {
    10
}

/// Per-channel circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures that open a channel's breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds an open breaker waits before allowing a half-open probe.
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_secs: default_reset_timeout_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout_secs() -> u64 {
    30
}

/// Audit subsystem configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Endpoint of the durable audit backend. `None` keeps audit events
    /// in the DLQ file only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Capacity of the in-memory event buffer.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Batch size that triggers an immediate flush.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Seconds after which a partial batch is flushed anyway.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// Bounded retries for a failing durable write before DLQ fallback.
    #[serde(default = "default_write_retries")]
    pub write_retries: u32,

    /// Base delay between durable-write retries, in milliseconds.
    #[serde(default = "default_write_retry_delay_ms")]
    pub write_retry_delay_ms: u64,

    /// Bound on the audit drain at shutdown, in seconds.
    #[serde(default = "default_audit_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Path of the dead-letter queue file (JSON lines).
    #[serde(default = "default_dlq_path")]
    pub dlq_path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            buffer_size: default_buffer_size(),
            batch_size: default_batch_size(),
            flush_interval_secs: default_flush_interval_secs(),
            write_retries: default_write_retries(),
            write_retry_delay_ms: default_write_retry_delay_ms(),
            shutdown_timeout_secs: default_audit_shutdown_timeout_secs(),
            dlq_path: default_dlq_path(),
        }
    }
}

fn default_buffer_size() -> usize {
    1024
}

fn default_batch_size() -> usize {
    32
}

fn default_flush_interval_secs() -> u64 {
    5
}

fn default_write_retries() -> u32 {
    3
}

fn default_write_retry_delay_ms() -> u64 {
    500
}

fn default_audit_shutdown_timeout_secs() -> u64 {
    10
}

fn default_dlq_path() -> String {
    "courier-audit-dlq.jsonl".to_string()
}

/// Console delivery channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Whether the console channel is registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

/// Webhook delivery channel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Whether the webhook channel is registered.
    #[serde(default)]
    pub enabled: bool,

    /// Webhook endpoint URL. Required when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// File delivery channel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Whether the file channel is registered.
    #[serde(default)]
    pub enabled: bool,

    /// Path of the output file (JSON lines). Required when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Spool-directory request intake configuration.
///
/// The intake is the runnable stand-in for an external watch mechanism:
/// JSON request files dropped into the spool directory are loaded and
/// queued for reconciliation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Directory scanned for `*.json` notification request files.
    /// `None` disables the intake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spool_path: Option<String>,

    /// Seconds between spool directory scans.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            spool_path: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}
