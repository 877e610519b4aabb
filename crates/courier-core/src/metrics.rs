// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_histogram};

/// Register all Courier metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "courier_deliveries_total",
        "Channel delivery outcomes by channel and result"
    );
    describe_counter!(
        "courier_delivery_retries_total",
        "Delivery attempts beyond the first, by channel"
    );
    describe_counter!(
        "courier_breaker_opens_total",
        "Circuit breaker transitions to Open, by channel"
    );
    describe_counter!(
        "courier_breaker_rejections_total",
        "Calls rejected by an open breaker, by channel"
    );
    describe_counter!(
        "courier_audit_events_dropped_total",
        "Audit events dropped because the buffer was full"
    );
    describe_counter!(
        "courier_audit_flush_failures_total",
        "Audit batches that exhausted durable-write retries"
    );
    describe_counter!(
        "courier_audit_dlq_writes_total",
        "Audit events handed to the dead-letter queue"
    );
    describe_counter!(
        "courier_audit_dlq_failures_total",
        "Audit events lost after the DLQ write also failed"
    );
    describe_counter!(
        "courier_reconciles_total",
        "Reconcile invocations by terminal result"
    );
    describe_histogram!(
        "courier_delivery_latency_seconds",
        "Per-channel delivery latency in seconds"
    );
}

/// Record a finished channel delivery.
pub fn record_delivery(channel: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!(
        "courier_deliveries_total",
        "channel" => channel.to_string(),
        "result" => result,
    )
    .increment(1);
}

/// Record a retry attempt on a channel.
pub fn record_retry(channel: &str) {
    metrics::counter!("courier_delivery_retries_total", "channel" => channel.to_string())
        .increment(1);
}

/// Record a breaker opening for a channel.
pub fn record_breaker_open(channel: &str) {
    metrics::counter!("courier_breaker_opens_total", "channel" => channel.to_string()).increment(1);
}

/// Record a call rejected by an open breaker.
pub fn record_breaker_rejection(channel: &str) {
    metrics::counter!("courier_breaker_rejections_total", "channel" => channel.to_string())
        .increment(1);
}

/// Record an audit event dropped at the buffer.
pub fn record_audit_drop() {
    metrics::counter!("courier_audit_events_dropped_total").increment(1);
}

/// Record an audit batch that exhausted its durable-write retries.
pub fn record_audit_flush_failure() {
    metrics::counter!("courier_audit_flush_failures_total").increment(1);
}

/// Record an audit event handed to the DLQ.
pub fn record_audit_dlq_write() {
    metrics::counter!("courier_audit_dlq_writes_total").increment(1);
}

/// Record an audit event lost after DLQ failure.
pub fn record_audit_dlq_failure() {
    metrics::counter!("courier_audit_dlq_failures_total").increment(1);
}

/// Record a reconcile completion with its resulting phase label.
pub fn record_reconcile(result: &str) {
    metrics::counter!("courier_reconciles_total", "result" => result.to_string()).increment(1);
}

/// Record per-channel delivery latency.
pub fn record_delivery_latency(channel: &str, seconds: f64) {
    metrics::histogram!(
        "courier_delivery_latency_seconds",
        "channel" => channel.to_string(),
    )
    .record(seconds);
}
