// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use courier_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_courier_config() {
    let toml = r#"
[controller]
log_level = "debug"
queue_capacity = 256
workers = 2
error_requeue_secs = 5
max_conflict_reruns = 2
shutdown_timeout_secs = 15

[retry]
max_attempts = 5
initial_delay_ms = 100
multiplier = 1.5
max_delay_ms = 2000
attempt_timeout_secs = 4

[breaker]
failure_threshold = 3
reset_timeout_secs = 20

[audit]
endpoint = "https://audit.internal/v1/events"
buffer_size = 512
batch_size = 16
flush_interval_secs = 2
write_retries = 2
write_retry_delay_ms = 100
shutdown_timeout_secs = 5
dlq_path = "/var/lib/courier/dlq.jsonl"

[console]
enabled = true

[webhook]
enabled = true
url = "https://hooks.example.com/courier"

[file]
enabled = true
path = "/var/log/courier/out.jsonl"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.controller.log_level, "debug");
    assert_eq!(config.controller.queue_capacity, 256);
    assert_eq!(config.controller.workers, 2);
    assert_eq!(config.controller.max_conflict_reruns, 2);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.multiplier, 1.5);
    assert_eq!(config.breaker.failure_threshold, 3);
    assert_eq!(
        config.audit.endpoint.as_deref(),
        Some("https://audit.internal/v1/events")
    );
    assert_eq!(config.audit.batch_size, 16);
    assert_eq!(config.audit.dlq_path, "/var/lib/courier/dlq.jsonl");
    assert!(config.webhook.enabled);
    assert_eq!(
        config.webhook.url.as_deref(),
        Some("https://hooks.example.com/courier")
    );
    assert_eq!(config.file.path.as_deref(), Some("/var/log/courier/out.jsonl"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.controller.log_level, "info");
    assert_eq!(config.controller.workers, 4);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.initial_delay_ms, 200);
    assert_eq!(config.retry.max_delay_ms, 5_000);
    assert_eq!(config.breaker.failure_threshold, 5);
    assert_eq!(config.breaker.reset_timeout_secs, 30);
    assert!(config.audit.endpoint.is_none());
    assert_eq!(config.audit.buffer_size, 1024);
    assert!(config.console.enabled);
    assert!(!config.webhook.enabled);
    assert!(!config.file.enabled);
}

/// Unknown keys are rejected with a message naming the bad key.
#[test]
fn unknown_field_produces_error() {
    let toml = r#"
[retry]
max_atempts = 5
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("max_atempts"),
        "error should mention the unknown field, got: {err_str}"
    );
}

/// An override merged after the TOML layer wins, matching what the
/// `COURIER_RETRY_MAX_ATTEMPTS` env mapping produces (`retry.max_attempts`,
/// not `retry.max.attempts`).
#[test]
fn later_layer_overrides_toml_value() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: courier_config::CourierConfig = Figment::new()
        .merge(Serialized::defaults(courier_config::CourierConfig::default()))
        .merge(Toml::string("[retry]\nmax_attempts = 2\n"))
        .merge(("retry.max_attempts", 9))
        .extract()
        .expect("should merge override");

    assert_eq!(config.retry.max_attempts, 9);
}

/// The high-level entry point surfaces validation errors, all of them.
#[test]
fn load_and_validate_collects_all_errors() {
    let toml = r#"
[controller]
log_level = "verbose"

[retry]
max_attempts = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert!(errors.len() >= 2);
}

/// A fully valid config passes the high-level entry point.
#[test]
fn load_and_validate_accepts_valid_config() {
    let toml = r#"
[webhook]
enabled = true
url = "https://hooks.example.com/courier"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert!(config.webhook.enabled);
}
