// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive attempt counts, ordered delay bounds, and
//! channel settings that are required only when the channel is enabled.

use crate::error::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.controller.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "controller.log_level `{}` is not one of {}",
            config.controller.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.controller.workers == 0 {
        errors.push(ConfigError::validation(
            "controller.workers must be at least 1",
        ));
    }

    if config.controller.queue_capacity == 0 {
        errors.push(ConfigError::validation(
            "controller.queue_capacity must be at least 1",
        ));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::validation("retry.max_attempts must be at least 1"));
    }

    if config.retry.multiplier < 1.0 {
        errors.push(ConfigError::validation(format!(
            "retry.multiplier must be at least 1.0, got {}",
            config.retry.multiplier
        )));
    }

    if config.retry.max_delay_ms < config.retry.initial_delay_ms {
        errors.push(ConfigError::validation(format!(
            "retry.max_delay_ms ({}) must not be below retry.initial_delay_ms ({})",
            config.retry.max_delay_ms, config.retry.initial_delay_ms
        )));
    }

    if config.retry.attempt_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "retry.attempt_timeout_secs must be at least 1",
        ));
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ConfigError::validation(
            "breaker.failure_threshold must be at least 1",
        ));
    }

    if config.audit.buffer_size == 0 {
        errors.push(ConfigError::validation("audit.buffer_size must be at least 1"));
    }

    if config.audit.batch_size == 0 {
        errors.push(ConfigError::validation("audit.batch_size must be at least 1"));
    }

    if config.audit.batch_size > config.audit.buffer_size {
        errors.push(ConfigError::validation(format!(
            "audit.batch_size ({}) must not exceed audit.buffer_size ({})",
            config.audit.batch_size, config.audit.buffer_size
        )));
    }

    if config.audit.dlq_path.trim().is_empty() {
        errors.push(ConfigError::validation("audit.dlq_path must not be empty"));
    }

    if let Some(endpoint) = &config.audit.endpoint
        && !endpoint.starts_with("http://")
        && !endpoint.starts_with("https://")
    {
        errors.push(ConfigError::validation(format!(
            "audit.endpoint `{endpoint}` must be an http(s) URL"
        )));
    }

    if config.webhook.enabled {
        match &config.webhook.url {
            None => errors.push(ConfigError::validation(
                "webhook.url is required when webhook.enabled = true",
            )),
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                errors.push(ConfigError::validation(format!(
                    "webhook.url `{url}` must be an http(s) URL"
                )));
            }
            Some(_) => {}
        }
    }

    if config.file.enabled && config.file.path.as_deref().is_none_or(|p| p.trim().is_empty()) {
        errors.push(ConfigError::validation(
            "file.path is required when file.enabled = true",
        ));
    }

    if config.intake.poll_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "intake.poll_interval_secs must be at least 1",
        ));
    }

    if config
        .intake
        .spool_path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        errors.push(ConfigError::validation("intake.spool_path must not be empty"));
    }

    if !config.console.enabled && !config.webhook.enabled && !config.file.enabled {
        errors.push(ConfigError::validation(
            "at least one delivery channel must be enabled",
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CourierConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_attempts_fails_validation() {
        let mut config = CourierConfig::default();
        config.retry.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_attempts"))
        ));
    }

    #[test]
    fn inverted_delay_bounds_fail_validation() {
        let mut config = CourierConfig::default();
        config.retry.initial_delay_ms = 10_000;
        config.retry.max_delay_ms = 100;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_delay_ms"))
        ));
    }

    #[test]
    fn enabled_webhook_requires_url() {
        let mut config = CourierConfig::default();
        config.webhook.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("webhook.url"))
        ));

        config.webhook.url = Some("ftp://nope".to_string());
        assert!(validate_config(&config).is_err());

        config.webhook.url = Some("https://hooks.example.com/x".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn all_channels_disabled_fails_validation() {
        let mut config = CourierConfig::default();
        config.console.enabled = false;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("at least one"))
        ));
    }

    #[test]
    fn batch_larger_than_buffer_fails_validation() {
        let mut config = CourierConfig::default();
        config.audit.buffer_size = 8;
        config.audit.batch_size = 64;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("batch_size"))
        ));
    }

    #[test]
    fn bogus_log_level_fails_validation() {
        let mut config = CourierConfig::default();
        config.controller.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))
        ));
    }
}
