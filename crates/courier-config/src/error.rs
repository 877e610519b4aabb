// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration error type.

use thiserror::Error;

/// A configuration error, from parsing or semantic validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be parsed or merged.
    #[error("configuration parse error: {0}")]
    Parse(String),

    /// A configuration value failed semantic validation.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convert a `figment::Error` into one `ConfigError` per underlying error.
///
/// Figment reports unknown fields, missing fields, and type mismatches with
/// their key paths; surfacing each separately keeps the messages actionable.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| ConfigError::Parse(error.to_string()))
        .collect()
}

/// Render a list of `ConfigError`s to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("error: {error}");
    }
}
